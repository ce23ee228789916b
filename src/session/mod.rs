//! Networking collaborator boundary.
//!
//! The bridge core never talks to a socket directly. It drives a
//! [`SessionTransport`] (session-level configuration plus connection
//! establishment) which hands back a [`MessageStream`] (one live
//! connection). The default implementation in [`tungstenite`] speaks
//! WebSocket over a fingerprint-shaped TLS connector; tests substitute a
//! mock transport.
//!
//! # Lifecycle
//!
//! ```text
//! ┌────────────────────┐  open_connection   ┌───────────────────┐
//! │  SessionTransport  │───────────────────►│   MessageStream   │
//! │  (one per bridge)  │                    │  (at most one     │
//! │  apply_fingerprint │                    │   live at a time) │
//! │  close             │                    │  write/read/close │
//! └────────────────────┘                    └───────────────────┘
//! ```
//!
//! Fingerprint configuration is session-level state: it shapes the *next*
//! connection's handshake and is legal whether or not a connection exists.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `fingerprint` | JA3 parsing and browser profiles |
//! | `tungstenite` | Default tokio-tungstenite implementation |

// ============================================================================
// Submodules
// ============================================================================

/// JA3 parsing and browser profiles.
pub mod fingerprint;

/// Default tokio-tungstenite implementation.
pub mod tungstenite;

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

use self::fingerprint::{BrowserProfile, Ja3Fingerprint};

// ============================================================================
// Re-exports
// ============================================================================

pub use self::tungstenite::WsSession;

// ============================================================================
// OrderedHeaders
// ============================================================================

/// Order-preserving header list, duplicates allowed.
///
/// Built by filtering raw host-supplied entries down to well-formed
/// two-element pairs. Malformed entries are silently dropped, a deliberate
/// leniency policy rather than a validation gate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderedHeaders(Vec<(String, String)>);

impl OrderedHeaders {
    /// Filters raw entries to well-formed `[key, value]` pairs.
    ///
    /// An entry with fewer or more than two elements is dropped; relative
    /// order of the surviving pairs is preserved exactly as supplied.
    #[must_use]
    pub fn from_raw(raw: &[Vec<String>]) -> Self {
        let pairs = raw
            .iter()
            .filter(|entry| entry.len() == 2)
            .map(|entry| (entry[0].clone(), entry[1].clone()))
            .collect();

        Self(pairs)
    }

    /// Iterates header pairs in their original order.
    pub fn iter(&self) -> impl Iterator<Item = &(String, String)> {
        self.0.iter()
    }

    /// Number of well-formed pairs.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no well-formed pairs survived.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ============================================================================
// SessionTransport
// ============================================================================

/// Session-level half of the networking collaborator.
///
/// One transport exists per bridge instance, created at startup and
/// released by `close`. All methods take `&mut self`; serialization of
/// concurrent callers is the [`ConnectionManager`]'s job, not the
/// transport's.
///
/// [`ConnectionManager`]: crate::bridge::ConnectionManager
#[async_trait]
pub trait SessionTransport: Send {
    /// Configures handshake shaping for subsequent connections.
    ///
    /// # Errors
    ///
    /// [`Error::Fingerprint`](crate::Error::Fingerprint) if the transport
    /// rejects the fingerprint/profile combination.
    async fn apply_fingerprint(
        &mut self,
        fingerprint: &Ja3Fingerprint,
        profile: BrowserProfile,
    ) -> Result<()>;

    /// Establishes a connection with the session's current configuration.
    ///
    /// `read_buffer_size` / `write_buffer_size` are fixed per-connection
    /// buffer limits in bytes.
    ///
    /// # Errors
    ///
    /// [`Error::Connection`](crate::Error::Connection) on any transport or
    /// handshake failure.
    async fn open_connection(
        &mut self,
        url: &str,
        read_buffer_size: usize,
        write_buffer_size: usize,
        headers: &OrderedHeaders,
    ) -> Result<Box<dyn MessageStream>>;

    /// Releases session-level resources.
    ///
    /// Called once during bridge teardown, after any live connection has
    /// been closed.
    async fn close(&mut self) -> Result<()>;
}

// ============================================================================
// MessageStream
// ============================================================================

/// Connection-level half of the networking collaborator.
///
/// Represents one live connection. The bridge owns at most one at a time.
#[async_trait]
pub trait MessageStream: Send {
    /// Writes one serialized message.
    ///
    /// Blocks until the write completes or fails.
    ///
    /// # Errors
    ///
    /// [`Error::Send`](crate::Error::Send) on transport failure.
    async fn write_message(&mut self, payload: &str) -> Result<()>;

    /// Blocks until the next inbound message arrives.
    ///
    /// The bridge protocol has no timeout field, so it always passes `None`;
    /// the deadline exists so library embedders can bound a blocked read.
    ///
    /// # Errors
    ///
    /// [`Error::Receive`](crate::Error::Receive) on transport failure, on a
    /// peer close, or when the deadline elapses. A successful empty message
    /// is not an error.
    async fn read_message(&mut self, deadline: Option<Duration>) -> Result<Bytes>;

    /// Tears down the connection.
    ///
    /// # Errors
    ///
    /// [`Error::Teardown`](crate::Error::Teardown) if the close handshake
    /// fails. The caller discards the stream either way.
    async fn close(&mut self) -> Result<()>;
}

impl std::fmt::Debug for dyn MessageStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn MessageStream")
    }
}

// ============================================================================
// Tests
// ============================================================================
