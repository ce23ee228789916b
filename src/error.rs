//! Error types for the bridge.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use ja3_ws_bridge::{Result, Error};
//!
//! async fn example(manager: &ConnectionManager<WsSession>) -> Result<()> {
//!     manager.send(&serde_json::json!({"hello": "world"})).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Protocol | [`Error::Parse`], [`Error::UnknownAction`] |
//! | Session | [`Error::Fingerprint`] |
//! | Connection | [`Error::Connection`], [`Error::NotConnected`], [`Error::Teardown`] |
//! | Transfer | [`Error::Send`], [`Error::Receive`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::WebSocket`] |
//!
//! Every variant except the fatal IO case is recovered at the dispatch loop
//! and reported to the host as a `success: false` response line.

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for the host-facing error string.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Malformed command line.
    ///
    /// Returned when an input line is not structurally valid JSON or does
    /// not deserialize into a command.
    #[error("invalid command: {message}")]
    Parse {
        /// Description of the parse failure.
        message: String,
    },

    /// Unrecognized action tag.
    ///
    /// Returned when a structurally valid command carries an action this
    /// bridge does not implement.
    #[error("unknown action")]
    UnknownAction,

    // ========================================================================
    // Session Errors
    // ========================================================================
    /// Fingerprint application failed.
    ///
    /// Returned when the JA3 string is malformed or the session rejects the
    /// fingerprint/profile combination.
    #[error("failed to apply JA3: {message}")]
    Fingerprint {
        /// Description of the fingerprint failure.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// Connection establishment failed.
    ///
    /// Returned on any transport or handshake failure during `connect`.
    #[error("failed to connect: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Operation requires a live connection.
    ///
    /// Returned when `send` or `receive` is issued before a successful
    /// `connect` (or after `close`).
    #[error("websocket not connected")]
    NotConnected,

    /// Connection teardown failed.
    ///
    /// Returned when closing the handle or releasing the session reports an
    /// error. The in-memory handle is cleared regardless.
    #[error("failed to close: {message}")]
    Teardown {
        /// Description of the teardown failure.
        message: String,
    },

    // ========================================================================
    // Transfer Errors
    // ========================================================================
    /// Outbound message write failed.
    #[error("failed to send message: {message}")]
    Send {
        /// Description of the send failure.
        message: String,
    },

    /// Inbound message read failed.
    ///
    /// Distinct from a successful empty message: the host sees a
    /// `success: false` response, never an empty `data` field.
    #[error("failed to read message: {message}")]
    Receive {
        /// Description of the receive failure.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a parse error.
    #[inline]
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Creates a fingerprint error.
    #[inline]
    pub fn fingerprint(message: impl Into<String>) -> Self {
        Self::Fingerprint {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a teardown error.
    #[inline]
    pub fn teardown(message: impl Into<String>) -> Self {
        Self::Teardown {
            message: message.into(),
        }
    }

    /// Creates a send error.
    #[inline]
    pub fn send(message: impl Into<String>) -> Self {
        Self::Send {
            message: message.into(),
        }
    }

    /// Creates a receive error.
    #[inline]
    pub fn receive(message: impl Into<String>) -> Self {
        Self::Receive {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this error came from the command protocol layer.
    #[inline]
    #[must_use]
    pub fn is_protocol_error(&self) -> bool {
        matches!(self, Self::Parse { .. } | Self::UnknownAction)
    }

    /// Returns `true` if this is a connection-level error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::NotConnected | Self::WebSocket(_)
        )
    }

    /// Returns `true` if the dispatch loop can recover from this error.
    ///
    /// Everything except stream-level IO is reported to the host as a
    /// failure response and the loop keeps reading.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Io(_))
    }
}

// ============================================================================
// Tests
// ============================================================================
