//! JA3 WebSocket Bridge - a stdio-driven WebSocket client with
//! fingerprint shaping.
//!
//! This crate exposes one persistent WebSocket connection to a host
//! process through a textual, line-oriented request/response protocol over
//! standard input/output. The host issues imperative commands (`connect`,
//! `apply_ja3`, `send`, `receive`, `close`); the bridge executes them
//! against one underlying connection and reports structured outcomes.
//!
//! # Architecture
//!
//! ```text
//! host ──NDJSON──► CommandReader ──► dispatch ──► ConnectionManager
//!                                                       │
//! host ◄──NDJSON── ResponseWriter ◄─────────────────────┤
//!                                                       ▼
//!                                        SessionTransport (WsSession)
//! ```
//!
//! Key design principles:
//!
//! - One connection handle per process, owned exclusively by the
//!   [`ConnectionManager`] and guarded by a single coarse lock
//! - Every failure origin maps to one uniform `success:false` response;
//!   malformed input never kills the loop
//! - Fingerprint configuration is session-level state that shapes the
//!   *next* connection's handshake
//! - The networking collaborator sits behind traits, so tests drive the
//!   core with a mock transport
//!
//! # Quick Start
//!
//! ```no_run
//! use ja3_ws_bridge::{ConnectionManager, Result, WsSession, run_bridge};
//! use tokio::io::BufReader;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let manager = ConnectionManager::new(WsSession::new());
//!     let stdin = BufReader::new(tokio::io::stdin());
//!
//!     run_bridge(&manager, stdin, tokio::io::stdout()).await
//! }
//! ```
//!
//! # Wire Protocol
//!
//! One JSON object per line, UTF-8, strict FIFO:
//!
//! ```json
//! {"action":"apply_ja3","ja3":"771,4865-4866,0-23,29,0","browser":"chrome"}
//! {"action":"connect","url":"wss://example/ws","headers":[["User-Agent","x"]]}
//! {"action":"send","message":{"hello":"world"}}
//! {"action":"receive"}
//! {"action":"close"}
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`bridge`] | Dispatcher and connection-state manager (the core) |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`protocol`] | NDJSON command/response types and line IO |
//! | [`session`] | Collaborator traits, JA3 parsing, default transport |

// ============================================================================
// Modules
// ============================================================================

/// Dispatcher and connection-state manager.
///
/// This is the core: [`ConnectionManager`] serializes every operation
/// against the single connection handle, [`run_bridge`] drives the
/// read-dispatch-write loop.
pub mod bridge;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// NDJSON wire protocol.
///
/// Command/response message types and the line-oriented reader/writer.
pub mod protocol;

/// Networking collaborator boundary.
///
/// Transport traits, JA3 fingerprint parsing, and the default
/// tokio-tungstenite implementation.
pub mod session;

// ============================================================================
// Re-exports
// ============================================================================

// Bridge core
pub use bridge::{ConnectionManager, dispatch, run_bridge};

// Error types
pub use error::{Error, Result};

// Protocol types
pub use protocol::{Action, Command, CommandReader, Response, ResponseWriter};

// Session types
pub use session::fingerprint::{BrowserProfile, Ja3Fingerprint};
pub use session::{MessageStream, OrderedHeaders, SessionTransport, WsSession};
