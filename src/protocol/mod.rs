//! Wire protocol for the stdio bridge.
//!
//! The host drives the bridge with newline-delimited JSON over stdin and
//! reads newline-delimited JSON responses from stdout, one object per line,
//! UTF-8 encoded. Ordering is strict FIFO: one response per command, never
//! reordered or batched.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `command` | Host-to-bridge request types |
//! | `response` | Bridge-to-host result envelope |
//! | `stream` | Line-oriented reader and writer |

// ============================================================================
// Submodules
// ============================================================================

/// Host-to-bridge request types.
pub mod command;

/// Bridge-to-host result envelope.
pub mod response;

/// Line-oriented reader and writer.
pub mod stream;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::{Action, Command};
pub use response::Response;
pub use stream::{CommandReader, ResponseWriter};
