//! Bridge core: command dispatch and connection-state management.
//!
//! This is the part with the real design content. One
//! [`ConnectionManager`] owns the session and the at-most-one live
//! connection handle; [`run_bridge`] feeds it commands from the line
//! protocol and writes back one response per command, in order.
//!
//! ```text
//! stdin ──► CommandReader ──► dispatch ──► ConnectionManager ──► transport
//!                                │
//! stdout ◄── ResponseWriter ◄────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `manager` | Connection-state lifecycle manager |
//! | `dispatcher` | Command mapping and the run loop |

// ============================================================================
// Submodules
// ============================================================================

/// Connection-state lifecycle manager.
pub mod manager;

/// Command mapping and the run loop.
pub mod dispatcher;

#[cfg(test)]
pub(crate) mod testutil;

// ============================================================================
// Re-exports
// ============================================================================

pub use dispatcher::{dispatch, run_bridge};
pub use manager::{ConnectionManager, READ_BUFFER_SIZE, WRITE_BUFFER_SIZE};
