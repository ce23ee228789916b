//! Command message types.
//!
//! Defines the host-to-bridge request format: one JSON object per input
//! line, tagged by an `action` field.
//!
//! # Format
//!
//! ```json
//! {"action": "connect", "url": "wss://example/ws", "headers": [["A", "1"]]}
//! {"action": "apply_ja3", "ja3": "771,4865-4866,0-23,29-23,0", "browser": "chrome"}
//! {"action": "send", "message": {"hello": "world"}}
//! {"action": "receive"}
//! {"action": "close"}
//! ```
//!
//! Exactly one action is valid per command. All other fields are optional
//! and only consulted by the action that needs them.

// ============================================================================
// Imports
// ============================================================================

use serde::Deserialize;
use serde_json::Value;

// ============================================================================
// Action
// ============================================================================

/// Command action tag.
///
/// Unrecognized tags deserialize to [`Action::Unknown`] so the bridge can
/// report an unknown-action failure instead of a parse failure, and keep
/// the one-response-per-line contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Establish the WebSocket connection.
    Connect,
    /// Write one message to the live connection.
    Send,
    /// Block until the next inbound message arrives.
    Receive,
    /// Configure JA3 fingerprint shaping on the session.
    ApplyJa3,
    /// Tear down the connection and release the session.
    Close,
    /// Any action tag this bridge does not implement.
    #[serde(other)]
    Unknown,
}

// ============================================================================
// Command
// ============================================================================

/// A single host command.
///
/// Field presence follows the original wire contract: every field except
/// `action` is optional, and actions ignore fields they do not use.
#[derive(Debug, Clone, Deserialize)]
pub struct Command {
    /// Which operation to execute.
    pub action: Action,

    /// Target address for `connect`.
    #[serde(default)]
    pub url: Option<String>,

    /// Ordered header entries for `connect`.
    ///
    /// Entries are raw string sequences; only 2-element entries are
    /// well-formed key/value pairs. Order is preserved and duplicate keys
    /// are allowed.
    #[serde(default)]
    pub headers: Option<Vec<Vec<String>>>,

    /// Opaque payload for `send`, forwarded verbatim.
    #[serde(default)]
    pub message: Option<Value>,

    /// JA3 fingerprint string for `apply_ja3`.
    #[serde(default)]
    pub ja3: Option<String>,

    /// Browser profile identifier for `apply_ja3`.
    #[serde(default)]
    pub browser: Option<String>,
}

// ============================================================================
// Tests
// ============================================================================
