//! Response envelope type.
//!
//! Every command produces exactly one response line, success or failure.
//!
//! # Format
//!
//! Success:
//! ```json
//! {"success": true}
//! {"success": true, "data": "{\"echo\":1}"}
//! ```
//!
//! Failure:
//! ```json
//! {"success": false, "error": "websocket not connected"}
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Response
// ============================================================================

/// Bridge-to-host result envelope.
///
/// `error` is present iff `success` is false; `data` is present only for
/// actions that return data (currently a successful `receive`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Whether the command succeeded.
    pub success: bool,

    /// Human-readable failure description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Result payload, if the action produced one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Response {
    /// Creates a bare success response.
    #[inline]
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            success: true,
            error: None,
            data: None,
        }
    }

    /// Creates a success response carrying a data payload.
    #[inline]
    #[must_use]
    pub const fn with_data(data: Value) -> Self {
        Self {
            success: true,
            error: None,
            data: Some(data),
        }
    }

    /// Creates a failure response from any displayable error.
    #[inline]
    pub fn failure(error: impl Display) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
            data: None,
        }
    }

    /// Returns `true` if this is a failure response.
    #[inline]
    #[must_use]
    pub fn is_failure(&self) -> bool {
        !self.success
    }
}

// ============================================================================
// Tests
// ============================================================================
