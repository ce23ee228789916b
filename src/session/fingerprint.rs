//! JA3 fingerprint strings and browser profiles.
//!
//! A JA3 string describes the shape of a TLS ClientHello as five
//! comma-separated fields: TLS version, cipher suites, extensions, elliptic
//! curves and EC point formats, each list dash-separated. Controlling these
//! parameters lets a client mimic a specific browser implementation.
//!
//! The bridge validates the string structurally at `apply_ja3` time; how
//! much of it the transport can honor is the transport's business.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// BrowserProfile
// ============================================================================

/// Browser profile a fingerprint mimics.
///
/// Profile identifiers match the original host contract; `android` is
/// deprecated there but still accepted here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserProfile {
    /// Chrome (the default when the host omits `browser`).
    #[default]
    Chrome,
    /// Firefox.
    Firefox,
    /// Opera.
    Opera,
    /// Safari.
    Safari,
    /// Edge.
    Edge,
    /// Safari on iOS.
    Ios,
    /// Android WebView (deprecated upstream, still accepted).
    Android,
}

impl BrowserProfile {
    /// Wire identifier for this profile.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Chrome => "chrome",
            Self::Firefox => "firefox",
            Self::Opera => "opera",
            Self::Safari => "safari",
            Self::Edge => "edge",
            Self::Ios => "ios",
            Self::Android => "android",
        }
    }

    /// ALPN protocol list this profile advertises.
    #[must_use]
    pub fn alpn_protocols(self) -> Vec<Vec<u8>> {
        match self {
            // Mobile Safari negotiates HTTP/1.1 only over WebSocket upgrades.
            Self::Ios => vec![b"http/1.1".to_vec()],
            _ => vec![b"h2".to_vec(), b"http/1.1".to_vec()],
        }
    }
}

impl FromStr for BrowserProfile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "chrome" => Ok(Self::Chrome),
            "firefox" => Ok(Self::Firefox),
            "opera" => Ok(Self::Opera),
            "safari" => Ok(Self::Safari),
            "edge" => Ok(Self::Edge),
            "ios" => Ok(Self::Ios),
            "android" => Ok(Self::Android),
            other => Err(Error::fingerprint(format!(
                "unknown browser profile: {other}"
            ))),
        }
    }
}

impl fmt::Display for BrowserProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Ja3Fingerprint
// ============================================================================

/// A structurally validated JA3 fingerprint.
///
/// # Format
///
/// ```text
/// 771,4865-4866-4867,45-13-43-0,29-23-24,0
/// ^   ^               ^          ^        ^
/// |   cipher suites   extensions curves   EC point formats
/// TLS version
/// ```
///
/// List fields may be empty; the version field may not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ja3Fingerprint {
    /// TLS version from the ClientHello (e.g. 771 = TLS 1.2 on the wire).
    pub tls_version: u16,
    /// Cipher suite values in advertised order.
    pub cipher_suites: Vec<u16>,
    /// Extension values in advertised order.
    pub extensions: Vec<u16>,
    /// Elliptic curve (supported group) values.
    pub elliptic_curves: Vec<u16>,
    /// EC point format values.
    pub point_formats: Vec<u8>,
}

impl Ja3Fingerprint {
    /// Parses a JA3 string.
    ///
    /// # Errors
    ///
    /// [`Error::Fingerprint`] if the string does not have exactly five
    /// comma-separated fields or any list element is not a decimal number
    /// in range.
    pub fn parse(raw: &str) -> Result<Self> {
        let fields: Vec<&str> = raw.split(',').collect();
        if fields.len() != 5 {
            return Err(Error::fingerprint(format!(
                "JA3 must have 5 comma-separated fields, got {}",
                fields.len()
            )));
        }

        let tls_version = fields[0]
            .parse::<u16>()
            .map_err(|_| Error::fingerprint(format!("invalid TLS version: {:?}", fields[0])))?;

        Ok(Self {
            tls_version,
            cipher_suites: parse_list(fields[1], "cipher suite")?,
            extensions: parse_list(fields[2], "extension")?,
            elliptic_curves: parse_list(fields[3], "elliptic curve")?,
            point_formats: parse_list(fields[4], "EC point format")?,
        })
    }
}

impl FromStr for Ja3Fingerprint {
    type Err = Error;

    #[inline]
    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Ja3Fingerprint {
    /// Re-encodes the canonical JA3 string.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{},{}",
            self.tls_version,
            join(&self.cipher_suites),
            join(&self.extensions),
            join(&self.elliptic_curves),
            join(&self.point_formats),
        )
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Parses a dash-separated list of decimal values. Empty field = empty list.
fn parse_list<T: FromStr>(field: &str, what: &str) -> Result<Vec<T>> {
    if field.is_empty() {
        return Ok(Vec::new());
    }

    field
        .split('-')
        .map(|item| {
            item.parse::<T>()
                .map_err(|_| Error::fingerprint(format!("invalid {what} value: {item:?}")))
        })
        .collect()
}

fn join<T: fmt::Display>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("-")
}

// ============================================================================
// Tests
// ============================================================================
