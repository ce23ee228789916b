//! Connection-state lifecycle manager.
//!
//! [`ConnectionManager`] is the sole owner of the session and the connection
//! handle. Every public operation acquires one coarse async mutex for its
//! entire duration, so no two operations can ever interleave against the
//! same handle — even when commands are dispatched from multiple tasks.
//!
//! # State machine
//!
//! ```text
//! Disconnected ──connect──► Connected ──send/receive──► Connected
//!       ▲                       │
//!       └────────── close ──────┘        (close is idempotent)
//! ```
//!
//! `apply_ja3` is orthogonal: it mutates session configuration, not
//! connection state, and is legal in either state.
//!
//! The lock is deliberately held across blocking network calls: at most one
//! network operation should ever be in flight against one connection, and a
//! blocked `receive` intentionally delays a concurrent `close` rather than
//! racing it. Cancellation, if needed, lives at the collaborator boundary
//! as a read deadline.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use bytes::Bytes;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::session::fingerprint::{BrowserProfile, Ja3Fingerprint};
use crate::session::{MessageStream, OrderedHeaders, SessionTransport};

// ============================================================================
// Constants
// ============================================================================

/// Fixed per-connection read buffer limit, in bytes.
pub const READ_BUFFER_SIZE: usize = 1024;

/// Fixed per-connection write buffer limit, in bytes.
pub const WRITE_BUFFER_SIZE: usize = 1024;

// ============================================================================
// ConnectionManager
// ============================================================================

/// Session plus the at-most-one live handle, guarded as a unit.
struct Inner<S> {
    session: S,
    handle: Option<Box<dyn MessageStream>>,
}

/// Serializes all operations against one connection.
///
/// The handle is absent until a successful `connect` and cleared again on
/// `close`; `send`/`receive` against an absent handle is a defined failure
/// ([`Error::NotConnected`]), never a crash.
pub struct ConnectionManager<S> {
    inner: Mutex<Inner<S>>,
}

impl<S: SessionTransport> ConnectionManager<S> {
    /// Creates a manager owning the given session.
    pub fn new(session: S) -> Self {
        Self {
            inner: Mutex::new(Inner {
                session,
                handle: None,
            }),
        }
    }

    /// Configures JA3 shaping for the next connection.
    ///
    /// A missing `browser` defaults to the Chrome profile. Legal in any
    /// connection state; the handle is never touched.
    ///
    /// # Errors
    ///
    /// [`Error::Fingerprint`] if the JA3 string is malformed, the profile
    /// is unknown, or the session rejects the combination.
    pub async fn apply_ja3(&self, ja3: &str, browser: Option<&str>) -> Result<()> {
        let fingerprint = Ja3Fingerprint::parse(ja3)?;
        let profile = match browser {
            Some(name) => name.parse::<BrowserProfile>()?,
            None => BrowserProfile::default(),
        };

        let mut inner = self.inner.lock().await;
        inner.session.apply_fingerprint(&fingerprint, profile).await
    }

    /// Establishes the connection.
    ///
    /// Raw header entries are filtered to well-formed two-element pairs;
    /// malformed entries are silently dropped. If a handle is already live
    /// it is closed first, then replaced — a failed teardown of the old
    /// handle is logged, not surfaced, since the host asked for a fresh
    /// connection and the old handle is discarded either way.
    ///
    /// # Errors
    ///
    /// [`Error::Connection`] on any transport or handshake failure.
    pub async fn connect(&self, url: &str, raw_headers: &[Vec<String>]) -> Result<()> {
        let headers = OrderedHeaders::from_raw(raw_headers);

        let mut inner = self.inner.lock().await;

        if let Some(mut prior) = inner.handle.take() {
            debug!("closing prior connection before reconnect");
            if let Err(e) = prior.close().await {
                warn!(error = %e, "prior connection teardown failed");
            }
        }

        let handle = inner
            .session
            .open_connection(url, READ_BUFFER_SIZE, WRITE_BUFFER_SIZE, &headers)
            .await?;

        debug!(url, headers = headers.len(), "connected");
        inner.handle = Some(handle);
        Ok(())
    }

    /// Serializes and forwards one opaque message payload.
    ///
    /// Blocks until the underlying write completes or fails; the manager
    /// lock is held throughout.
    ///
    /// # Errors
    ///
    /// [`Error::NotConnected`] without a live handle, [`Error::Send`] on
    /// transport failure.
    pub async fn send(&self, message: &Value) -> Result<()> {
        let payload = serde_json::to_string(message)?;

        let mut inner = self.inner.lock().await;
        let handle = inner.handle.as_mut().ok_or(Error::NotConnected)?;
        handle.write_message(&payload).await
    }

    /// Blocks until the next inbound message arrives.
    ///
    /// # Errors
    ///
    /// [`Error::NotConnected`] without a live handle, [`Error::Receive`] on
    /// transport failure (which the host must distinguish from a successful
    /// empty message).
    pub async fn receive(&self) -> Result<Bytes> {
        self.receive_with_deadline(None).await
    }

    /// [`receive`](Self::receive) with an optional read deadline.
    ///
    /// The stdio protocol has no timeout field and always passes `None`;
    /// library embedders can bound the blocking read here.
    pub async fn receive_with_deadline(&self, deadline: Option<Duration>) -> Result<Bytes> {
        let mut inner = self.inner.lock().await;
        let handle = inner.handle.as_mut().ok_or(Error::NotConnected)?;
        handle.read_message(deadline).await
    }

    /// Tears down the handle (if any) and releases the session.
    ///
    /// Idempotent: a close with no live handle is a no-op on the handle but
    /// still releases the session. The in-memory handle reference is
    /// cleared even when the underlying teardown reports an error.
    ///
    /// # Errors
    ///
    /// [`Error::Teardown`] if the handle close or session release fails.
    pub async fn close(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;

        let handle_result = match inner.handle.take() {
            Some(mut handle) => handle.close().await,
            None => Ok(()),
        };

        let session_result = inner.session.close().await;
        debug!("connection manager closed");

        handle_result.and(session_result)
    }

    /// Returns `true` while a handle is live.
    pub async fn is_connected(&self) -> bool {
        self.inner.lock().await.handle.is_some()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::bridge::testutil::MockTransport;

    fn manager() -> (ConnectionManager<MockTransport>, MockTransport) {
        let transport = MockTransport::new();
        (ConnectionManager::new(transport.clone()), transport)
    }

    #[tokio::test]
    async fn test_send_before_connect_is_not_connected() {
        let (manager, _) = manager();

        let err = manager.send(&json!("hi")).await.expect_err("no handle");
        assert!(matches!(err, Error::NotConnected));
    }

    #[tokio::test]
    async fn test_receive_before_connect_is_not_connected() {
        let (manager, _) = manager();

        let err = manager.receive().await.expect_err("no handle");
        assert!(matches!(err, Error::NotConnected));
    }

    #[tokio::test]
    async fn test_connect_filters_headers_and_passes_buffers() {
        let (manager, transport) = manager();

        let raw = vec![
            vec!["A".to_string(), "1".to_string()],
            vec!["B".to_string()],
            vec!["C".to_string(), "2".to_string(), "extra".to_string()],
        ];
        manager.connect("wss://example/ws", &raw).await.expect("connect");
        assert!(manager.is_connected().await);

        let state = transport.state();
        let state = state.lock().expect("state");
        let (url, headers, read_buf, write_buf) = &state.connects[0];
        assert_eq!(url, "wss://example/ws");
        assert_eq!(headers, &vec![("A".to_string(), "1".to_string())]);
        assert_eq!((*read_buf, *write_buf), (READ_BUFFER_SIZE, WRITE_BUFFER_SIZE));
    }

    #[tokio::test]
    async fn test_connect_failure_leaves_disconnected() {
        let (manager, transport) = manager();
        transport.set_fail_connect(true);

        let err = manager
            .connect("wss://example/ws", &[])
            .await
            .expect_err("refused");
        assert!(matches!(err, Error::Connection { .. }));
        assert!(!manager.is_connected().await);

        // Subsequent send still reports the absent handle, not a crash.
        let err = manager.send(&json!(1)).await.expect_err("no handle");
        assert!(matches!(err, Error::NotConnected));
    }

    #[tokio::test]
    async fn test_reconnect_closes_prior_handle() {
        let (manager, transport) = manager();

        manager.connect("wss://example/a", &[]).await.expect("first");
        manager.connect("wss://example/b", &[]).await.expect("second");

        let state = transport.state();
        let state = state.lock().expect("state");
        assert_eq!(state.streams_closed, 1);
        assert_eq!(state.connects.len(), 2);
    }

    #[tokio::test]
    async fn test_send_serializes_opaque_payload() {
        let (manager, transport) = manager();
        manager.connect("wss://example/ws", &[]).await.expect("connect");

        manager
            .send(&json!({"hello": "world", "n": [1, 2]}))
            .await
            .expect("send");

        let state = transport.state();
        let state = state.lock().expect("state");
        assert_eq!(state.outbox, vec![r#"{"hello":"world","n":[1,2]}"#.to_string()]);
    }

    #[tokio::test]
    async fn test_receive_returns_raw_bytes() {
        let (manager, transport) = manager();
        manager.connect("wss://example/ws", &[]).await.expect("connect");
        transport.queue_inbound(b"{\"echo\":1}");

        let data = manager.receive().await.expect("receive");
        assert_eq!(&data[..], b"{\"echo\":1}");
    }

    #[tokio::test]
    async fn test_receive_failure_is_receive_error() {
        let (manager, _) = manager();
        manager.connect("wss://example/ws", &[]).await.expect("connect");

        // Empty mock inbox reports a transport failure.
        let err = manager.receive().await.expect_err("empty inbox");
        assert!(matches!(err, Error::Receive { .. }));
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let (manager, transport) = manager();
        manager.connect("wss://example/ws", &[]).await.expect("connect");

        manager.close().await.expect("first close");
        manager.close().await.expect("second close is a no-op");

        let state = transport.state();
        let state = state.lock().expect("state");
        assert_eq!(state.streams_closed, 1);
        assert!(state.session_closed);
    }

    #[tokio::test]
    async fn test_close_clears_handle_even_on_teardown_error() {
        let (manager, transport) = manager();
        manager.connect("wss://example/ws", &[]).await.expect("connect");
        transport.set_fail_stream_close(true);

        let err = manager.close().await.expect_err("teardown fails");
        assert!(matches!(err, Error::Teardown { .. }));

        // Handle reference is gone regardless.
        assert!(!manager.is_connected().await);
        let err = manager.send(&json!(1)).await.expect_err("no handle");
        assert!(matches!(err, Error::NotConnected));
    }

    #[tokio::test]
    async fn test_apply_ja3_defaults_to_chrome() {
        let (manager, transport) = manager();

        manager
            .apply_ja3("771,4865-4866,0-23,29,0", None)
            .await
            .expect("apply");

        let state = transport.state();
        let state = state.lock().expect("state");
        let (fp, profile) = &state.applied[0];
        assert_eq!(fp.tls_version, 771);
        assert_eq!(*profile, BrowserProfile::Chrome);
    }

    #[tokio::test]
    async fn test_apply_ja3_rejects_bad_input_before_session() {
        let (manager, transport) = manager();

        let err = manager.apply_ja3("not-a-ja3", None).await.expect_err("bad ja3");
        assert!(matches!(err, Error::Fingerprint { .. }));

        let err = manager
            .apply_ja3("771,4865,0,29,0", Some("netscape"))
            .await
            .expect_err("bad profile");
        assert!(matches!(err, Error::Fingerprint { .. }));

        let state = transport.state();
        assert!(state.lock().expect("state").applied.is_empty());
    }

    #[tokio::test]
    async fn test_apply_ja3_is_legal_while_connected() {
        let (manager, transport) = manager();
        manager.connect("wss://example/ws", &[]).await.expect("connect");

        manager
            .apply_ja3("771,4865,0,29,0", Some("safari"))
            .await
            .expect("apply while connected");

        assert!(manager.is_connected().await);
        let state = transport.state();
        assert_eq!(state.lock().expect("state").applied.len(), 1);
    }
}
