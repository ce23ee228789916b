//! Default transport: tokio-tungstenite over a fingerprint-shaped
//! rustls connector.
//!
//! [`WsSession`] keeps the applied JA3 fingerprint and browser profile as
//! session state and builds a fresh TLS connector from them for every
//! `connect`, so a fingerprint applied between connections shapes the next
//! handshake. [`WsStream`] wraps one live WebSocket: JSON text frames out,
//! text or binary frames in, ping/pong handled transparently.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue};
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::{Connector, MaybeTlsStream, WebSocketStream, connect_async_tls_with_config};
use tracing::{debug, trace, warn};
use url::Url;

use crate::error::{Error, Result};

use super::fingerprint::{BrowserProfile, Ja3Fingerprint};
use super::{MessageStream, OrderedHeaders, SessionTransport};

// ============================================================================
// WsSession
// ============================================================================

/// WebSocket session over tokio-tungstenite.
///
/// Created once at bridge startup and released on `close`. Fingerprint
/// configuration applies to every connection opened afterwards.
#[derive(Default)]
pub struct WsSession {
    /// Active fingerprint configuration, if any.
    fingerprint: Option<(Ja3Fingerprint, BrowserProfile)>,
    /// Set once the session has been released.
    released: bool,
}

impl WsSession {
    /// Creates a fresh session with no fingerprint applied.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the currently applied fingerprint configuration.
    #[inline]
    #[must_use]
    pub fn fingerprint(&self) -> Option<&(Ja3Fingerprint, BrowserProfile)> {
        self.fingerprint.as_ref()
    }

    /// Builds the TLS connector for the next connection.
    fn tls_connector(&self) -> Connector {
        let mut roots = rustls::RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

        let mut config = rustls::ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth();

        if let Some((fp, profile)) = &self.fingerprint {
            // h2 cannot carry a tungstenite upgrade; advertise only the
            // profile's HTTP/1.1-capable ALPN entries.
            config.alpn_protocols = profile
                .alpn_protocols()
                .into_iter()
                .filter(|proto| proto.as_slice() != b"h2")
                .collect();

            trace!(
                tls_version = fp.tls_version,
                profile = %profile,
                "connector shaped from fingerprint"
            );
        }

        Connector::Rustls(Arc::new(config))
    }
}

/// Rejects addresses that are not WebSocket URLs.
fn validate_url(raw: &str) -> Result<()> {
    let parsed = Url::parse(raw).map_err(|e| Error::connection(format!("invalid URL: {e}")))?;

    match parsed.scheme() {
        "ws" | "wss" => Ok(()),
        other => Err(Error::connection(format!(
            "unsupported URL scheme: {other}"
        ))),
    }
}

#[async_trait]
impl SessionTransport for WsSession {
    async fn apply_fingerprint(
        &mut self,
        fingerprint: &Ja3Fingerprint,
        profile: BrowserProfile,
    ) -> Result<()> {
        if self.released {
            return Err(Error::fingerprint("session already closed"));
        }

        debug!(
            tls_version = fingerprint.tls_version,
            ciphers = fingerprint.cipher_suites.len(),
            profile = %profile,
            "JA3 fingerprint applied"
        );

        self.fingerprint = Some((fingerprint.clone(), profile));
        Ok(())
    }

    async fn open_connection(
        &mut self,
        url: &str,
        read_buffer_size: usize,
        write_buffer_size: usize,
        headers: &OrderedHeaders,
    ) -> Result<Box<dyn MessageStream>> {
        if self.released {
            return Err(Error::connection("session already closed"));
        }
        validate_url(url)?;

        let mut request = url
            .into_client_request()
            .map_err(|e| Error::connection(e.to_string()))?;

        // HeaderMap keeps multi-value insertion order per key via append.
        let request_headers = request.headers_mut();
        for (name, value) in headers.iter() {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::connection(format!("invalid header name {name:?}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::connection(format!("invalid header value: {e}")))?;
            request_headers.append(name, value);
        }

        let config = WebSocketConfig::default()
            .read_buffer_size(read_buffer_size)
            .write_buffer_size(write_buffer_size);

        let (stream, response) =
            connect_async_tls_with_config(request, Some(config), false, Some(self.tls_connector()))
                .await
                .map_err(|e| Error::connection(e.to_string()))?;

        debug!(url, status = %response.status(), "websocket connected");

        Ok(Box::new(WsStream { inner: stream }))
    }

    async fn close(&mut self) -> Result<()> {
        self.released = true;
        self.fingerprint = None;
        debug!("session released");
        Ok(())
    }
}

// ============================================================================
// WsStream
// ============================================================================

/// One live WebSocket connection.
pub struct WsStream {
    inner: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsStream {
    /// Pulls frames until a data frame, a close, or stream end.
    async fn next_data_frame(&mut self) -> Result<Bytes> {
        loop {
            let frame = self
                .inner
                .next()
                .await
                .ok_or_else(|| Error::receive("connection closed"))?
                .map_err(|e| Error::receive(e.to_string()))?;

            match frame {
                Message::Text(text) => return Ok(Bytes::from(text)),
                Message::Binary(data) => return Ok(data),
                Message::Close(_) => {
                    return Err(Error::receive("connection closed by peer"));
                }
                // Ping/pong is handled by tungstenite itself.
                other => trace!(?other, "control frame skipped"),
            }
        }
    }
}

#[async_trait]
impl MessageStream for WsStream {
    async fn write_message(&mut self, payload: &str) -> Result<()> {
        self.inner
            .send(Message::text(payload))
            .await
            .map_err(|e| Error::send(e.to_string()))
    }

    async fn read_message(&mut self, deadline: Option<Duration>) -> Result<Bytes> {
        match deadline {
            None => self.next_data_frame().await,
            Some(limit) => timeout(limit, self.next_data_frame())
                .await
                .map_err(|_| Error::receive(format!("read timed out after {limit:?}")))?,
        }
    }

    async fn close(&mut self) -> Result<()> {
        use tokio_tungstenite::tungstenite::Error as WsError;

        match self.inner.close(None).await {
            Ok(()) => Ok(()),
            // Already-closed streams are a successful no-op teardown.
            Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => Ok(()),
            Err(e) => {
                warn!(error = %e, "close handshake failed");
                Err(Error::teardown(e.to_string()))
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
