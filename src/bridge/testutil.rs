//! Shared mock transport for manager and dispatcher tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{Error, Result};
use crate::session::fingerprint::{BrowserProfile, Ja3Fingerprint};
use crate::session::{MessageStream, OrderedHeaders, SessionTransport};

/// Observable state shared between a [`MockTransport`] and its streams.
#[derive(Default)]
pub struct MockState {
    /// Fingerprints applied, in order.
    pub applied: Vec<(Ja3Fingerprint, BrowserProfile)>,
    /// `(url, headers, read_buffer, write_buffer)` per connect call.
    pub connects: Vec<(String, Vec<(String, String)>, usize, usize)>,
    /// Messages written to any stream, in order.
    pub outbox: Vec<String>,
    /// Messages queued for `read_message`.
    pub inbox: VecDeque<Bytes>,
    /// Number of stream close calls observed.
    pub streams_closed: usize,
    /// Whether the session itself has been released.
    pub session_closed: bool,
    /// Force the next `open_connection` to fail.
    pub fail_connect: bool,
    /// Force stream closes to fail.
    pub fail_stream_close: bool,
}

/// Mock session transport with fully observable state.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Arc<Mutex<MockState>> {
        Arc::clone(&self.state)
    }

    pub fn queue_inbound(&self, payload: &[u8]) {
        self.state
            .lock()
            .expect("mock state")
            .inbox
            .push_back(Bytes::copy_from_slice(payload));
    }

    pub fn set_fail_connect(&self, fail: bool) {
        self.state.lock().expect("mock state").fail_connect = fail;
    }

    pub fn set_fail_stream_close(&self, fail: bool) {
        self.state.lock().expect("mock state").fail_stream_close = fail;
    }
}

#[async_trait]
impl SessionTransport for MockTransport {
    async fn apply_fingerprint(
        &mut self,
        fingerprint: &Ja3Fingerprint,
        profile: BrowserProfile,
    ) -> Result<()> {
        self.state
            .lock()
            .expect("mock state")
            .applied
            .push((fingerprint.clone(), profile));
        Ok(())
    }

    async fn open_connection(
        &mut self,
        url: &str,
        read_buffer_size: usize,
        write_buffer_size: usize,
        headers: &OrderedHeaders,
    ) -> Result<Box<dyn MessageStream>> {
        let mut state = self.state.lock().expect("mock state");
        if state.fail_connect {
            return Err(Error::connection("mock connect refused"));
        }

        state.connects.push((
            url.to_string(),
            headers.iter().cloned().collect(),
            read_buffer_size,
            write_buffer_size,
        ));

        Ok(Box::new(MockStream {
            state: Arc::clone(&self.state),
        }))
    }

    async fn close(&mut self) -> Result<()> {
        self.state.lock().expect("mock state").session_closed = true;
        Ok(())
    }
}

/// Stream half of the mock transport.
pub struct MockStream {
    state: Arc<Mutex<MockState>>,
}

#[async_trait]
impl MessageStream for MockStream {
    async fn write_message(&mut self, payload: &str) -> Result<()> {
        self.state
            .lock()
            .expect("mock state")
            .outbox
            .push(payload.to_string());
        Ok(())
    }

    async fn read_message(&mut self, _deadline: Option<Duration>) -> Result<Bytes> {
        self.state
            .lock()
            .expect("mock state")
            .inbox
            .pop_front()
            .ok_or_else(|| Error::receive("mock inbox empty"))
    }

    async fn close(&mut self) -> Result<()> {
        let mut state = self.state.lock().expect("mock state");
        state.streams_closed += 1;
        if state.fail_stream_close {
            return Err(Error::teardown("mock close refused"));
        }
        Ok(())
    }
}
