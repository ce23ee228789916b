//! Command dispatch and the read-dispatch-write loop.
//!
//! [`dispatch`] maps one parsed command onto the matching
//! [`ConnectionManager`] operation and wraps the outcome in a [`Response`].
//! [`run_bridge`] drives the whole protocol: read a line, dispatch, write
//! the response, repeat — strict FIFO, one response per input line.
//!
//! Every failure origin (malformed line, unknown action, collaborator
//! error) becomes a `success: false` response and the loop keeps going.
//! Only input-stream or output-stream IO failure is fatal.

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncWrite};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::protocol::{Action, Command, CommandReader, Response, ResponseWriter};
use crate::session::SessionTransport;

use super::ConnectionManager;

// ============================================================================
// Dispatch
// ============================================================================

/// Executes one command against the manager.
///
/// Never returns an error: every operation outcome, success or failure, is
/// folded into the response envelope.
pub async fn dispatch<S: SessionTransport>(
    manager: &ConnectionManager<S>,
    command: &Command,
) -> Response {
    let result = execute(manager, command).await;

    match result {
        Ok(data) => match data {
            Some(value) => Response::with_data(value),
            None => Response::ok(),
        },
        Err(e) => {
            debug!(action = ?command.action, error = %e, "command failed");
            Response::failure(e)
        }
    }
}

/// Maps the action to a manager operation, returning optional result data.
async fn execute<S: SessionTransport>(
    manager: &ConnectionManager<S>,
    command: &Command,
) -> Result<Option<Value>> {
    match command.action {
        Action::Connect => {
            let url = command
                .url
                .as_deref()
                .ok_or_else(|| Error::connection("no URL provided"))?;
            let headers = command.headers.as_deref().unwrap_or_default();

            manager.connect(url, headers).await?;
            Ok(None)
        }

        Action::Send => {
            // A missing payload forwards JSON null, matching the original
            // bridge contract.
            let message = command.message.clone().unwrap_or(Value::Null);
            manager.send(&message).await?;
            Ok(None)
        }

        Action::Receive => {
            let data = manager.receive().await?;
            // Raw message content is exposed to the host as text.
            let text = String::from_utf8_lossy(&data).into_owned();
            Ok(Some(Value::String(text)))
        }

        Action::ApplyJa3 => {
            let ja3 = command
                .ja3
                .as_deref()
                .ok_or_else(|| Error::fingerprint("no JA3 string provided"))?;

            manager.apply_ja3(ja3, command.browser.as_deref()).await?;
            Ok(None)
        }

        Action::Close => {
            manager.close().await?;
            Ok(None)
        }

        Action::Unknown => Err(Error::UnknownAction),
    }
}

// ============================================================================
// Run Loop
// ============================================================================

/// Drives the bridge until a successful `close` or end of input.
///
/// A line that fails to parse yields a synthetic failure response and the
/// loop resumes on the next line. Responses are written, flushed, in exact
/// input order. A successful `close` ends the loop after its response has
/// been written.
///
/// # Errors
///
/// Returns [`Error::Io`] only when the input stream cannot be read or a
/// response cannot be written. No retry is attempted at this layer.
pub async fn run_bridge<S, R, W>(
    manager: &ConnectionManager<S>,
    input: R,
    output: W,
) -> Result<()>
where
    S: SessionTransport,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut reader = CommandReader::new(input);
    let mut writer = ResponseWriter::new(output);

    info!("bridge loop started");

    while let Some(next) = reader.next_command().await {
        match next {
            Ok(command) => {
                let response = dispatch(manager, &command).await;
                let terminate = command.action == Action::Close && response.success;

                writer.write(&response).await?;

                if terminate {
                    info!("close acknowledged, terminating");
                    return Ok(());
                }
            }

            Err(e) if e.is_recoverable() => {
                warn!(error = %e, "rejecting malformed command line");
                writer.write(&Response::failure(e)).await?;
            }

            Err(e) => return Err(e),
        }
    }

    info!("end of input, terminating");
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Cursor;

    use crate::bridge::testutil::MockTransport;

    async fn run(transport: MockTransport, input: &str) -> Vec<String> {
        let manager = ConnectionManager::new(transport);
        let mut output = Cursor::new(Vec::new());

        run_bridge(&manager, input.as_bytes(), &mut output)
            .await
            .expect("loop exits cleanly");

        let text = String::from_utf8(output.into_inner()).expect("utf8");
        text.lines().map(str::to_string).collect()
    }

    #[tokio::test]
    async fn test_happy_path_scenario() {
        let transport = MockTransport::new();
        let lines = run(
            transport.clone(),
            "{\"action\":\"connect\",\"url\":\"wss://example/ws\"}\n\
             {\"action\":\"send\",\"message\":{\"hello\":\"world\"}}\n\
             {\"action\":\"close\"}\n",
        )
        .await;

        assert_eq!(
            lines,
            vec![
                r#"{"success":true}"#,
                r#"{"success":true}"#,
                r#"{"success":true}"#,
            ]
        );

        let state = transport.state();
        let state = state.lock().expect("state");
        assert_eq!(state.outbox, vec![r#"{"hello":"world"}"#.to_string()]);
        assert!(state.session_closed);
    }

    #[tokio::test]
    async fn test_connect_failure_does_not_stop_the_loop() {
        let transport = MockTransport::new();
        transport.set_fail_connect(true);

        let lines = run(
            transport,
            "{\"action\":\"connect\",\"url\":\"wss://example/ws\"}\n\
             {\"action\":\"send\",\"message\":1}\n\
             {\"action\":\"close\"}\n",
        )
        .await;

        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains(r#""success":false"#));
        assert!(lines[0].contains("mock connect refused"));
        assert!(lines[1].contains("websocket not connected"));
        assert_eq!(lines[2], r#"{"success":true}"#);
    }

    #[tokio::test]
    async fn test_responses_are_strict_fifo() {
        let transport = MockTransport::new();
        transport.queue_inbound(b"first");
        transport.queue_inbound(b"second");

        // All commands pipelined before any response is consumed.
        let lines = run(
            transport,
            "{\"action\":\"connect\",\"url\":\"wss://example/ws\"}\n\
             {\"action\":\"receive\"}\n\
             {\"action\":\"receive\"}\n\
             {\"action\":\"close\"}\n",
        )
        .await;

        assert_eq!(
            lines,
            vec![
                r#"{"success":true}"#,
                r#"{"success":true,"data":"first"}"#,
                r#"{"success":true,"data":"second"}"#,
                r#"{"success":true}"#,
            ]
        );
    }

    #[tokio::test]
    async fn test_malformed_line_yields_one_failure_and_continues() {
        let lines = run(
            MockTransport::new(),
            "this is not json\n{\"action\":\"close\"}\n",
        )
        .await;

        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains(r#""success":false"#));
        assert!(lines[0].contains("invalid command"));
        assert_eq!(lines[1], r#"{"success":true}"#);
    }

    #[tokio::test]
    async fn test_unknown_action_is_rejected_not_fatal() {
        let lines = run(
            MockTransport::new(),
            "{\"action\":\"reboot\"}\n{\"action\":\"close\"}\n",
        )
        .await;

        assert_eq!(
            lines,
            vec![
                r#"{"success":false,"error":"unknown action"}"#,
                r#"{"success":true}"#,
            ]
        );
    }

    #[tokio::test]
    async fn test_successful_close_terminates_before_later_commands() {
        let transport = MockTransport::new();
        let lines = run(
            transport.clone(),
            "{\"action\":\"close\"}\n{\"action\":\"receive\"}\n",
        )
        .await;

        // The receive after close is never processed.
        assert_eq!(lines, vec![r#"{"success":true}"#]);
    }

    #[tokio::test]
    async fn test_eof_terminates_cleanly() {
        let lines = run(MockTransport::new(), "").await;
        assert!(lines.is_empty());
    }

    #[tokio::test]
    async fn test_connect_without_url() {
        let lines = run(
            MockTransport::new(),
            "{\"action\":\"connect\"}\n{\"action\":\"close\"}\n",
        )
        .await;

        assert!(lines[0].contains("no URL provided"));
        assert_eq!(lines[1], r#"{"success":true}"#);
    }

    #[tokio::test]
    async fn test_send_without_message_forwards_null() {
        let transport = MockTransport::new();
        let lines = run(
            transport.clone(),
            "{\"action\":\"connect\",\"url\":\"wss://example/ws\"}\n\
             {\"action\":\"send\"}\n\
             {\"action\":\"close\"}\n",
        )
        .await;

        assert_eq!(lines[1], r#"{"success":true}"#);
        let state = transport.state();
        assert_eq!(state.lock().expect("state").outbox, vec!["null".to_string()]);
    }

    #[tokio::test]
    async fn test_apply_ja3_roundtrip() {
        let transport = MockTransport::new();
        let lines = run(
            transport.clone(),
            "{\"action\":\"apply_ja3\",\"ja3\":\"771,4865-4866,0-23,29,0\",\"browser\":\"edge\"}\n\
             {\"action\":\"apply_ja3\"}\n\
             {\"action\":\"close\"}\n",
        )
        .await;

        assert_eq!(lines[0], r#"{"success":true}"#);
        assert!(lines[1].contains("no JA3 string provided"));

        let state = transport.state();
        let state = state.lock().expect("state");
        assert_eq!(state.applied.len(), 1);
    }

    #[tokio::test]
    async fn test_receive_failure_distinct_from_empty_message() {
        let transport = MockTransport::new();
        transport.queue_inbound(b"");

        let lines = run(
            transport,
            "{\"action\":\"connect\",\"url\":\"wss://example/ws\"}\n\
             {\"action\":\"receive\"}\n\
             {\"action\":\"receive\"}\n\
             {\"action\":\"close\"}\n",
        )
        .await;

        // Empty message: success with empty data. Drained inbox: failure.
        assert_eq!(lines[1], r#"{"success":true,"data":""}"#);
        assert!(lines[2].contains(r#""success":false"#));
    }
}
