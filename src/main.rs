//! Bridge binary: NDJSON commands on stdin, NDJSON responses on stdout.
//!
//! Stdout carries protocol traffic only, so all logging goes to stderr.
//! Log verbosity is controlled through `RUST_LOG` (e.g.
//! `RUST_LOG=ja3_ws_bridge=debug`).

use std::process::ExitCode;

use tokio::io::BufReader;
use tracing::error;
use tracing_subscriber::EnvFilter;

use ja3_ws_bridge::{ConnectionManager, WsSession, run_bridge};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let manager = ConnectionManager::new(WsSession::new());
    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();

    match run_bridge(&manager, stdin, stdout).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Fatal stream IO is the only way to get here; command-level
            // failures were already reported as response lines.
            error!(error = %e, "bridge terminated");
            ExitCode::FAILURE
        }
    }
}
