//! RPC server - unix socket server for daemon-client communication.

use crate::handlers::handle_request;
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use stride_core::ranking::RankingView;
use stride_core::rpc::{RpcRequest, RpcResponse};
use stride_core::store::ProgressStore;
use stride_core::ProgressionLedger;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tracing::{error, info, warn};

/// Daemon state shared across connections
pub struct DaemonState {
    pub version: String,
    pub start_time: std::time::Instant,
    pub store_backend: String,
    pub store: Arc<dyn ProgressStore>,
    pub ledger: ProgressionLedger,
    pub ranking: RankingView,
}

/// Start the RPC server
pub async fn start_server(state: Arc<DaemonState>, socket_path: &str) -> Result<()> {
    let socket_path = Path::new(socket_path);
    if let Some(socket_dir) = socket_path.parent() {
        tokio::fs::create_dir_all(socket_dir)
            .await
            .context("Failed to create socket directory")?;
    }

    // Remove old socket if it exists
    let _ = tokio::fs::remove_file(socket_path).await;

    let listener = UnixListener::bind(socket_path).context("Failed to bind Unix socket")?;

    info!("RPC server listening on {}", socket_path.display());

    loop {
        match listener.accept().await {
            Ok((stream, _)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, state).await {
                        error!("Connection handler error: {}", e);
                    }
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}

/// Handle a single client connection
async fn handle_connection(stream: UnixStream, state: Arc<DaemonState>) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader
            .read_line(&mut line)
            .await
            .context("Failed to read from socket")?;

        if bytes_read == 0 {
            // Connection closed
            break;
        }

        let response = match serde_json::from_str::<RpcRequest>(&line) {
            Ok(request) => handle_request(request, &state).await,
            Err(e) => {
                warn!("Invalid request JSON: {}", e);
                RpcResponse::failure(String::new(), -32700, format!("parse error: {e}"))
            }
        };

        let response_json = serde_json::to_string(&response)? + "\n";
        writer
            .write_all(response_json.as_bytes())
            .await
            .context("Failed to write response")?;
    }

    Ok(())
}
