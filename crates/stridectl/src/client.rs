//! Unix socket client for communicating with strided.

use anyhow::{anyhow, Result};
use std::path::Path;
use stride_core::rpc::{RpcMethod, RpcRequest, RpcResponse};
use stride_core::SOCKET_PATH;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

/// Client for communicating with strided
pub struct StridedClient {
    stream: UnixStream,
}

impl StridedClient {
    /// Connect to strided
    pub async fn connect() -> Result<Self> {
        let socket_path = Path::new(SOCKET_PATH);

        if !socket_path.exists() {
            return Err(anyhow!(
                "Stride daemon not running.\n\
                 The socket at {} does not exist.\n\n\
                 Start it with: sudo systemctl start strided",
                SOCKET_PATH
            ));
        }

        let stream = UnixStream::connect(socket_path).await.map_err(|e| {
            anyhow!(
                "Cannot connect to the Stride daemon: {}\n\n\
                 The daemon may have crashed. Try:\n\
                 sudo systemctl restart strided",
                e
            )
        })?;

        Ok(Self { stream })
    }

    /// Send an RPC request and unwrap its result value.
    pub async fn call(
        &mut self,
        method: RpcMethod,
        params: Option<serde_json::Value>,
    ) -> Result<serde_json::Value> {
        let request = RpcRequest::new(method, params);
        let request_json = serde_json::to_string(&request)?;

        self.stream
            .write_all(format!("{}\n", request_json).as_bytes())
            .await?;

        let (reader, _) = self.stream.split();
        let mut reader = BufReader::new(reader);
        let mut line = String::new();
        reader.read_line(&mut line).await?;

        let response: RpcResponse = serde_json::from_str(&line)?;
        if let Some(error) = response.error {
            return Err(anyhow!("{} (code {})", error.message, error.code));
        }
        response
            .result
            .ok_or_else(|| anyhow!("No result in response"))
    }
}
