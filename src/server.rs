use std::sync::Arc;

use thiserror::Error;
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};

use crate::client::Backend;
use crate::handlers::{self, SessionState, ToolRegistry};
use crate::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};

/// Maximum bytes per JSON-RPC message (1 MiB), excluding the line terminator.
pub const MAX_MESSAGE_BYTES: usize = 1024 * 1024;

/// Most bytes buffered for one line: a full message plus `\r\n`.
const READ_LIMIT: u64 = MAX_MESSAGE_BYTES as u64 + 2;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// MCP bridge that communicates over stdio using newline-delimited JSON-RPC 2.0.
///
/// Requests are handled strictly one at a time: each line is dispatched,
/// including its backend call, and answered before the next is read.
pub struct McpServer {
    registry: ToolRegistry,
    backend: Arc<dyn Backend>,
    state: SessionState,
}

impl McpServer {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self::with_registry(backend, ToolRegistry::builtin())
    }

    pub fn with_registry(backend: Arc<dyn Backend>, registry: ToolRegistry) -> Self {
        Self {
            registry,
            backend,
            state: SessionState::Uninitialized,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Serve stdin/stdout until stdin reaches end of stream.
    pub async fn run(&mut self) -> Result<(), ServerError> {
        tracing::info!(tools = self.registry.len(), "MCP bridge listening on stdio");
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.serve(stdin, stdout).await
    }

    /// Read-dispatch-write loop over any line stream.
    ///
    /// Ends cleanly at end of input or on a read error (which is logged).
    /// A final line without a trailing newline is still processed. Write
    /// failures are returned.
    pub async fn serve<R, W>(&mut self, mut reader: R, mut writer: W) -> Result<(), ServerError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut raw = Vec::new();

        loop {
            raw.clear();
            let mut limited = (&mut reader).take(READ_LIMIT);
            let n = match limited.read_until(b'\n', &mut raw).await {
                Ok(0) => {
                    tracing::info!("input closed, shutting down");
                    break;
                }
                Ok(n) => n,
                Err(e) => {
                    tracing::error!(error = %e, "failed to read request stream");
                    break;
                }
            };

            let truncated = raw.last() != Some(&b'\n') && n as u64 == READ_LIMIT;
            if truncated {
                if let Err(e) = discard_line(&mut reader).await {
                    tracing::error!(error = %e, "failed to read request stream");
                    break;
                }
            }

            let message = strip_terminator(&raw);
            if truncated || message.len() > MAX_MESSAGE_BYTES {
                tracing::warn!(limit = MAX_MESSAGE_BYTES, "message too large");
                write_response(
                    &mut writer,
                    &JsonRpcResponse::error(None, JsonRpcError::parse_error()),
                )
                .await?;
                continue;
            }

            let line = match std::str::from_utf8(message) {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!(error = %e, "request is not valid UTF-8");
                    write_response(
                        &mut writer,
                        &JsonRpcResponse::error(None, JsonRpcError::parse_error()),
                    )
                    .await?;
                    continue;
                }
            };

            if let Some(resp) = self.handle_line(line).await {
                write_response(&mut writer, &resp).await?;
            }
        }

        Ok(())
    }

    /// Handle one input line. Blank lines and notifications yield `None`.
    pub async fn handle_line(&mut self, line: &str) -> Option<JsonRpcResponse> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }

        let req: JsonRpcRequest = match serde_json::from_str(trimmed) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "parse error");
                return Some(JsonRpcResponse::error(None, JsonRpcError::parse_error()));
            }
        };

        // Validate jsonrpc version when present
        if req.jsonrpc.as_deref().is_some_and(|v| v != "2.0") {
            if req.is_notification() {
                return None;
            }
            return Some(JsonRpcResponse::error(
                req.id.clone(),
                JsonRpcError::invalid_request(),
            ));
        }

        tracing::debug!(method = %req.method, id = ?req.id, "request");
        handlers::dispatch(&req, &mut self.state, &self.registry, self.backend.as_ref()).await
    }
}

/// Line content without its `\n` or `\r\n` terminator.
fn strip_terminator(raw: &[u8]) -> &[u8] {
    let line = raw.strip_suffix(b"\n").unwrap_or(raw);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Skip the remainder of an oversized line, up to and including its `\n`.
async fn discard_line<R>(reader: &mut R) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let buf = reader.fill_buf().await?;
        if buf.is_empty() {
            return Ok(());
        }
        match buf.iter().position(|&b| b == b'\n') {
            Some(pos) => {
                reader.consume(pos + 1);
                return Ok(());
            }
            None => {
                let len = buf.len();
                reader.consume(len);
            }
        }
    }
}

/// Write one response as a single line, then flush.
async fn write_response<W>(writer: &mut W, resp: &JsonRpcResponse) -> Result<(), ServerError>
where
    W: AsyncWrite + Unpin,
{
    let mut out = serde_json::to_vec(resp)?;
    out.push(b'\n');
    writer.write_all(&out).await?;
    writer.flush().await?;
    Ok(())
}
