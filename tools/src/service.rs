//! Line-delimited JSON front end for the tool-invocation runtime.
//!
//! Each input line is one request; each output line is one response. Calls
//! run concurrently, so responses may come back out of order and carry the
//! caller's `call_id` for matching.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::executor::{ExecuteResponse, Executor, ToolCall};
use crate::registry::{Registry, ToolDefinition};

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    Call(ToolCall),
    ListTools {
        #[serde(default)]
        namespace: String,
    },
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Result(ExecuteResponse),
    Tools { tools: Vec<ToolDefinition> },
    Error { error: String },
}

/// Shared tool state; read-only once serving starts
pub struct ToolState {
    pub registry: Registry,
    pub executor: Executor,
}

#[derive(Clone)]
pub struct ToolService {
    state: Arc<ToolState>,
}

impl ToolService {
    pub fn new(registry: Registry, executor: Executor) -> Self {
        Self {
            state: Arc::new(ToolState { registry, executor }),
        }
    }

    pub fn state(&self) -> &ToolState {
        &self.state
    }

    pub async fn handle(&self, request: Request) -> Response {
        match request {
            Request::Call(call) => {
                let state = &self.state;
                Response::Result(state.executor.execute(&state.registry, call).await)
            }
            Request::ListTools { namespace } => Response::Tools {
                tools: self.state.registry.list_tools(&namespace),
            },
        }
    }

    pub async fn handle_line(&self, line: &str) -> Response {
        match serde_json::from_str::<Request>(line) {
            Ok(request) => self.handle(request).await,
            Err(e) => {
                error!("Malformed request: {e}");
                Response::Error {
                    error: format!("Malformed request: {e}"),
                }
            }
        }
    }

    /// Decode one raw input line and handle it.
    pub async fn handle_bytes(&self, line: &[u8]) -> Response {
        match std::str::from_utf8(line) {
            Ok(line) => self.handle_line(line).await,
            Err(e) => {
                error!("Malformed request: {e}");
                Response::Error {
                    error: format!("Malformed request: {e}"),
                }
            }
        }
    }

    /// Serve requests from `reader` until EOF, writing responses to `writer`.
    ///
    /// Returns once every in-flight call has been answered.
    pub async fn run<R, W>(&self, reader: R, writer: &mut W) -> Result<()>
    where
        R: AsyncBufRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();

        let service = self.clone();
        let reader_task = tokio::spawn(async move {
            // Split on raw bytes: a line that is not UTF-8 is a malformed
            // request, not a read failure.
            let mut lines = reader.split(b'\n');
            let mut served = 0usize;
            while let Some(line) = lines.next_segment().await.context("Failed to read request")? {
                if line.iter().all(u8::is_ascii_whitespace) {
                    continue;
                }
                served += 1;
                let service = service.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    let response = service.handle_bytes(&line).await;
                    match serde_json::to_string(&response) {
                        Ok(out) => {
                            let _ = tx.send(out);
                        }
                        Err(e) => error!("Failed to serialize response: {e}"),
                    }
                });
            }
            debug!("Input closed after {served} requests");
            anyhow::Ok(served)
        });

        while let Some(out) = rx.recv().await {
            writer
                .write_all(out.as_bytes())
                .await
                .context("Failed to write response")?;
            writer.write_all(b"\n").await.context("Failed to write response")?;
            writer.flush().await.context("Failed to flush response")?;
        }

        let served = reader_task.await.context("Reader task failed")??;
        info!("Served {served} requests");
        Ok(())
    }
}
