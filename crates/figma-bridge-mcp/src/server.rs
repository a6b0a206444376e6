//! MCP server over stdio.
//!
//! Messages are newline-delimited JSON-RPC 2.0. Each request runs on its own
//! task so a slow plugin command never blocks other calls; a single writer
//! task owns the output stream.

use crate::handlers::handle_line;
use crate::tools::Catalog;
use figma_bridge_core::{Bridge, FigmaApiClient};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Application state shared across requests.
pub struct AppState {
    /// Plugin connection and command correlation
    pub bridge: Bridge,
    /// Figma REST client, present when a token is configured
    pub comments: Option<FigmaApiClient>,
    pub catalog: Catalog,
}

impl AppState {
    pub fn new(bridge: Bridge, comments: Option<FigmaApiClient>) -> Self {
        Self {
            bridge,
            comments,
            catalog: Catalog::new(),
        }
    }
}

/// Serve requests from `reader` until it reaches end of input.
///
/// Responses still in flight at EOF are written as they complete.
pub async fn serve<R, W>(reader: R, writer: W, state: Arc<AppState>) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel::<String>();
    tokio::spawn(write_responses(writer, rx));

    info!("MCP server ready on stdio ({} tools)", state.catalog.len());

    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let state = state.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let Some(response) = handle_line(&state, &line).await else {
                return;
            };
            match serde_json::to_string(&response) {
                Ok(text) => {
                    let _ = tx.send(text);
                }
                Err(e) => error!("Failed to serialize response: {}", e),
            }
        });
    }

    info!("Input closed");
    Ok(())
}

async fn write_responses<W>(mut writer: W, mut rx: mpsc::UnboundedReceiver<String>)
where
    W: AsyncWrite + Unpin,
{
    while let Some(mut text) = rx.recv().await {
        debug!("-> {}", text);
        text.push('\n');
        if let Err(e) = writer.write_all(text.as_bytes()).await {
            error!("Failed to write response: {}", e);
            break;
        }
        if let Err(e) = writer.flush().await {
            error!("Failed to flush output: {}", e);
            break;
        }
    }
}
