//! Figma MCP Bridge - MCP stdio server for the Figma plugin.
//!
//! Tool calls arrive as JSON-RPC on stdin. Each one is validated and
//! forwarded to the Claude Bridge plugin over a local WebSocket, and the
//! plugin's reply is written back on stdout. Logs go to stderr.

mod handlers;
mod server;
mod tools;
mod wrapper;

use anyhow::Result;
use clap::Parser;
use figma_bridge_core::{platform, Bridge, BridgeConfig, BridgeEvent, EngineConfig, FigmaApiClient};
use serde_json::Value;
use server::AppState;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

#[derive(Parser, Debug)]
#[command(name = "figma-bridge-mcp")]
#[command(about = "MCP server bridging tool calls to the Figma plugin")]
struct Args {
    /// Preferred WebSocket port for the plugin (the next free port is used if taken)
    #[arg(short, long, env = "FIGMA_BRIDGE_PORT", default_value_t = BridgeConfig::DEFAULT_PORT)]
    port: u16,

    /// Host to bind the plugin socket to
    #[arg(long, default_value = BridgeConfig::DEFAULT_HOST)]
    host: String,

    /// Figma personal access token for the comment tools
    #[arg(long, env = "FIGMA_PAT", hide_env_values = true)]
    figma_pat: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Do not terminate stale processes holding the preferred port
    #[arg(long)]
    skip_port_cleanup: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // stdout carries the protocol; logs must stay on stderr.
    let default_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(run(args));
    // A stdin read may still be parked on a blocking thread.
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    result
}

async fn run(args: Args) -> Result<()> {
    info!(
        "Starting {} v{}",
        BridgeConfig::SERVER_NAME,
        BridgeConfig::SERVER_VERSION
    );

    let comments = match args.figma_pat.as_deref().filter(|token| !token.is_empty()) {
        Some(token) => Some(FigmaApiClient::new(token)?),
        None => {
            info!("FIGMA_PAT not set; comment tools are disabled");
            None
        }
    };

    let state = Arc::new(AppState::new(Bridge::new(EngineConfig::default()), comments));
    if let Some(events) = state.bridge.take_events() {
        tokio::spawn(log_events(events));
    }

    // The MCP channel comes up before the plugin socket so the client never
    // waits on port cleanup.
    let mut served = tokio::spawn(server::serve(
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
        state.clone(),
    ));

    if !args.skip_port_cleanup {
        let released = platform::release_port(args.port).await;
        if released > 0 {
            info!("Terminated {} stale process(es) on port {}", released, args.port);
        }
    }

    match state.bridge.start(&args.host, args.port).await {
        Ok(port) => info!("Waiting for the Figma plugin on ws://{}:{}", args.host, port),
        Err(e) => error!("Plugin socket unavailable, tools will report not connected: {}", e),
    }

    tokio::select! {
        result = &mut served => match result {
            Ok(Ok(())) => info!("MCP client disconnected"),
            Ok(Err(e)) => error!("MCP server error: {}", e),
            Err(e) => error!("MCP server task failed: {}", e),
        },
        _ = shutdown_signal() => info!("Shutdown signal received"),
    }

    state.bridge.stop().await;
    info!("Bridge stopped, exiting");
    Ok(())
}

/// Log plugin lifecycle events until the bridge shuts down.
async fn log_events(mut events: mpsc::Receiver<BridgeEvent>) {
    while let Some(event) = events.recv().await {
        match &event {
            BridgeEvent::Error { .. } => warn!("{}", describe_event(&event)),
            _ => info!("{}", describe_event(&event)),
        }
    }
}

fn describe_event(event: &BridgeEvent) -> String {
    match event {
        BridgeEvent::Connected { document } => {
            let file = document
                .get("fileName")
                .and_then(Value::as_str)
                .unwrap_or("untitled");
            format!("Figma connected: {}", file)
        }
        BridgeEvent::Disconnected => "Figma disconnected".to_string(),
        BridgeEvent::Error { message } => format!("Figma connection error: {}", message),
    }
}

/// Resolve on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
