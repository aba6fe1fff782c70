mod app;
mod config;
mod demo;
mod error;
mod handlers;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use listenfd::ListenFd;
use tokio::{net::TcpListener, signal};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use universify_ssr::{load_shell, ApiManifest, HttpApi, SsrScope};
use url::Url;

use crate::{app::create_app, config::Config, demo::DemoRenderer};

/// Shell used when `UNIVERSIFY_SHELL` is not set.
const DEFAULT_SHELL: &str = include_str!("../index.html");

/// Universify - Streaming universal rendering server
#[derive(Parser, Debug)]
#[command(name = "universify")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Host address to bind the server to
    #[arg(long, short = 'H', default_value = "0.0.0.0", env = "HOST")]
    host: String,

    /// Port to listen on
    #[arg(long, short, default_value = "3000", env = "PORT")]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "universify=debug,universify_ssr=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    tracing::debug!(?config, "Loaded configuration");

    // Auto-reload support via listenfd
    let mut listenfd = ListenFd::from_env();
    let listener = match listenfd.take_tcp_listener(0)? {
        // If we are given a tcp listener on listen fd 0, use that one
        Some(listener) => {
            listener.set_nonblocking(true)?;
            TcpListener::from_std(listener)?
        }
        // Otherwise fall back to CLI-specified host:port
        None => {
            let addr = format!("{}:{}", cli.host, cli.port);
            TcpListener::bind(&addr).await?
        }
    };
    let local_addr = listener.local_addr()?;

    let scope = init_scope(&config, &format!("http://{local_addr}")).await?;
    let app = create_app(Arc::new(scope), config.request_timeout());

    tracing::info!("listening on {}", local_addr);

    // Run the server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Compile the shell and build the rendering scope.
///
/// A malformed shell fails here, before the server accepts connections.
async fn init_scope(config: &Config, base_url: &str) -> Result<SsrScope> {
    let shell = match &config.shell_path {
        Some(path) => load_shell(path).await?,
        None => DEFAULT_SHELL.to_string(),
    };

    let manifest = ApiManifest::new().operation("getPost", "GET /posts/:id");
    let api = HttpApi::new(Url::parse(base_url)?, manifest.clone(), "/api");

    let scope = SsrScope::new(
        &shell,
        demo::routes()?,
        Arc::new(DemoRenderer),
        config.ssr_config()?,
    )?
    .with_global(serde_json::json!({ "appName": "Universify" }))
    .with_api(Arc::new(api))
    .with_api_manifest(manifest);

    Ok(scope)
}

/// Wait for shutdown signals (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
    }
}
