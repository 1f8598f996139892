use clap::Parser;
use dotenvy::dotenv;
use media_server::config::ServerConfig;
use media_server::{AppState, create_app};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "media-server")]
#[command(version, about = "Upload, list, delete and stream files from one directory", long_about = None)]
struct Cli {
    /// Directory holding the managed files (overrides STORAGE_ROOT)
    #[arg(long, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Listen address (overrides BIND_ADDR)
    #[arg(long, value_name = "ADDR")]
    addr: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    // Initialize tracing with EnvFilter
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "media_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Starting media server...");

    let mut config = ServerConfig::from_env();
    if let Some(root) = cli.root {
        config.storage_root = root;
    }
    if let Some(addr) = cli.addr {
        config.bind_addr = addr;
    }
    config.validate()?;

    tokio::fs::create_dir_all(&config.storage_root).await?;
    info!(
        "📁 Storage root: {} (max upload {} bytes, stream buffer {} bytes)",
        config.storage_root.display(),
        config.max_upload_size,
        config.max_stream_buffer
    );

    let addr = config.bind_addr;
    let app = create_app(AppState::new(config)).layer(
        TraceLayer::new_for_http()
            .make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            })
            .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
                info!("📥 {} {}", request.method(), request.uri());
            })
            .on_response(
                |response: &axum::http::Response<_>,
                 latency: std::time::Duration,
                 _span: &tracing::Span| {
                    info!(
                        "📤 Finished in {:?} with status {}",
                        latency,
                        response.status()
                    );
                },
            ),
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("✅ Server ready at http://{}", addr);
    info!("📖 OpenAPI: http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("🛑 Media server stopped.");
    Ok(())
}

/// Resolves once the process is asked to stop, letting in-flight uploads and
/// streams finish before the listener closes
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Ctrl+C listener unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "SIGTERM listener unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let reason = tokio::select! {
        _ = ctrl_c => "interrupt",
        _ = terminate => "terminate",
    };
    info!(signal = reason, "Stopping media server, draining open transfers");
}
