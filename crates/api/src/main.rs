use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use amobagan_api::auth::JwtAuthenticator;
use amobagan_api::config::ServerConfig;
use amobagan_api::handlers::products::ProductController;
use amobagan_api::state::AppState;
use amobagan_api::{router, ws};
use amobagan_upstream::analysis::AnalysisServiceClient;
use amobagan_upstream::catalog::OpenFoodFactsCatalog;

/// Connect timeout for upstream services.
const UPSTREAM_CONNECT_TIMEOUT_SECS: u64 = 5;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "amobagan_api=debug,amobagan_upstream=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env().context("Failed to load configuration")?;
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Upstream clients ---
    let upstream_timeout = Duration::from_secs(config.upstream.timeout_secs);
    let http = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(UPSTREAM_CONNECT_TIMEOUT_SECS))
        .user_agent(concat!("amobagan-api/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;

    let catalog = OpenFoodFactsCatalog::with_client(
        http.clone(),
        config.upstream.catalog_url.clone(),
    );
    let analyzer = AnalysisServiceClient::with_client(
        http,
        config.upstream.analysis_url.clone(),
        config.upstream.analysis_api_key.clone(),
        upstream_timeout,
    );
    tracing::info!(
        catalog_url = %config.upstream.catalog_url,
        analysis_url = %config.upstream.analysis_url,
        "Upstream clients configured"
    );

    // --- WebSocket manager ---
    let ws_manager = Arc::new(ws::WsManager::new());
    let heartbeat_handle = ws::start_heartbeat(Arc::clone(&ws_manager), ws::HEARTBEAT_INTERVAL);

    // --- App state ---
    let addr = SocketAddr::new(
        config.host.parse().context("Invalid HOST address")?,
        config.port,
    );
    let state = AppState {
        authenticator: Arc::new(JwtAuthenticator::new(config.jwt.clone())),
        products: ProductController::new(Arc::new(catalog), Arc::new(analyzer)),
        ws_manager: Arc::clone(&ws_manager),
        config: Arc::new(config),
    };

    let app = router::build_app_router(state).context("Invalid router configuration")?;

    // --- Start server ---
    tracing::info!(%addr, "Starting server");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    let ws_count = ws_manager.connection_count().await;
    tracing::info!(ws_count, "Closing remaining WebSocket connections");
    ws_manager.shutdown_all().await;

    heartbeat_handle.abort();
    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
