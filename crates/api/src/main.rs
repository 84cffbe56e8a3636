use std::net::SocketAddr;
use std::sync::Arc;

use restora_api::background::Restorations;
use restora_api::config::{ServerConfig, DEFAULT_LOG_FILTER};
use restora_api::router::build_app_router;
use restora_api::state::AppState;
use restora_model::{CommandRestorer, Restorer};
use restora_store::ContentStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Content store ---
    let store = Arc::new(
        ContentStore::open(&config.results_dir)
            .await
            .expect("Failed to open results directory"),
    );
    tracing::info!(root = %config.results_dir.display(), "Content store opened");

    // --- Restoration model ---
    let restorer: Arc<dyn Restorer> = Arc::new(CommandRestorer::new(config.restorer.clone()));
    tracing::info!(
        program = %config.restorer.program,
        args = ?config.restorer.args,
        model_path = %config.model.model_path,
        max_concurrent = config.max_concurrent_restores,
        "Restorer configured",
    );

    let restorations = Restorations::new(
        Arc::clone(&store),
        restorer,
        config.model.clone(),
        config.max_concurrent_restores,
    );

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        store,
        restorations: restorations.clone(),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    let pending = restorations.pending();
    if pending > 0 {
        tracing::warn!(pending, "Shutting down with restorations still running");
    }
    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
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
