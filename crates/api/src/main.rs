use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use shopforge_api::config::ServerConfig;
use shopforge_api::router::build_app_router;
use shopforge_api::state::AppState;
use shopforge_core::editor::EditorSessions;
use shopforge_core::storage::LocalObjectStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "shopforge_api=debug,tower_http=debug".into());
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    if json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = shopforge_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    shopforge_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    shopforge_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Object storage ---
    let store = LocalObjectStore::new(config.storage_root.clone());
    tracing::info!(root = %config.storage_root.display(), "Local object store ready");

    // --- Outbound HTTP ---
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .user_agent(concat!("shopforge/", env!("CARGO_PKG_VERSION")))
        .build()
        .expect("Failed to build HTTP client");

    let configured: Vec<&str> = [
        config.oauth.discord.as_ref().map(|_| "discord"),
        config.oauth.github.as_ref().map(|_| "github"),
    ]
    .into_iter()
    .flatten()
    .collect();
    tracing::info!(providers = ?configured, "OAuth providers configured");

    // --- App state ---
    let state = AppState {
        pool: pool.clone(),
        config: Arc::new(config.clone()),
        store: Arc::new(store),
        editor_sessions: Arc::new(EditorSessions::default()),
        http,
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

    let shutdown_timeout = Duration::from_secs(config.shutdown_timeout_secs);
    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

    // Draining stops once the timeout elapses after the signal.
    tokio::select! {
        result = server => result.expect("Server error"),
        () = async {
            shutdown_signal().await;
            tokio::time::sleep(shutdown_timeout).await;
        } => {
            tracing::warn!(timeout_secs = config.shutdown_timeout_secs, "Shutdown timeout elapsed, dropping open connections");
        }
    }

    pool.close().await;
    tracing::info!("Graceful shutdown complete");
}

/// Resolve on SIGINT (Ctrl-C) or, on Unix, SIGTERM.
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
