//! Call Router Server Entry Point

use std::net::SocketAddr;
use std::time::Duration;

use call_router_config::{load_settings, Settings};
use call_router_server::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env = std::env::var("CALL_ROUTER_ENV").ok();
    let config = load_settings(env.as_deref())?;

    init_tracing(&config);

    tracing::info!("Starting call router v{}", env!("CARGO_PKG_VERSION"));

    let persistence = call_router_persistence::init(
        &config.database,
        Duration::from_secs(config.server.config_cache_ttl_secs),
    )
    .await?;
    tracing::info!("Connected to database");

    let port = config.server.port;
    let state = AppState::build(config, persistence);
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
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
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}

fn init_tracing(config: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("call_router={},tower_http=info", config.server.log_level).into()
    });

    let builder = tracing_subscriber::fmt().with_env_filter(env_filter);
    if config.server.log_json {
        builder.json().init();
    } else {
        builder.init();
    }
}
