mod cases;
mod clients;
mod error;
mod router;
mod telemetry;
#[cfg(test)]
mod test_support;

use std::net::SocketAddr;

use tracing::{info, warn};

use recovery_storage::Database;
use recovery_util::{load_env_file, AppConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    load_env_file();
    let config = AppConfig::from_env()?;

    telemetry::init_tracing(&config)?;
    let metrics = telemetry::init_metrics()?;

    let database = Database::connect(&config.database_url).await?;
    database.run_migrations().await?;
    info!(stage = "storage", "database connected and migrated");

    let state = router::AppState::new(metrics, database.clone());
    let app = router::app_router(state).layer(router::cors_layer(&config.cors_origins));

    let addr: SocketAddr = config.bind_addr;
    info!(stage = "app", %addr, env = %config.environment.as_str(), "starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    database.close().await;
    info!(stage = "app", "server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(stage = "app", error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!(stage = "app", "shutdown signal received");
}
