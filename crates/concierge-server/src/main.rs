//! concierge-server - Travel Concierge backend server
//!
//! REST API for login, chat turns, memory and profile editing, and the
//! admin log views. Serves the landing redirect at `/`.

use anyhow::Context;
use concierge_core::Config;
use tokio::net::TcpListener;
use tracing::{info, warn};

mod logging;
mod middleware;
mod routes;
mod state;

use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::load()?;
    config.ensure_dirs()?;

    let _guard = logging::init(&config.paths.log_dir)?;
    info!("concierge-server v{}", env!("CARGO_PKG_VERSION"));
    info!("State directory: {}", config.state_dir().display());

    let users = config.user_directory();
    if users.ensure_default_user()? {
        warn!("Change the default admin password before exposing this server");
    }

    let bind = config.server.bind.clone();
    let state = AppState::new(config);
    let app = routes::create_router(state);

    let listener = TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    info!("Listening on http://{}", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down...");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
