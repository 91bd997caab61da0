mod config;
mod handlers;

use crate::config::Config;
use crate::handlers::{router, AppState};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::load_default().unwrap_or_else(|e| {
        eprintln!("Failed to load config: {}, using defaults", e);
        Config::default()
    });

    info!(
        copy_buffer_size = config.respond.copy_buffer_size,
        redirect_body = config.respond.redirect_body,
        pretty_json = config.respond.pretty_json,
        "respond settings"
    );

    let app = router(AppState::new(config.respond));

    let addr = config.server.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server running at http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
