use std::net::SocketAddr;

use roomchat::{app, db, AppState, Config};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("roomchat=debug,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    let db_pool = db::connect(&config.database_url, 16).await?;
    tracing::info!(database_url = %config.database_url, "connected db");

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app_state = AppState::new(db_pool, config)?;
    let presence = app_state.presence.clone();

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server running on http://localhost:{}/", addr.port());

    axum::serve(listener, app(app_state))
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!(%err, "couldn't listen for shutdown");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    tracing::info!(online = presence.online_count(), "shut down");
    presence.clear();
    Ok(())
}
