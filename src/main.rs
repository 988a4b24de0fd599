use anyhow::{Context, Result};
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use joycycles::config::Config;
use joycycles::routes::{self, AppState};
use joycycles::store::{KeyValueStore, MemoryStore, PgStore};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("joycycles=info")),
        )
        .init();

    let config = Config::from_env()?;

    let (store, writer) = match &config.database_url {
        Some(database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.max_connections)
                .connect(database_url)
                .await
                .context("failed to connect to DATABASE_URL")?;
            let (store, writer) = PgStore::connect(pool).await?;
            (Box::new(store) as Box<dyn KeyValueStore>, Some(writer))
        }
        None => {
            tracing::warn!("⚠️ DATABASE_URL not set, data lives in memory only");
            (Box::new(MemoryStore::new()) as Box<dyn KeyValueStore>, None)
        }
    };

    let app = routes::router(AppState::new(store, config.default_locale));

    tracing::info!("🧠 Server running at {}", config.bind_addr);
    axum::serve(
        tokio::net::TcpListener::bind(config.bind_addr).await?,
        app.into_make_service(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    // The router and its store are gone now; wait for queued writes.
    if let Some(writer) = writer {
        writer.await.context("store writer panicked")?;
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("❌ Failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("👋 Shutting down");
}
