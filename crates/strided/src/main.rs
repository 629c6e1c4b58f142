//! Stride daemon - progression and ranking engine service.
//!
//! Turns completion events into durable points/level/streak state, badge
//! awards and a global ranking, served over a unix socket.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use strided::config::DaemonConfig;
use strided::rpc_server::{start_server, DaemonState};
use stride_core::ranking::RankingView;
use stride_core::store::{MemoryStore, ProgressStore};
use stride_core::store_sqlite::SqliteStore;
use stride_core::{BadgeCatalog, ProgressionLedger};
use tracing::{info, warn, Level};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("Stride daemon v{} starting", env!("CARGO_PKG_VERSION"));

    let config = DaemonConfig::load();

    let store: Arc<dyn ProgressStore> = match config.store_backend.as_str() {
        "memory" => {
            warn!("Using in-memory store; progression will not survive restarts");
            Arc::new(MemoryStore::new())
        }
        "sqlite" => {
            let path = config.database_path()?;
            Arc::new(SqliteStore::open(&path).await?)
        }
        other => {
            anyhow::bail!("unknown store backend in config: {other}");
        }
    };

    let catalog = BadgeCatalog::default_catalog();
    info!("Badge catalog loaded: {} badges", catalog.len());

    let ledger = ProgressionLedger::with_config(
        Arc::clone(&store),
        catalog,
        config.ledger_config(),
    );
    let ranking = RankingView::with_max_age(
        Arc::clone(&store),
        Duration::from_secs(config.ranking_max_age_secs),
    );

    let state = Arc::new(DaemonState {
        version: env!("CARGO_PKG_VERSION").to_string(),
        start_time: std::time::Instant::now(),
        store_backend: config.store_backend.clone(),
        store,
        ledger,
        ranking,
    });

    info!(
        "Tracking {} accounts",
        state.store.account_count().await.unwrap_or(0)
    );

    tokio::select! {
        result = start_server(Arc::clone(&state), &config.socket_path) => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down gracefully");
        }
    }

    Ok(())
}
