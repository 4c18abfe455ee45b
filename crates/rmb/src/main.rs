use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;

use rmb_core::{config::Config, store::SqliteStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rmb_core::logging::init("rmb")?;

    let cfg = Arc::new(Config::load()?);
    let store = SqliteStore::open(&cfg.database_path, cfg.database_pool_size)
        .with_context(|| format!("opening database {}", cfg.database_path.display()))?;

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("shutdown requested");
                shutdown.cancel();
            }
            Err(e) => tracing::error!(error = %e, "failed to listen for ctrl-c"),
        }
    });

    rmb_telegram::polling::run_polling(cfg, Arc::new(store), cancel).await;
    Ok(())
}
