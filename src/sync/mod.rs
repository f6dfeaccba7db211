// routinesync/src/sync/mod.rs
pub(crate) mod logic;
pub(crate) mod reconcile;

use crate::config::SyncConfig;
use crate::errors::Result;
use crate::source::{load_routine_document, validate_document};
use crate::store::PgStore;

pub use reconcile::SyncReport;

/// Public entry point for a sync run: connect, load the routine file,
/// reconcile it in one transaction, disconnect.
///
/// The connection is closed on every exit path, including failures.
pub async fn run_sync_flow(config: &SyncConfig) -> Result<SyncReport> {
    let store = PgStore::connect(&config.db).await?;
    let result = sync_with_store(&store, config).await;
    store.close().await;
    result
}

async fn sync_with_store(store: &PgStore, config: &SyncConfig) -> Result<SyncReport> {
    let document = load_routine_document(&config.routines_file)?;
    for warning in validate_document(&document) {
        tracing::warn!("⚠️ {}", warning);
    }

    let report = logic::perform_sync_orchestration(store, &document, config.dry_run).await?;
    tracing::info!("{}", report);
    Ok(report)
}
