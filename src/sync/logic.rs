// routinesync/src/sync/logic.rs
use std::collections::BTreeMap;

use crate::errors::Result;
use crate::source::RoutineDocument;
use crate::store::{RoutineGateway, RoutineStore, TxMode};
use crate::sync::reconcile::{Reconciler, SyncReport};

/// Runs one sync of `document` inside a single transaction.
///
/// 1. Opens the transaction (read-only for dry runs).
/// 2. Ensures a default user exists (skipped for dry runs).
/// 3. Reconciles every routine, or previews them for dry runs.
/// 4. Reports on `default_schedule`, which is not applied.
/// 5. Commits, or rolls back for dry runs.
///
/// The first error rolls the whole batch back and is returned unchanged.
pub async fn perform_sync_orchestration<S: RoutineStore>(
    store: &S,
    document: &RoutineDocument,
    dry_run: bool,
) -> Result<SyncReport> {
    if dry_run {
        tracing::info!("🔍 DRY RUN MODE - No changes will be made to database");
    }

    let mode = if dry_run {
        TxMode::ReadOnly
    } else {
        TxMode::ReadWrite
    };
    let mut tx = store.begin(mode).await?;

    match sync_in_transaction(&mut tx, document, dry_run).await {
        Ok(report) => {
            if dry_run {
                tx.rollback().await?;
                tracing::info!("Dry run completed - no changes made");
            } else {
                tx.commit().await?;
                tracing::info!("✅ All routines updated successfully!");
            }
            Ok(report)
        }
        Err(err) => {
            match tx.rollback().await {
                Ok(()) => tracing::error!("Transaction rolled back due to error: {}", err),
                Err(rollback_err) => tracing::error!(
                    "⚠️ Rollback failed ({}) after error: {}",
                    rollback_err,
                    err
                ),
            }
            Err(err)
        }
    }
}

async fn sync_in_transaction<G: RoutineGateway>(
    gateway: &mut G,
    document: &RoutineDocument,
    dry_run: bool,
) -> Result<SyncReport> {
    if !dry_run {
        gateway.ensure_default_user().await?;
    }

    let mut reconciler = Reconciler::load(gateway).await?;
    let report = if dry_run {
        reconciler.preview(gateway, &document.routines).await?
    } else {
        reconciler.reconcile(gateway, &document.routines).await?
    };

    if let Some(schedule) = &document.default_schedule {
        report_default_schedule(schedule, dry_run);
    }
    Ok(report)
}

// Schedules are parsed and validated only; nothing is written for them.
fn report_default_schedule(schedule: &BTreeMap<String, Vec<String>>, dry_run: bool) {
    let entries: usize = schedule.values().map(Vec::len).sum();
    if dry_run {
        tracing::info!(
            "Would update default schedule ({} days, {} entries)",
            schedule.len(),
            entries
        );
    } else {
        tracing::info!(
            "Default schedule declared ({} days, {} entries); applying schedules is not supported, skipping",
            schedule.len(),
            entries
        );
    }
}
