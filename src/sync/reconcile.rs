// routinesync/src/sync/reconcile.rs
use std::collections::HashMap;
use std::fmt;

use uuid::Uuid;

use crate::errors::Result;
use crate::source::RoutineDefinition;
use crate::store::RoutineGateway;

/// What a run did, or would do in dry-run mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub dry_run: bool,
    pub routines_created: usize,
    pub routines_updated: usize,
    pub workouts_deleted: u64,
    pub workouts_inserted: u64,
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = if self.dry_run { "would be " } else { "" };
        write!(
            f,
            "{} routines {}created, {} {}updated; {} workouts {}deleted, {} {}inserted",
            self.routines_created,
            verb,
            self.routines_updated,
            verb,
            self.workouts_deleted,
            verb,
            self.workouts_inserted,
            verb
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutineAction {
    /// Insert the routine, then insert its workouts under the new id.
    Create,
    /// Update the stored routine in place, then replace its workouts.
    Update(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoutinePlan<'d> {
    pub definition: &'d RoutineDefinition,
    pub action: RoutineAction,
}

/// Matches declared routines to stored ones by name.
///
/// The name index is read once per run and kept current in-process: every
/// routine created during the run is added to it, so a name declared twice in
/// one document resolves to a single row and the last declaration wins.
#[derive(Debug, Default)]
pub struct Reconciler {
    index: HashMap<String, Uuid>,
}

impl Reconciler {
    pub fn new(index: HashMap<String, Uuid>) -> Self {
        Reconciler { index }
    }

    /// Builds the name index from the routines currently stored.
    pub async fn load<G: RoutineGateway>(gateway: &mut G) -> Result<Self> {
        let index = gateway.find_routine_ids_by_name().await?;
        tracing::debug!("Found {} existing routines", index.len());
        Ok(Reconciler::new(index))
    }

    pub fn plan<'d>(&self, definition: &'d RoutineDefinition) -> RoutinePlan<'d> {
        let action = match self.index.get(&definition.name) {
            Some(id) => RoutineAction::Update(*id),
            None => RoutineAction::Create,
        };
        RoutinePlan { definition, action }
    }

    /// Executes one plan. Returns the routine's id.
    pub async fn apply<G: RoutineGateway>(
        &mut self,
        gateway: &mut G,
        plan: RoutinePlan<'_>,
        report: &mut SyncReport,
    ) -> Result<Uuid> {
        let definition = plan.definition;
        let description = definition.description.as_deref();

        let routine_id = match plan.action {
            RoutineAction::Create => {
                let id = gateway
                    .upsert_routine(None, &definition.name, description)
                    .await?;
                self.index.insert(definition.name.clone(), id);
                report.routines_created += 1;
                tracing::info!("✓ Created new routine: {}", definition.name);
                id
            }
            RoutineAction::Update(id) => {
                gateway
                    .upsert_routine(Some(id), &definition.name, description)
                    .await?;
                report.routines_updated += 1;
                tracing::info!("✓ Updated routine: {}", definition.name);
                id
            }
        };

        let replaced = gateway
            .replace_workouts(routine_id, &definition.workouts)
            .await?;
        report.workouts_deleted += replaced.deleted;
        report.workouts_inserted += replaced.inserted;

        tracing::info!(
            "Processed routine '{}' with {} workouts (replaced {})",
            definition.name,
            replaced.inserted,
            replaced.deleted
        );
        Ok(routine_id)
    }

    /// Applies every routine in document order. Stops at the first error.
    pub async fn reconcile<G: RoutineGateway>(
        &mut self,
        gateway: &mut G,
        routines: &[RoutineDefinition],
    ) -> Result<SyncReport> {
        tracing::info!("Processing {} routines...", routines.len());
        let mut report = SyncReport::default();

        for definition in routines {
            let plan = self.plan(definition);
            self.apply(gateway, plan, &mut report).await?;
        }
        Ok(report)
    }

    /// Logs and counts what [`Reconciler::reconcile`] would do, using only
    /// read statements.
    pub async fn preview<G: RoutineGateway>(
        &self,
        gateway: &mut G,
        routines: &[RoutineDefinition],
    ) -> Result<SyncReport> {
        tracing::info!("Previewing {} routines...", routines.len());
        let mut report = SyncReport {
            dry_run: true,
            ..SyncReport::default()
        };
        // Workouts attached to each name after the entries seen so far.
        let mut seen: HashMap<&str, u64> = HashMap::new();

        for definition in routines {
            let attached = match seen.get(definition.name.as_str()) {
                Some(count) => Some(*count),
                None => match self.plan(definition).action {
                    RoutineAction::Update(id) => Some(gateway.count_workouts(id).await?.max(0) as u64),
                    RoutineAction::Create => None,
                },
            };
            let declared = definition.workouts.len() as u64;

            match attached {
                Some(current) => {
                    report.routines_updated += 1;
                    report.workouts_deleted += current;
                    tracing::info!(
                        "Would update routine: {} (replacing {} workouts with {})",
                        definition.name,
                        current,
                        declared
                    );
                }
                None => {
                    report.routines_created += 1;
                    tracing::info!(
                        "Would create routine: {} with {} workouts",
                        definition.name,
                        declared
                    );
                }
            }
            report.workouts_inserted += declared;
            seen.insert(definition.name.as_str(), declared);
        }
        Ok(report)
    }
}
