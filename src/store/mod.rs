// routinesync/src/store/mod.rs
//! Persistence gateway: a [`RoutineStore`] opens one transaction per run and
//! the returned [`RoutineGateway`] executes every statement of that run.

#[cfg(test)]
pub(crate) mod memory;
pub(crate) mod postgres;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::collections::HashMap;
use uuid::Uuid;

use crate::errors::Result;
use crate::source::WorkoutDefinition;

pub use postgres::PgStore;

pub const DEFAULT_USER_EMAIL: &str = "user@example.com";
pub const DEFAULT_USER_NAME: &str = "Default User";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxMode {
    ReadWrite,
    /// Writes are rejected by the store. Used for dry runs.
    ReadOnly,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct StoredRoutine {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

/// Row counts touched by [`RoutineGateway::replace_workouts`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkoutReplacement {
    pub deleted: u64,
    pub inserted: u64,
}

#[async_trait]
pub trait RoutineStore: Send + Sync {
    type Tx: RoutineGateway;

    async fn begin(&self, mode: TxMode) -> Result<Self::Tx>;
}

#[async_trait]
pub trait RoutineGateway: Send {
    async fn list_routines(&mut self) -> Result<Vec<StoredRoutine>>;

    /// Name -> id for every stored routine. When the table holds the same
    /// name more than once, the oldest row wins.
    async fn find_routine_ids_by_name(&mut self) -> Result<HashMap<String, Uuid>> {
        let routines = self.list_routines().await?;
        Ok(index_by_name(routines))
    }

    /// Updates the routine the caller matched by name, or inserts a new one
    /// when `known_id` is `None`. Returns the routine's id.
    async fn upsert_routine(
        &mut self,
        known_id: Option<Uuid>,
        name: &str,
        description: Option<&str>,
    ) -> Result<Uuid>;

    /// Deletes every workout template of `routine_id`, then inserts
    /// `workouts` in order. Rows of other routines are never touched.
    async fn replace_workouts(
        &mut self,
        routine_id: Uuid,
        workouts: &[WorkoutDefinition],
    ) -> Result<WorkoutReplacement>;

    async fn count_workouts(&mut self, routine_id: Uuid) -> Result<i64>;

    async fn count_users(&mut self) -> Result<i64>;

    /// Inserts the default user when the users table is empty. Returns
    /// whether a user was created.
    async fn ensure_default_user(&mut self) -> Result<bool> {
        if self.count_users().await? > 0 {
            return Ok(false);
        }
        self.insert_user(DEFAULT_USER_EMAIL, DEFAULT_USER_NAME).await?;
        tracing::info!("👤 Created default user {}", DEFAULT_USER_EMAIL);
        Ok(true)
    }

    async fn insert_user(&mut self, email: &str, name: &str) -> Result<Uuid>;

    async fn commit(self) -> Result<()>;

    async fn rollback(self) -> Result<()>;
}

fn index_by_name(mut routines: Vec<StoredRoutine>) -> HashMap<String, Uuid> {
    routines.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

    let mut index = HashMap::with_capacity(routines.len());
    for routine in routines {
        if let Some(existing) = index.get(&routine.name) {
            tracing::warn!(
                "⚠️ Routine name '{}' is stored more than once; matching id {} and ignoring {}",
                routine.name,
                existing,
                routine.id
            );
            continue;
        }
        index.insert(routine.name, routine.id);
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn stored(id: u128, name: &str, day: u32) -> StoredRoutine {
        let created = NaiveDate::from_ymd_opt(2024, 1, day)
            .and_then(|d| d.and_hms_opt(0, 0, 0));
        StoredRoutine {
            id: Uuid::from_u128(id),
            name: name.to_string(),
            description: None,
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn test_index_by_name_prefers_oldest_duplicate() {
        let index = index_by_name(vec![
            stored(3, "Legs", 5),
            stored(2, "Legs", 1),
            stored(1, "Arms", 2),
        ]);

        assert_eq!(index.len(), 2);
        assert_eq!(index.get("Legs"), Some(&Uuid::from_u128(2)));
        assert_eq!(index.get("Arms"), Some(&Uuid::from_u128(1)));
    }
}
