// routinesync/src/store/postgres.rs
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

use crate::config::DbConfig;
use crate::errors::{Result, SyncError};
use crate::source::WorkoutDefinition;
use crate::store::{RoutineGateway, RoutineStore, StoredRoutine, TxMode, WorkoutReplacement};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

const WORKOUT_COLUMNS: usize = 9;
/// Rows per multi-row insert, keeping each statement under the 65535
/// bind-parameter limit of the postgres protocol.
const WORKOUT_INSERT_BATCH: usize = 1000;
const _: () = assert!(WORKOUT_COLUMNS * WORKOUT_INSERT_BATCH <= u16::MAX as usize);

/// PostgreSQL-backed routine store. Holds a single-connection pool for the
/// lifetime of one run.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connects to the database described by `config`. Fails with
    /// [`SyncError::Connection`] before any transaction exists.
    pub async fn connect(config: &DbConfig) -> Result<Self> {
        let url = config.connection_url()?;
        let redacted = config.redacted_url();

        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(CONNECT_TIMEOUT)
            .connect(&url)
            .await
            .map_err(|source| SyncError::Connection {
                url: redacted.clone(),
                source,
            })?;

        tracing::info!("🔌 Connected to PostgreSQL database at {}", redacted);
        Ok(PgStore::from_pool(pool))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        PgStore { pool }
    }

    pub async fn close(self) {
        self.pool.close().await;
        tracing::info!("Disconnected from database");
    }
}

#[async_trait]
impl RoutineStore for PgStore {
    type Tx = PgGateway;

    async fn begin(&self, mode: TxMode) -> Result<PgGateway> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| SyncError::statement("opening transaction", e))?;

        if mode == TxMode::ReadOnly {
            sqlx::query("SET TRANSACTION READ ONLY")
                .execute(&mut *tx)
                .await
                .map_err(|e| SyncError::statement("marking transaction read-only", e))?;
        }

        tracing::debug!("Transaction opened ({:?})", mode);
        Ok(PgGateway { tx })
    }
}

/// One multi-row `INSERT` per batch of workouts, in declaration order. No
/// statements for an empty list.
fn workout_insert_batches(
    routine_id: Uuid,
    workouts: &[WorkoutDefinition],
) -> Vec<QueryBuilder<'_, Postgres>> {
    workouts
        .chunks(WORKOUT_INSERT_BATCH)
        .map(|batch| {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO workouts (routine_id, name, type, exercise_type, weight, time, reps, sets, description) ",
            );
            builder.push_values(batch, |mut row, workout| {
                row.push_bind(routine_id)
                    .push_bind(workout.name.as_str())
                    .push_bind(workout.workout_type.as_deref())
                    .push_bind(workout.exercise_type.as_str())
                    .push_bind(workout.default_weight)
                    .push_bind(workout.default_time)
                    .push_bind(workout.reps)
                    .push_bind(workout.sets)
                    .push_bind(workout.description.as_deref());
            });
            builder
        })
        .collect()
}

/// One open transaction. Dropping it without commit rolls back.
pub struct PgGateway {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl RoutineGateway for PgGateway {
    async fn list_routines(&mut self) -> Result<Vec<StoredRoutine>> {
        sqlx::query_as::<_, StoredRoutine>(
            "SELECT id, name, description, created_at, updated_at FROM routines",
        )
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| SyncError::statement("fetching existing routines", e))
    }

    async fn upsert_routine(
        &mut self,
        known_id: Option<Uuid>,
        name: &str,
        description: Option<&str>,
    ) -> Result<Uuid> {
        match known_id {
            Some(id) => {
                let result = sqlx::query(
                    "UPDATE routines SET description = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2",
                )
                .bind(description)
                .bind(id)
                .execute(&mut *self.tx)
                .await
                .map_err(|e| SyncError::statement(format!("updating routine '{}'", name), e))?;

                if result.rows_affected() == 0 {
                    return Err(SyncError::statement(
                        format!("updating routine '{}' (id {})", name, id),
                        sqlx::Error::RowNotFound,
                    ));
                }
                Ok(id)
            }
            None => sqlx::query_scalar::<_, Uuid>(
                "INSERT INTO routines (name, description) VALUES ($1, $2) RETURNING id",
            )
            .bind(name)
            .bind(description)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| SyncError::statement(format!("creating routine '{}'", name), e)),
        }
    }

    async fn replace_workouts(
        &mut self,
        routine_id: Uuid,
        workouts: &[WorkoutDefinition],
    ) -> Result<WorkoutReplacement> {
        let deleted = sqlx::query("DELETE FROM workouts WHERE routine_id = $1")
            .bind(routine_id)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| {
                SyncError::statement(format!("deleting workouts of routine {}", routine_id), e)
            })?
            .rows_affected();
        tracing::debug!("Deleted {} workouts for routine {}", deleted, routine_id);

        let mut inserted = 0;
        for mut builder in workout_insert_batches(routine_id, workouts) {
            inserted += builder
                .build()
                .execute(&mut *self.tx)
                .await
                .map_err(|e| {
                    SyncError::statement(format!("inserting workouts for routine {}", routine_id), e)
                })?
                .rows_affected();
        }

        Ok(WorkoutReplacement { deleted, inserted })
    }

    async fn count_workouts(&mut self, routine_id: Uuid) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM workouts WHERE routine_id = $1")
            .bind(routine_id)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| {
                SyncError::statement(format!("counting workouts of routine {}", routine_id), e)
            })
    }

    async fn count_users(&mut self) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| SyncError::statement("counting users", e))
    }

    async fn insert_user(&mut self, email: &str, name: &str) -> Result<Uuid> {
        sqlx::query_scalar::<_, Uuid>("INSERT INTO users (email, name) VALUES ($1, $2) RETURNING id")
            .bind(email)
            .bind(name)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| SyncError::statement(format!("creating user {}", email), e))
    }

    async fn commit(self) -> Result<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| SyncError::statement("committing transaction", e))
    }

    async fn rollback(self) -> Result<()> {
        self.tx
            .rollback()
            .await
            .map_err(|e| SyncError::statement("rolling back transaction", e))
    }
}
