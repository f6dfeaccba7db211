// routinesync/src/store/memory.rs
//! In-process routine store for tests. Each transaction works on a copy of
//! the shared state; commit publishes the copy, rollback drops it.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use uuid::Uuid;

use crate::errors::{Result, SyncError};
use crate::source::WorkoutDefinition;
use crate::store::{RoutineGateway, RoutineStore, StoredRoutine, TxMode, WorkoutReplacement};

#[derive(Debug, Clone, PartialEq)]
pub struct StoredWorkout {
    pub id: Uuid,
    pub routine_id: Uuid,
    pub name: String,
    pub workout_type: Option<String>,
    pub exercise_type: String,
    pub weight: Option<f64>,
    pub time: Option<i32>,
    pub reps: Option<i32>,
    pub sets: Option<i32>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryState {
    pub routines: Vec<StoredRoutine>,
    pub workouts: Vec<StoredWorkout>,
    pub users: Vec<StoredUser>,
}

impl MemoryState {
    pub fn routine_named(&self, name: &str) -> Option<&StoredRoutine> {
        self.routines.iter().find(|r| r.name == name)
    }

    pub fn workouts_of(&self, routine_id: Uuid) -> Vec<&StoredWorkout> {
        self.workouts
            .iter()
            .filter(|w| w.routine_id == routine_id)
            .collect()
    }

    /// Routine and workout contents without generated ids or timestamps.
    pub fn content(&self) -> Vec<(String, Option<String>, Vec<String>)> {
        let mut content: Vec<_> = self
            .routines
            .iter()
            .map(|r| {
                let workouts = self
                    .workouts_of(r.id)
                    .into_iter()
                    .map(|w| format!("{}:{}:{:?}:{:?}", w.name, w.exercise_type, w.sets, w.reps))
                    .collect();
                (r.name.clone(), r.description.clone(), workouts)
            })
            .collect();
        content.sort();
        content
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    fail_on_routine: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: MemoryState) -> Self {
        MemoryStore {
            state: Arc::new(Mutex::new(state)),
            fail_on_routine: None,
        }
    }

    /// Makes any write touching the routine called `name` fail.
    pub fn failing_on(mut self, name: &str) -> Self {
        self.fail_on_routine = Some(name.to_string());
        self
    }

    pub fn snapshot(&self) -> MemoryState {
        lock(&self.state).clone()
    }
}

#[async_trait]
impl RoutineStore for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self, mode: TxMode) -> Result<MemoryTx> {
        Ok(MemoryTx {
            working: self.snapshot(),
            shared: Arc::clone(&self.state),
            mode,
            fail_on_routine: self.fail_on_routine.clone(),
        })
    }
}

pub struct MemoryTx {
    shared: Arc<Mutex<MemoryState>>,
    working: MemoryState,
    mode: TxMode,
    fail_on_routine: Option<String>,
}

impl MemoryTx {
    fn check_writable(&self, context: &str) -> Result<()> {
        if self.mode == TxMode::ReadOnly {
            return Err(SyncError::statement(
                context,
                sqlx::Error::Protocol("cannot execute statement in a read-only transaction".into()),
            ));
        }
        Ok(())
    }

    fn check_injected_failure(&self, name: &str, context: &str) -> Result<()> {
        if self.fail_on_routine.as_deref() == Some(name) {
            return Err(SyncError::statement(
                context,
                sqlx::Error::Protocol(format!("injected failure for routine '{}'", name)),
            ));
        }
        Ok(())
    }

    fn routine_name(&self, routine_id: Uuid) -> Option<String> {
        self.working
            .routines
            .iter()
            .find(|r| r.id == routine_id)
            .map(|r| r.name.clone())
    }
}

#[async_trait]
impl RoutineGateway for MemoryTx {
    async fn list_routines(&mut self) -> Result<Vec<StoredRoutine>> {
        Ok(self.working.routines.clone())
    }

    async fn upsert_routine(
        &mut self,
        known_id: Option<Uuid>,
        name: &str,
        description: Option<&str>,
    ) -> Result<Uuid> {
        let context = format!("upserting routine '{}'", name);
        self.check_writable(&context)?;
        self.check_injected_failure(name, &context)?;

        let now = now();
        match known_id {
            Some(id) => {
                let routine = self
                    .working
                    .routines
                    .iter_mut()
                    .find(|r| r.id == id)
                    .ok_or_else(|| SyncError::statement(context, sqlx::Error::RowNotFound))?;
                routine.description = description.map(str::to_string);
                routine.updated_at = Some(now);
                Ok(id)
            }
            None => {
                let id = Uuid::new_v4();
                self.working.routines.push(StoredRoutine {
                    id,
                    name: name.to_string(),
                    description: description.map(str::to_string),
                    created_at: Some(now),
                    updated_at: Some(now),
                });
                Ok(id)
            }
        }
    }

    async fn replace_workouts(
        &mut self,
        routine_id: Uuid,
        workouts: &[WorkoutDefinition],
    ) -> Result<WorkoutReplacement> {
        let context = format!("replacing workouts of routine {}", routine_id);
        self.check_writable(&context)?;
        if let Some(name) = self.routine_name(routine_id) {
            self.check_injected_failure(&name, &context)?;
        }

        let before = self.working.workouts.len();
        self.working.workouts.retain(|w| w.routine_id != routine_id);
        let deleted = (before - self.working.workouts.len()) as u64;

        for workout in workouts {
            self.working.workouts.push(StoredWorkout {
                id: Uuid::new_v4(),
                routine_id,
                name: workout.name.clone(),
                workout_type: workout.workout_type.clone(),
                exercise_type: workout.exercise_type.clone(),
                weight: workout.default_weight,
                time: workout.default_time,
                reps: workout.reps,
                sets: workout.sets,
                description: workout.description.clone(),
            });
        }

        Ok(WorkoutReplacement {
            deleted,
            inserted: workouts.len() as u64,
        })
    }

    async fn count_workouts(&mut self, routine_id: Uuid) -> Result<i64> {
        Ok(self.working.workouts_of(routine_id).len() as i64)
    }

    async fn count_users(&mut self) -> Result<i64> {
        Ok(self.working.users.len() as i64)
    }

    async fn insert_user(&mut self, email: &str, name: &str) -> Result<Uuid> {
        self.check_writable(&format!("creating user {}", email))?;
        let id = Uuid::new_v4();
        self.working.users.push(StoredUser {
            id,
            email: email.to_string(),
            name: name.to_string(),
        });
        Ok(id)
    }

    async fn commit(self) -> Result<()> {
        *lock(&self.shared) = self.working;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        Ok(())
    }
}

fn lock(state: &Mutex<MemoryState>) -> MutexGuard<'_, MemoryState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}
