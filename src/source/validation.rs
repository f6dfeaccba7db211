// routinesync/src/source/validation.rs
//! Non-fatal checks on a parsed routine document. Findings are logged as
//! warnings; they never stop a sync.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::source::model::{RoutineDocument, WorkoutDefinition};

pub const KNOWN_EXERCISE_TYPES: &[&str] = &["lift", "timed", "class", "activity"];
pub const KNOWN_WORKOUT_TYPES: &[&str] = &["lower_body", "upper_body", "abs"];
pub const WEEKDAYS: &[&str] = &[
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
];

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationWarning {
    DuplicateRoutine { name: String, occurrences: usize },
    BlankRoutineName { index: usize },
    BlankWorkoutName { routine: String, index: usize },
    UnknownExerciseType { routine: String, workout: String, value: String },
    UnknownWorkoutType { routine: String, workout: String, value: String },
    NegativeValue { routine: String, workout: String, field: &'static str },
    UnknownScheduleDay { day: String },
    UnknownScheduledRoutine { day: String, routine: String },
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationWarning::DuplicateRoutine { name, occurrences } => write!(
                f,
                "routine '{}' is declared {} times; the last declaration wins",
                name, occurrences
            ),
            ValidationWarning::BlankRoutineName { index } => {
                write!(f, "routine #{} has a blank name", index + 1)
            }
            ValidationWarning::BlankWorkoutName { routine, index } => {
                write!(f, "workout #{} in routine '{}' has a blank name", index + 1, routine)
            }
            ValidationWarning::UnknownExerciseType { routine, workout, value } => write!(
                f,
                "workout '{}' in routine '{}' has unknown exercise_type '{}' (expected one of {})",
                workout,
                routine,
                value,
                KNOWN_EXERCISE_TYPES.join(", ")
            ),
            ValidationWarning::UnknownWorkoutType { routine, workout, value } => write!(
                f,
                "workout '{}' in routine '{}' has unknown type '{}' (expected one of {})",
                workout,
                routine,
                value,
                KNOWN_WORKOUT_TYPES.join(", ")
            ),
            ValidationWarning::NegativeValue { routine, workout, field } => write!(
                f,
                "workout '{}' in routine '{}' has a negative {}",
                workout, routine, field
            ),
            ValidationWarning::UnknownScheduleDay { day } => {
                write!(f, "default_schedule has unknown day '{}'", day)
            }
            ValidationWarning::UnknownScheduledRoutine { day, routine } => write!(
                f,
                "default_schedule for '{}' references undeclared routine '{}'",
                day, routine
            ),
        }
    }
}

/// Collects every warning for `document`, in document order.
pub fn validate_document(document: &RoutineDocument) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let mut reported_duplicates = HashSet::new();

    let mut name_counts: HashMap<&str, usize> = HashMap::new();
    for routine in &document.routines {
        *name_counts.entry(routine.name.as_str()).or_default() += 1;
    }

    for (index, routine) in document.routines.iter().enumerate() {
        if routine.name.trim().is_empty() {
            warnings.push(ValidationWarning::BlankRoutineName { index });
        }

        let occurrences = name_counts
            .get(routine.name.as_str())
            .copied()
            .unwrap_or_default();
        if occurrences > 1 && reported_duplicates.insert(routine.name.as_str()) {
            warnings.push(ValidationWarning::DuplicateRoutine {
                name: routine.name.clone(),
                occurrences,
            });
        }

        for (workout_index, workout) in routine.workouts.iter().enumerate() {
            validate_workout(&routine.name, workout_index, workout, &mut warnings);
        }
    }

    if let Some(schedule) = &document.default_schedule {
        let declared: HashSet<&str> = document.routines.iter().map(|r| r.name.as_str()).collect();
        for (day, routines) in schedule {
            if !WEEKDAYS.contains(&day.to_lowercase().as_str()) {
                warnings.push(ValidationWarning::UnknownScheduleDay { day: day.clone() });
            }
            for name in routines {
                if !declared.contains(name.as_str()) {
                    warnings.push(ValidationWarning::UnknownScheduledRoutine {
                        day: day.clone(),
                        routine: name.clone(),
                    });
                }
            }
        }
    }

    warnings
}

fn validate_workout(
    routine: &str,
    index: usize,
    workout: &WorkoutDefinition,
    warnings: &mut Vec<ValidationWarning>,
) {
    if workout.name.trim().is_empty() {
        warnings.push(ValidationWarning::BlankWorkoutName {
            routine: routine.to_string(),
            index,
        });
    }

    if !KNOWN_EXERCISE_TYPES.contains(&workout.exercise_type.as_str()) {
        warnings.push(ValidationWarning::UnknownExerciseType {
            routine: routine.to_string(),
            workout: workout.name.clone(),
            value: workout.exercise_type.clone(),
        });
    }

    if let Some(value) = &workout.workout_type {
        if !KNOWN_WORKOUT_TYPES.contains(&value.as_str()) {
            warnings.push(ValidationWarning::UnknownWorkoutType {
                routine: routine.to_string(),
                workout: workout.name.clone(),
                value: value.clone(),
            });
        }
    }

    let negatives = [
        ("default_weight", workout.default_weight.is_some_and(|v| v < 0.0)),
        ("default_time", workout.default_time.is_some_and(|v| v < 0)),
        ("reps", workout.reps.is_some_and(|v| v < 0)),
        ("sets", workout.sets.is_some_and(|v| v < 0)),
    ];
    for (field, negative) in negatives {
        if negative {
            warnings.push(ValidationWarning::NegativeValue {
                routine: routine.to_string(),
                workout: workout.name.clone(),
                field,
            });
        }
    }
}
