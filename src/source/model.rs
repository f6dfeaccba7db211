// routinesync/src/source/model.rs
use serde::{Deserialize, Deserializer, de};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

/// Top-level shape of a routines YAML file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RoutineDocument {
    #[serde(default)]
    pub routines: Vec<RoutineDefinition>,
    /// Day name -> routine names. Parsed and validated, not yet applied.
    #[serde(default)]
    pub default_schedule: Option<BTreeMap<String, Vec<String>>>,
}

/// A declared routine. `name` is the matching key against stored routines.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RoutineDefinition {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub workouts: Vec<WorkoutDefinition>,
}

/// A workout template owned by its routine. Replaced as a set on every sync.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorkoutDefinition {
    pub name: String,
    #[serde(rename = "type", default)]
    pub workout_type: Option<String>,
    pub exercise_type: String,
    #[serde(default, deserialize_with = "number_or_numeric_string")]
    pub default_weight: Option<f64>,
    /// Seconds.
    #[serde(default, deserialize_with = "number_or_numeric_string")]
    pub default_time: Option<i32>,
    #[serde(default, deserialize_with = "number_or_numeric_string")]
    pub reps: Option<i32>,
    #[serde(default, deserialize_with = "number_or_numeric_string")]
    pub sets: Option<i32>,
    #[serde(default)]
    pub description: Option<String>,
}

impl RoutineDocument {
    pub fn workout_count(&self) -> usize {
        self.routines.iter().map(|r| r.workouts.len()).sum()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString<T> {
    Number(T),
    Text(String),
}

/// Accepts `8` as well as `"8"`. A blank string is treated as absent; any
/// other string that does not parse as `T` is an error.
fn number_or_numeric_string<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
{
    match Option::<NumberOrString<T>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrString::Number(value)) => Ok(Some(value)),
        Some(NumberOrString::Text(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed.parse::<T>().map(Some).map_err(|e| {
                de::Error::custom(format!("invalid numeric value '{}': {}", text, e))
            })
        }
    }
}
