// routinesync/src/source/mod.rs
pub(crate) mod loader;
pub(crate) mod model;
pub(crate) mod validation;

pub use loader::load_routine_document;
pub use model::{RoutineDefinition, RoutineDocument, WorkoutDefinition};
pub use validation::validate_document;
