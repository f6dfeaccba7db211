// routinesync/src/source/loader.rs
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::errors::{Result, SyncError};
use crate::source::model::RoutineDocument;

/// Reads and parses a routines YAML file.
///
/// A missing file is reported as [`SyncError::NotFound`], anything that is not
/// a well-formed routine document as [`SyncError::Parse`]. An empty file is an
/// empty document.
pub fn load_routine_document(path: &Path) -> Result<RoutineDocument> {
    let content = fs::read_to_string(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => SyncError::NotFound {
            path: path.to_path_buf(),
        },
        _ => SyncError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;

    let document = parse_routine_document(&content).map_err(|source| SyncError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::info!(
        "📄 Loaded YAML file: {} ({} routines, {} workouts)",
        path.display(),
        document.routines.len(),
        document.workout_count()
    );
    Ok(document)
}

fn parse_routine_document(content: &str) -> std::result::Result<RoutineDocument, serde_yaml::Error> {
    if content.trim().is_empty() {
        return Ok(RoutineDocument::default());
    }
    serde_yaml::from_str(content)
}
