use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("routine file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read routine file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed YAML, or YAML that does not match the routine document shape.
    #[error("failed to parse routine file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),

    /// The database could not be reached. Raised before any transaction is opened.
    #[error("failed to connect to database at {url}: {source}")]
    Connection {
        url: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("statement failed while {context}: {source}")]
    Statement {
        context: String,
        #[source]
        source: sqlx::Error,
    },
}

impl SyncError {
    pub fn statement(context: impl Into<String>, source: sqlx::Error) -> Self {
        SyncError::Statement {
            context: context.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
