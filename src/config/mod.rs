// routinesync/src/config/mod.rs
use std::env;
use std::path::PathBuf;

use url::Url;

use crate::errors::{Result, SyncError};

const DEFAULT_DB_HOST: &str = "localhost";
const DEFAULT_DB_PORT: u16 = 5432;
const DEFAULT_DB_USER: &str = "postgres";
const DEFAULT_DB_PASSWORD: &str = "postgres";
const DEFAULT_DB_NAME: &str = "swole_db";

pub const DEFAULT_ROUTINES_FILE: &str = "routines/routines.yaml";

/// Connection parameters for the routines database.
#[derive(Debug, Clone, PartialEq)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    /// Full `DATABASE_URL`; takes precedence over the individual `DB_*` settings.
    pub url_override: Option<String>,
}

/// Everything a single sync run needs.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub db: DbConfig,
    pub routines_file: PathBuf,
    pub dry_run: bool,
}

impl DbConfig {
    /// Reads `DB_HOST`, `DB_PORT`, `DB_USER`, `DB_PASSWORD`, `DB_NAME` and
    /// `DATABASE_URL` from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let port = match lookup("DB_PORT").filter(|v| !v.trim().is_empty()) {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| {
                SyncError::Config(format!("DB_PORT must be a port number, got '{}': {}", raw, e))
            })?,
            None => DEFAULT_DB_PORT,
        };

        Ok(DbConfig {
            host: get("DB_HOST", DEFAULT_DB_HOST),
            port,
            user: get("DB_USER", DEFAULT_DB_USER),
            password: get("DB_PASSWORD", DEFAULT_DB_PASSWORD),
            database: get("DB_NAME", DEFAULT_DB_NAME),
            url_override: lookup("DATABASE_URL").filter(|v| !v.trim().is_empty()),
        })
    }

    /// Builds the postgres connection URL. Credentials are percent-encoded.
    pub fn connection_url(&self) -> Result<String> {
        if let Some(url) = &self.url_override {
            Url::parse(url)
                .map_err(|e| SyncError::Config(format!("Invalid DATABASE_URL format: {}", e)))?;
            return Ok(url.clone());
        }

        let mut url = Url::parse("postgres://localhost")
            .map_err(|e| SyncError::Config(format!("Invalid base URL: {}", e)))?;
        url.set_host(Some(&self.host))
            .map_err(|e| SyncError::Config(format!("Invalid DB_HOST '{}': {}", self.host, e)))?;
        url.set_port(Some(self.port))
            .map_err(|_| SyncError::Config(format!("Cannot set port {} on database URL", self.port)))?;
        url.set_username(&self.user)
            .map_err(|_| SyncError::Config(format!("Cannot set user '{}' on database URL", self.user)))?;
        url.set_password(Some(&self.password))
            .map_err(|_| SyncError::Config("Cannot set password on database URL".to_string()))?;
        url.set_path(&format!("/{}", self.database));
        Ok(url.to_string())
    }

    /// Connection URL with the password masked, for logs and error messages.
    pub fn redacted_url(&self) -> String {
        let raw = match self.connection_url() {
            Ok(url) => url,
            Err(_) => return format!("postgres://{}:{}/{}", self.host, self.port, self.database),
        };
        match Url::parse(&raw) {
            Ok(mut url) => {
                if url.password().is_some() {
                    let _ = url.set_password(Some("****"));
                }
                url.to_string()
            }
            Err(_) => "<invalid database url>".to_string(),
        }
    }
}
