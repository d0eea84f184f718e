//! Configuration loading for the intake pipeline
//!
//! Resolution priority: environment variable, then TOML config file,
//! then compiled default. The external orchestrator resolves center
//! and processing mode before invoking the core; this module only
//! covers the ambient settings the core itself needs.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the database path
pub const ENV_DATABASE_PATH: &str = "INTAKE_DATABASE_PATH";
/// Environment variable naming the notification subject prefix
pub const ENV_SUBJECT_PREFIX: &str = "INTAKE_SUBJECT_PREFIX";

/// Intake service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeConfig {
    /// Path to the SQLite database backing the reference store
    pub database_path: PathBuf,
    /// Subject prefix for validation error notifications
    #[serde(default = "default_subject_prefix")]
    pub subject_prefix: String,
}

fn default_subject_prefix() -> String {
    "Center Intake Validation Error".to_string()
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("intake.db"),
            subject_prefix: default_subject_prefix(),
        }
    }
}

impl IntakeConfig {
    /// Load configuration from a TOML file, then apply environment
    /// variable overrides. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .map_err(|e| Error::Config(format!("Read config failed: {}", e)))?;
            toml::from_str(&content)
                .map_err(|e| Error::Config(format!("Parse config failed: {}", e)))?
        } else {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            Self::default()
        };

        if let Ok(db_path) = std::env::var(ENV_DATABASE_PATH) {
            config.database_path = PathBuf::from(db_path);
        }
        if let Ok(prefix) = std::env::var(ENV_SUBJECT_PREFIX) {
            config.subject_prefix = prefix;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate resolved settings
    pub fn validate(&self) -> Result<()> {
        if self.database_path.as_os_str().is_empty() {
            return Err(Error::Config("database_path must not be empty".to_string()));
        }
        if self.subject_prefix.trim().is_empty() {
            return Err(Error::Config(
                "subject_prefix must not be blank".to_string(),
            ));
        }
        Ok(())
    }
}
