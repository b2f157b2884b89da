//! Scan configuration, stored as JSON in the user's config directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::scan::SearchQuery;
use crate::{Error, Result};

const APP_DIR: &str = "parcelledger";

/// Where the config file lives by default.
#[must_use]
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("config.json")
}

/// Where the package database lives by default.
#[must_use]
pub fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("packages.db")
}

/// Settings for a scan run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Accounts to scan, in order.
    pub accounts: Vec<String>,
    /// Search window in days.
    pub days_back: u32,
    /// Message cap per account.
    pub max_results: u32,
    /// `SQLite` database file.
    pub database_path: PathBuf,
}

impl Default for ScanConfig {
    fn default() -> Self {
        let query = SearchQuery::default();
        Self {
            accounts: Vec::new(),
            days_back: query.days_back,
            max_results: query.max_results,
            database_path: default_database_path(),
        }
    }
}

impl ScanConfig {
    /// Load from the default path, or defaults if there is no file yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load() -> Result<Self> {
        Self::load_from(&default_config_path()).await
    }

    /// Load from `path`, or defaults if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON, or
    /// holds values [`validate`](Self::validate) rejects.
    pub async fn load_from(path: &Path) -> Result<Self> {
        if !tokio::fs::try_exists(path).await? {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = tokio::fs::read_to_string(path).await?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Write to `path` as pretty JSON, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, serde_json::to_string_pretty(self)?).await?;
        tracing::info!("Config saved to {}", path.display());
        Ok(())
    }

    /// Reject a zero search window or message cap.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the bad field.
    pub fn validate(&self) -> Result<()> {
        if self.days_back == 0 {
            return Err(Error::Config("days_back must be at least 1".into()));
        }
        if self.max_results == 0 {
            return Err(Error::Config("max_results must be at least 1".into()));
        }
        Ok(())
    }

    /// Search parameters for the message source.
    #[must_use]
    pub const fn query(&self) -> SearchQuery {
        SearchQuery {
            days_back: self.days_back,
            max_results: self.max_results,
        }
    }
}
