use anyhow::{Context, Result};
use std::path::PathBuf;

pub const DB_ENV: &str = "SPENDWISE_DB";
pub const LOG_ENV: &str = "SPENDWISE_LOG";
pub const USER_ENV: &str = "SPENDWISE_USER";

const DEFAULT_LOG_FILTER: &str = "spendwise=warn";

/// Runtime settings, read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: PathBuf,
    pub log_filter: String,
    pub default_user: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let db_path = match lookup(DB_ENV).filter(|v| !v.trim().is_empty()) {
            Some(path) => PathBuf::from(path),
            None => default_db_path()?,
        };

        let log_filter = lookup(LOG_ENV)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        let default_user = match lookup(USER_ENV) {
            Some(raw) => parse_user_id(&raw).with_context(|| format!("Invalid {USER_ENV}"))?,
            None => 1,
        };

        Ok(Self {
            db_path,
            log_filter,
            default_user,
        })
    }

    /// Create the database's parent directory if needed.
    pub fn ensure_data_dir(&self) -> Result<()> {
        if let Some(dir) = self.db_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create data directory: {}", dir.display()))?;
        }
        Ok(())
    }
}

pub fn parse_user_id(raw: &str) -> Result<i64> {
    let id: i64 = raw
        .trim()
        .parse()
        .with_context(|| format!("'{raw}' is not a user ID"))?;
    if id < 1 {
        anyhow::bail!("User ID must be a positive integer, got {id}");
    }
    Ok(id)
}

fn default_db_path() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("com", "spendwise", "Spendwise")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    Ok(proj_dirs.data_dir().join("spendwise.db"))
}
