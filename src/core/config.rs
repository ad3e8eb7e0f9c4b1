use crate::utils::dirs;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use strum::{Display, EnumString};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://SEC.sqlite";
pub const DEFAULT_BATCH_SIZE: usize = 10_000;

/// What to do when a quarter directory lacks one of the four source files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum MissingQuarterPolicy {
    /// Log a warning, leave the quarter out and keep going.
    #[default]
    Skip,
    /// Fail the whole run with `LoadError::NotFound`.
    Abort,
}

#[derive(Clone, Debug)]
pub struct LoaderConfig {
    pub database_url: String,
    pub data_dir: PathBuf,
    pub batch_size: usize,
    pub on_missing: MissingQuarterPolicy,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            data_dir: PathBuf::from(dirs::FSDS_DATA_DIR),
            batch_size: DEFAULT_BATCH_SIZE,
            on_missing: MissingQuarterPolicy::default(),
        }
    }
}

impl LoaderConfig {
    pub fn from_env() -> Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

        let data_dir = PathBuf::from(
            std::env::var("FSDS_DATA_DIR").unwrap_or_else(|_| dirs::FSDS_DATA_DIR.to_string()),
        );

        let batch_size = match std::env::var("FSDS_BATCH_SIZE") {
            Ok(value) => value
                .parse::<usize>()
                .map_err(|e| anyhow!("FSDS_BATCH_SIZE must be a positive integer: {}", e))?,
            Err(_) => DEFAULT_BATCH_SIZE,
        };

        let on_missing = match std::env::var("FSDS_ON_MISSING") {
            Ok(value) => value
                .parse::<MissingQuarterPolicy>()
                .map_err(|_| anyhow!("FSDS_ON_MISSING must be 'skip' or 'abort', got '{}'", value))?,
            Err(_) => MissingQuarterPolicy::default(),
        };

        let config = Self {
            database_url,
            data_dir,
            batch_size,
            on_missing,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(anyhow!("batch size must be greater than zero"));
        }
        if self.database_url.trim().is_empty() {
            return Err(anyhow!("database URL cannot be empty"));
        }
        Ok(())
    }
}
