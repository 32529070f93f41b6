//! # Bulk Run Configuration
//!
//! Batch size and inter-batch delay for bulk runs. Values come from, in
//! increasing precedence: built-in defaults, an optional configuration file
//! (TOML, YAML or JSON, picked by extension) and `BULKOPS_*` environment
//! variables.
//!
//! ```rust,no_run
//! use bulkops_core::config::BatchConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = BatchConfig::load("config/bulkops.toml")?;
//! println!("batch_size={} delay_ms={}", config.batch_size, config.delay_ms);
//! # Ok(())
//! # }
//! ```

use crate::constants::{env, DEFAULT_BATCH_SIZE, DEFAULT_DELAY_MS};
use crate::error::{BulkError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Maximum number of items dispatched concurrently in one batch
    pub batch_size: usize,
    /// Cooldown between consecutive batches
    pub delay_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            delay_ms: DEFAULT_DELAY_MS,
        }
    }
}

impl BatchConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(batch_size) = lookup(env::BATCH_SIZE) {
            config.batch_size = batch_size.trim().parse().map_err(|e| {
                BulkError::Configuration(format!("Invalid batch_size '{batch_size}': {e}"))
            })?;
        }

        if let Some(delay_ms) = lookup(env::DELAY_MS) {
            config.delay_ms = delay_ms.trim().parse().map_err(|e| {
                BulkError::Configuration(format!("Invalid delay_ms '{delay_ms}': {e}"))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load layered configuration: defaults, then `path` if it exists, then
    /// `BULKOPS_*` environment variables
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with_environment(
            path.as_ref(),
            config::Environment::with_prefix(env::ENV_PREFIX).try_parsing(true),
        )
    }

    fn load_with_environment(path: &Path, environment: config::Environment) -> Result<Self> {
        let defaults = Self::default();

        let settings = config::Config::builder()
            .set_default("batch_size", defaults.batch_size as i64)?
            .set_default("delay_ms", defaults.delay_ms as i64)?
            .add_source(config::File::from(path).required(false))
            .add_source(environment)
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;

        debug!(
            path = %path.display(),
            batch_size = config.batch_size,
            delay_ms = config.delay_ms,
            "Bulk configuration loaded"
        );

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(BulkError::InvalidBatchSize {
                batch_size: self.batch_size,
            });
        }
        Ok(())
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}
