use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::Result;

/// Tuning knobs for the modification ledger.
///
/// Defaults match the production scheduler: subscribers expire after
/// ten minutes without polling, at most ten subscribers at a time, and
/// the sweep runs once a minute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// How long a subscriber may go without polling before it is dropped.
    #[serde(default = "default_ttl")]
    pub ttl: Duration,
    /// Maximum number of concurrently registered subscribers.
    #[serde(default = "default_max_subscribers")]
    pub max_subscribers: usize,
    /// How often the background sweep looks for expired subscribers.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval: Duration,
}

fn default_ttl() -> Duration {
    Duration::from_secs(10 * 60)
}

fn default_max_subscribers() -> usize {
    10
}

fn default_sweep_interval() -> Duration {
    Duration::from_secs(60)
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            ttl: default_ttl(),
            max_subscribers: default_max_subscribers(),
            sweep_interval: default_sweep_interval(),
        }
    }
}

impl LedgerConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
