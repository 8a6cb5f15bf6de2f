//! Watch configuration

use crate::error::{Result, WatchError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Smallest accepted poll interval
pub const MIN_POLL_INTERVAL_MS: u64 = 10;
/// Largest accepted poll interval (one hour)
pub const MAX_POLL_INTERVAL_MS: u64 = 3_600_000;

/// Watch loop configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Delay between two stat passes over the watch set
    pub poll_interval_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1_000,
        }
    }
}

impl WatchConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis().min(u64::MAX as u128) as u64;
        self
    }

    /// Check that every value is within its allowed range
    pub fn validate(&self) -> Result<()> {
        if !(MIN_POLL_INTERVAL_MS..=MAX_POLL_INTERVAL_MS).contains(&self.poll_interval_ms) {
            return Err(WatchError::InvalidConfig {
                reason: format!(
                    "poll_interval_ms must be between {} and {} (got {})",
                    MIN_POLL_INTERVAL_MS, MAX_POLL_INTERVAL_MS, self.poll_interval_ms
                ),
            });
        }
        Ok(())
    }
}
