//! Caps on run size, checked before any candidate is invoked.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::HarnessError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunLimits {
    /// Maximum worker threads.
    pub max_workers: usize,
    /// Longest per-invocation timeout in milliseconds.
    pub max_timeout_ms: u64,
    /// Maximum generated cases, samples included.
    pub max_cases: usize,
    /// Maximum partition document size in bytes.
    pub max_config_bytes: u64,
}

impl Default for RunLimits {
    fn default() -> Self {
        Self {
            max_workers: 64,
            max_timeout_ms: 600_000,          // 10 minutes
            max_cases: 1_000_000,
            max_config_bytes: 16 * 1024 * 1024, // 16 MB
        }
    }
}

impl RunLimits {
    pub fn check_workers(&self, workers: usize) -> Result<(), HarnessError> {
        if workers == 0 {
            return Err(HarnessError::InvalidConfig(
                "worker count must be at least 1".to_string(),
            ));
        }
        if workers > self.max_workers {
            return Err(HarnessError::LimitExceeded(format!(
                "{workers} workers (max {})",
                self.max_workers
            )));
        }
        Ok(())
    }

    pub fn check_timeout(&self, timeout: Duration) -> Result<(), HarnessError> {
        if timeout.is_zero() {
            return Err(HarnessError::InvalidConfig(
                "timeout must be at least 1 ms".to_string(),
            ));
        }
        if timeout.as_millis() > u128::from(self.max_timeout_ms) {
            return Err(HarnessError::LimitExceeded(format!(
                "timeout {} ms (max {} ms)",
                timeout.as_millis(),
                self.max_timeout_ms
            )));
        }
        Ok(())
    }

    pub fn check_cases(&self, count: usize) -> Result<(), HarnessError> {
        if count > self.max_cases {
            return Err(HarnessError::LimitExceeded(format!(
                "{count} cases (max {})",
                self.max_cases
            )));
        }
        Ok(())
    }

    pub fn check_config_size(&self, bytes: u64) -> Result<(), HarnessError> {
        if bytes > self.max_config_bytes {
            return Err(HarnessError::LimitExceeded(format!(
                "partition config is {bytes} bytes (max {})",
                self.max_config_bytes
            )));
        }
        Ok(())
    }
}
