//! Configuration for SlotKV
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, SlotKvError};
use crate::record::{MAX_KEY_LEN, MAX_VALUE_LEN};

/// Main configuration for a SlotKV instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Path of the slot file backing the store
    pub path: PathBuf,

    /// Slot capacity allocated when a fresh file is bootstrapped
    pub initial_slots: u32,

    // -------------------------------------------------------------------------
    // Expiration Configuration
    // -------------------------------------------------------------------------
    /// Sleep between two expiration sweeps
    pub poll_interval: Duration,

    /// What the sweep does when deleting an expired key fails
    pub sweep_failure_policy: SweepFailurePolicy,

    // -------------------------------------------------------------------------
    // Limits (enforced by the engine, below the codec's field widths)
    // -------------------------------------------------------------------------
    /// Max key length in bytes
    pub max_key_len: usize,

    /// Max value length in bytes
    pub max_value_len: usize,
}

/// Behavior of the background sweep when a delete fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepFailurePolicy {
    /// Log a warning and keep sweeping
    LogAndContinue,

    /// Stop the background task at the first failure
    Abort,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./slotkv.db"),
            initial_slots: 100,
            poll_interval: Duration::from_secs(1),
            sweep_failure_policy: SweepFailurePolicy::LogAndContinue,
            max_key_len: 32,
            max_value_len: 16 * 1024, // 16 KB
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings the storage format cannot honor
    pub fn validate(&self) -> Result<()> {
        if self.initial_slots == 0 {
            return Err(SlotKvError::Config(
                "initial_slots must be greater than zero".to_string(),
            ));
        }
        if self.poll_interval.is_zero() {
            return Err(SlotKvError::Config(
                "poll_interval must be greater than zero".to_string(),
            ));
        }
        if self.max_key_len > MAX_KEY_LEN {
            return Err(SlotKvError::Config(format!(
                "max_key_len {} exceeds the record key width ({})",
                self.max_key_len, MAX_KEY_LEN
            )));
        }
        if self.max_value_len > MAX_VALUE_LEN {
            return Err(SlotKvError::Config(format!(
                "max_value_len {} exceeds the record value width ({})",
                self.max_value_len, MAX_VALUE_LEN
            )));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the slot file path
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.path = path.into();
        self
    }

    /// Set the slot capacity of a freshly created file
    pub fn initial_slots(mut self, slots: u32) -> Self {
        self.config.initial_slots = slots;
        self
    }

    /// Set the interval between expiration sweeps
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// Set the sweep failure policy
    pub fn sweep_failure_policy(mut self, policy: SweepFailurePolicy) -> Self {
        self.config.sweep_failure_policy = policy;
        self
    }

    /// Set the maximum key length (in bytes)
    pub fn max_key_len(mut self, len: usize) -> Self {
        self.config.max_key_len = len;
        self
    }

    /// Set the maximum value length (in bytes)
    pub fn max_value_len(mut self, len: usize) -> Self {
        self.config.max_value_len = len;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
