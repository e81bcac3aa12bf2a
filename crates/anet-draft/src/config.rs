//! Autosave configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment switch that stretches the autosave interval for UI tests
pub const TEST_MODE_ENV: &str = "ANET_TEST_MODE";

const DEFAULT_INTERVAL_MS: u64 = 30_000;
const TEST_MODE_INTERVAL_MS: u64 = 300_000;
const DEFAULT_DEBOUNCE_MS: u64 = 400;

/// Timing of the autosave loop and of field validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutosaveConfig {
    /// Default (and reset) autosave interval
    pub interval_ms: u64,
    /// Quiet window before a field is validated
    pub validation_debounce_ms: u64,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_INTERVAL_MS,
            validation_debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

impl AutosaveConfig {
    /// Long interval, so autosave stays out of the way of scripted UI tests
    #[must_use]
    pub fn test_mode() -> Self {
        Self {
            interval_ms: TEST_MODE_INTERVAL_MS,
            ..Self::default()
        }
    }

    /// Default or test-mode configuration depending on `ANET_TEST_MODE`
    #[must_use]
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(v) if !v.is_empty() && v != "0" && !v.eq_ignore_ascii_case("false") => {
                Self::test_mode()
            }
            _ => Self::default(),
        }
    }

    #[inline]
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_validation_debounce(mut self, window: Duration) -> Self {
        self.validation_debounce_ms = u64::try_from(window.as_millis()).unwrap_or(u64::MAX);
        self
    }

    #[inline]
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    #[inline]
    #[must_use]
    pub fn validation_debounce(&self) -> Duration {
        Duration::from_millis(self.validation_debounce_ms)
    }
}
