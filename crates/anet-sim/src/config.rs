//! Simulator configuration
//!
//! Loaded from an optional TOML file, then `ANET_SIM_*` environment
//! overrides; the binary applies its flags last.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use anet_client::{ClientConfig, Credential};

use crate::error::SimError;

/// Prefix of environment overrides
pub const ENV_PREFIX: &str = "ANET_SIM_";

/// Everything the simulator binary needs to run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Scenario to run
    pub scenario: String,
    /// Scheduling cycles; one cycle is a minute
    pub cycles: f64,
    /// Running time of the scheduled stories in minutes
    pub minutes: f64,
    /// Pause between user types within a tick
    pub role_delay_ms: u64,
    /// Seed for reproducible schedules
    pub seed: Option<u64>,
    /// Privileged user for lookups that must see everything
    pub admin: Credential,
    pub client: ClientConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            scenario: "default".to_string(),
            cycles: 3.0,
            minutes: 3.0,
            role_delay_ms: 10,
            seed: None,
            admin: Credential::new("arthur", "arthur"),
            client: ClientConfig::default(),
        }
    }
}

fn parse<T: FromStr>(var: &str, value: String) -> Result<T, SimError> {
    value.parse().map_err(|_| SimError::InvalidEnv {
        var: var.to_string(),
        value,
    })
}

impl SimConfig {
    /// Parse a TOML document; missing keys keep their defaults
    ///
    /// # Errors
    /// `ConfigParse` on malformed TOML or mistyped values
    pub fn from_toml_str(text: &str) -> Result<Self, SimError> {
        Ok(toml::from_str(text)?)
    }

    /// Read `path` if given, then apply the process environment
    ///
    /// # Errors
    /// `ConfigIo`, `ConfigParse` or `InvalidEnv`
    pub fn load(path: Option<&Path>) -> Result<Self, SimError> {
        let config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| SimError::ConfigIo {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml_str(&text)?
            }
            None => Self::default(),
        };
        config.with_overrides(|key| std::env::var(format!("{ENV_PREFIX}{key}")).ok())
    }

    /// Apply overrides looked up by key without the `ANET_SIM_` prefix
    ///
    /// # Errors
    /// `InvalidEnv` when a numeric override does not parse
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SimError> {
        let var = |key: &str| format!("{ENV_PREFIX}{key}");
        if let Some(value) = lookup("SCENARIO") {
            self.scenario = value;
        }
        if let Some(value) = lookup("CYCLES") {
            self.cycles = parse(&var("CYCLES"), value)?;
        }
        if let Some(value) = lookup("MINUTES") {
            self.minutes = parse(&var("MINUTES"), value)?;
        }
        if let Some(value) = lookup("ROLE_DELAY_MS") {
            self.role_delay_ms = parse(&var("ROLE_DELAY_MS"), value)?;
        }
        if let Some(value) = lookup("SEED") {
            self.seed = Some(parse(&var("SEED"), value)?);
        }
        if let Some(value) = lookup("ADMIN_USER") {
            self.admin.username = value;
        }
        if let Some(value) = lookup("ADMIN_PASSWORD") {
            self.admin.password = value;
        }
        if let Some(value) = lookup("GRAPHQL_URL") {
            self.client.graphql_url = value;
        }
        if let Some(value) = lookup("TOKEN_URL") {
            self.client.token_url = value;
        }
        if let Some(value) = lookup("CLIENT_ID") {
            self.client.client_id = value;
        }
        if let Some(value) = lookup("REQUEST_TIMEOUT_MS") {
            self.client.request_timeout_ms = parse(&var("REQUEST_TIMEOUT_MS"), value)?;
        }
        Ok(self)
    }

    #[inline]
    #[must_use]
    pub fn with_scenario(mut self, scenario: impl Into<String>) -> Self {
        self.scenario = scenario.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn with_cycles(mut self, cycles: f64) -> Self {
        self.cycles = cycles;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_minutes(mut self, minutes: f64) -> Self {
        self.minutes = minutes;
        self
    }

    /// Length of the scheduling cycle all story periods derive from
    #[must_use]
    pub fn cycle_length(&self) -> Duration {
        Duration::from_secs_f64((self.cycles * 60.0).max(0.0))
    }

    /// How long stories are scheduled
    #[must_use]
    pub fn running_time(&self) -> Duration {
        Duration::from_secs_f64((self.minutes * 60.0).max(0.0))
    }

    #[must_use]
    pub fn role_delay(&self) -> Duration {
        Duration::from_millis(self.role_delay_ms)
    }
}
