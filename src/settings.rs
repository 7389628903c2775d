//! Dashboard settings.
//!
//! Read from an optional TOML file overlaid with `ECOWATCH_*` environment
//! variables (nested keys use `__`, e.g. `ECOWATCH_POLL_INTERVAL_SECS=10`):
//!
//! ```toml
//! proxy_url = "http://localhost:3000"
//! poll_interval_secs = 30
//! locale = "pt-BR"
//!
//! [display.tempEx]
//! format = "fixed:1"
//! unit = "°C"
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::data::{DisplayRule, DisplayRules, MonthLocale};

/// Dashboard settings.
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardSettings {
    /// Base URL of the ecowatch proxy.
    #[serde(default = "default_proxy_url")]
    pub proxy_url: String,
    /// Seconds between refresh cycles.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Month label language.
    #[serde(default)]
    pub locale: MonthLocale,
    /// Display rule overrides, per telemetry key.
    #[serde(default)]
    pub display: BTreeMap<String, DisplayRule>,
}

fn default_proxy_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            proxy_url: default_proxy_url(),
            poll_interval_secs: default_poll_interval_secs(),
            timeout_secs: default_timeout_secs(),
            locale: MonthLocale::default(),
            display: BTreeMap::new(),
        }
    }
}

impl DashboardSettings {
    /// Load settings from `path` (if given) and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        let settings = builder
            .add_source(
                Environment::with_prefix("ECOWATCH")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(settings)
    }

    /// Time between refresh cycles, at least one second.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    /// Request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The default display rules with this file's overrides applied.
    pub fn display_rules(&self) -> DisplayRules {
        DisplayRules::default().merge(self.display.clone())
    }
}
