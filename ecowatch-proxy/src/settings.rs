//! Upstream connection settings.
//!
//! Read from an optional TOML file overlaid with `THINGSBOARD_*` environment
//! variables:
//!
//! ```toml
//! url = "https://thingsboard.example.com"
//! username = "tenant@example.com"
//! password = "secret"
//! assetid = "784f394c-42b6-435a-983c-b7beff2784f9"
//! ```

use std::path::Path;

use anyhow::Result;
use config::{Config, Environment, File};
use serde::Deserialize;

use ecowatch_adapters::thingsboard::ThingsBoardAdapter;

/// ThingsBoard connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ThingsBoardSettings {
    /// Base URL of the ThingsBoard instance.
    pub url: String,
    /// Login user.
    pub username: String,
    /// Login password.
    pub password: String,
    /// Asset whose telemetry is exposed.
    pub assetid: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

impl ThingsBoardSettings {
    /// Load settings from `path` (if given) and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        let settings = builder
            .add_source(Environment::with_prefix("THINGSBOARD"))
            .build()?
            .try_deserialize()?;

        Ok(settings)
    }

    /// Build the adapter these settings describe.
    pub fn adapter(&self) -> Result<ThingsBoardAdapter> {
        let adapter = ThingsBoardAdapter::builder()
            .endpoint(&self.url)
            .credentials(&self.username, &self.password)
            .asset_id(&self.assetid)
            .timeout(std::time::Duration::from_secs(self.timeout_secs))
            .build()?;
        Ok(adapter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
            url = "https://tb.example.com"
            username = "tenant@example.com"
            password = "secret"
            assetid = "asset-1"
            "#
        )
        .unwrap();

        let settings = ThingsBoardSettings::load(Some(file.path())).unwrap();
        assert_eq!(settings.url, "https://tb.example.com");
        assert_eq!(settings.assetid, "asset-1");
        assert_eq!(settings.timeout_secs, 10);

        let adapter = settings.adapter().unwrap();
        assert_eq!(adapter.endpoint(), "https://tb.example.com");
        assert_eq!(adapter.asset_id(), "asset-1");
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(ThingsBoardSettings::load(Some(Path::new("/nonexistent/ecowatch.toml"))).is_err());
    }
}
