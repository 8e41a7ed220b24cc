//! Client configuration
//!
//! Configuration is assembled from builder calls merged with an optional YAML
//! credentials file. File values take precedence over builder values, matching
//! the merge order callers of the original API relied on. Unrecognized YAML
//! keys are kept and queryable via [`Config::extra`].
//!
//! Example credentials file:
//!
//! ```yaml
//! token: 75STYGWg2nyQXTE46Ov7BDVSslFkt6TSkzxxxx
//! dataCenter: fra1
//! fileCreationTimeout: 60
//! ```

use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Validated client configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// The Qualtrics API token
    pub token: String,
    /// The Qualtrics data center ID (e.g. "fra1")
    pub data_center: String,
    /// Timeout for individual API calls
    pub timeout: Duration,
    /// Timeout for export-file creation; defaults to `timeout` when unset
    pub file_creation_timeout: Option<Duration>,
    /// Interval between export status polls
    pub file_creation_poll_interval: Duration,
    /// Unrecognized keys from the YAML file
    extra: HashMap<String, serde_yaml::Value>,
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Load configuration entirely from a YAML file
    pub fn from_yaml(path: impl AsRef<Path>) -> Result<Self> {
        Self::builder().yaml(path).build()
    }

    /// The API base URL for this configuration's data center
    pub fn base_url(&self) -> String {
        format!("https://{}.qualtrics.com/API/v3/", self.data_center)
    }

    /// The effective timeout budget for export polling
    pub fn export_timeout(&self) -> Duration {
        self.file_creation_timeout.unwrap_or(self.timeout)
    }

    /// Look up an unrecognized configuration entry from the YAML file
    pub fn extra(&self, key: &str) -> Option<&serde_yaml::Value> {
        self.extra.get(key)
    }
}

/// Raw shape of the YAML credentials file. Key names follow the Qualtrics
/// camelCase convention.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileConfig {
    token: Option<String>,
    data_center: Option<String>,
    timeout: Option<u64>,
    file_creation_timeout: Option<u64>,
    file_creation_poll_interval_millis: Option<u64>,
    #[serde(flatten)]
    extra: HashMap<String, serde_yaml::Value>,
}

/// Builder for [`Config`]
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    token: Option<String>,
    data_center: Option<String>,
    timeout: Option<u64>,
    file_creation_timeout: Option<u64>,
    file_creation_poll_interval_millis: Option<u64>,
    yaml: Option<PathBuf>,
}

impl ConfigBuilder {
    /// Set the API token
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the data center ID
    pub fn data_center(mut self, data_center: impl Into<String>) -> Self {
        self.data_center = Some(data_center.into());
        self
    }

    /// Set the call timeout in seconds (default 30)
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Some(secs);
        self
    }

    /// Set the export-file creation timeout in seconds (default: call timeout)
    pub fn file_creation_timeout_secs(mut self, secs: u64) -> Self {
        self.file_creation_timeout = Some(secs);
        self
    }

    /// Set the export polling interval in milliseconds (default 500)
    pub fn file_creation_poll_interval_millis(mut self, millis: u64) -> Self {
        self.file_creation_poll_interval_millis = Some(millis);
        self
    }

    /// Merge additional configuration from the given YAML file.
    /// File values override values set on the builder.
    pub fn yaml(mut self, path: impl AsRef<Path>) -> Self {
        self.yaml = Some(path.as_ref().to_path_buf());
        self
    }

    /// Validate and build the configuration.
    /// Fails immediately when `token` or `dataCenter` is missing.
    pub fn build(self) -> Result<Config> {
        let file = match &self.yaml {
            Some(path) => {
                let text = std::fs::read_to_string(path)?;
                serde_yaml::from_str::<FileConfig>(&text)?
            }
            None => FileConfig::default(),
        };

        let token = file
            .token
            .or(self.token)
            .ok_or_else(|| Error::missing_field("token"))?;
        let data_center = file
            .data_center
            .or(self.data_center)
            .ok_or_else(|| Error::missing_field("dataCenter"))?;

        let timeout = file
            .timeout
            .or(self.timeout)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        let file_creation_timeout = file.file_creation_timeout.or(self.file_creation_timeout);
        let poll_interval = file
            .file_creation_poll_interval_millis
            .or(self.file_creation_poll_interval_millis)
            .unwrap_or(DEFAULT_POLL_INTERVAL_MS);

        Ok(Config {
            token,
            data_center,
            timeout: Duration::from_secs(timeout),
            file_creation_timeout: file_creation_timeout.map(Duration::from_secs),
            file_creation_poll_interval: Duration::from_millis(poll_interval),
            extra: file.extra,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builder_defaults() {
        let config = Config::builder()
            .token("t")
            .data_center("d")
            .build()
            .unwrap();

        assert_eq!(config.token, "t");
        assert_eq!(config.data_center, "d");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.export_timeout(), Duration::from_secs(30));
        assert_eq!(
            config.file_creation_poll_interval,
            Duration::from_millis(500)
        );
        assert_eq!(config.base_url(), "https://d.qualtrics.com/API/v3/");
    }

    #[test]
    fn test_builder_overrides() {
        let config = Config::builder()
            .token("t")
            .data_center("d")
            .timeout_secs(10)
            .file_creation_timeout_secs(60)
            .file_creation_poll_interval_millis(0)
            .build()
            .unwrap();

        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.export_timeout(), Duration::from_secs(60));
        assert_eq!(config.file_creation_poll_interval, Duration::from_millis(0));
    }

    #[test]
    fn test_incomplete_configuration() {
        let err = Config::builder().token("t").build().unwrap_err();
        assert!(matches!(
            err,
            Error::MissingConfigField { field } if field == "dataCenter"
        ));

        let err = Config::builder().data_center("d").build().unwrap_err();
        assert!(matches!(
            err,
            Error::MissingConfigField { field } if field == "token"
        ));
    }

    #[test]
    fn test_parameters_from_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let mut f = std::fs::File::create(&path).unwrap();
        write!(f, "token: t\ndataCenter: d\nextra: e").unwrap();

        let config = Config::from_yaml(&path).unwrap();
        assert_eq!(config.token, "t");
        assert_eq!(config.data_center, "d");
        assert_eq!(
            config.extra("extra"),
            Some(&serde_yaml::Value::String("e".to_string()))
        );
        assert_eq!(config.extra("notPresent"), None);
    }

    #[test]
    fn test_yaml_overrides_builder() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let mut f = std::fs::File::create(&path).unwrap();
        write!(f, "token: fromFile\ndataCenter: d\nfileCreationTimeout: 60").unwrap();

        let config = Config::builder()
            .token("fromBuilder")
            .yaml(&path)
            .build()
            .unwrap();

        assert_eq!(config.token, "fromFile");
        assert_eq!(config.export_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_missing_yaml() {
        let err = Config::from_yaml("nonExistentFile").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
