//! Balancer configuration.
//!
//! Loaded from TOML or assembled with [`Config::builder`]. Durations are
//! written as strings in config files:
//!
//! ```toml
//! endpoints = ["https://rpc.ankr.com/eth", "https://eth.llamarpc.com"]
//! threshold = 100
//! request_timeout = "30m"
//! heartbeat_interval = "3s"
//! heartbeat_timeout = "1s"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::duration::serde_str;
use crate::endpoint::{check_transport_scheme, validate_endpoint};
use crate::error::{ConfigError, ConfigResult};

pub const DEFAULT_THRESHOLD: usize = 100;
/// Generous on purpose; nodes enforce their own request timeouts.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(3);
pub const DEFAULT_HEARTBEAT_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Endpoints to probe and dispatch to. No default.
    pub endpoints: Vec<String>,
    /// Extent size above which a batched request is sharded across nodes.
    pub threshold: usize,
    /// Deadline for one node to serve its whole share of a request.
    #[serde(with = "serde_str")]
    pub request_timeout: Duration,
    /// Delay between the end of one probe cycle and the start of the next.
    #[serde(with = "serde_str")]
    pub heartbeat_interval: Duration,
    /// Shared deadline for all probes of one cycle.
    #[serde(with = "serde_str")]
    pub heartbeat_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoints: Vec::new(),
            threshold: DEFAULT_THRESHOLD,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            heartbeat_timeout: DEFAULT_HEARTBEAT_TIMEOUT,
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Load and validate a TOML config file.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Check every invariant: at least one well-formed endpoint over a
    /// supported scheme, and all durations non-zero.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.endpoints.is_empty() {
            return Err(ConfigError::NoEndpoints);
        }
        for endpoint in &self.endpoints {
            validate_endpoint(endpoint)?;
            check_transport_scheme(endpoint)?;
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout { field: "request_timeout" });
        }
        if self.heartbeat_interval.is_zero() {
            return Err(ConfigError::InvalidInterval);
        }
        if self.heartbeat_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout { field: "heartbeat_timeout" });
        }
        Ok(())
    }
}

/// Builder over [`Config::default`].
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoints.push(endpoint.into());
        self
    }

    pub fn endpoints<I, S>(mut self, endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.endpoints.extend(endpoints.into_iter().map(Into::into));
        self
    }

    pub fn threshold(mut self, threshold: usize) -> Self {
        self.config.threshold = threshold;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.config.heartbeat_interval = interval;
        self
    }

    pub fn heartbeat_timeout(mut self, timeout: Duration) -> Self {
        self.config.heartbeat_timeout = timeout;
        self
    }

    /// Validate and return the configuration.
    pub fn build(self) -> ConfigResult<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> ConfigBuilder {
        Config::builder()
            .endpoint("http://127.0.0.1:3821")
            .threshold(1)
            .heartbeat_interval(Duration::from_secs(1))
            .heartbeat_timeout(Duration::from_secs(1))
    }

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.threshold, DEFAULT_THRESHOLD);
        assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);
        assert_eq!(config.heartbeat_interval, DEFAULT_HEARTBEAT_INTERVAL);
        assert_eq!(config.heartbeat_timeout, DEFAULT_HEARTBEAT_TIMEOUT);
        assert!(config.endpoints.is_empty());
    }

    #[test]
    fn valid_config_builds() {
        let config = valid().build().unwrap();
        assert_eq!(config.endpoints, vec!["http://127.0.0.1:3821"]);
        assert_eq!(config.threshold, 1);
    }

    #[test]
    fn zero_interval_rejected() {
        let err = valid().heartbeat_interval(Duration::ZERO).build().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidInterval));
    }

    #[test]
    fn zero_timeouts_rejected() {
        let err = valid().heartbeat_timeout(Duration::ZERO).build().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimeout { field: "heartbeat_timeout" }));

        let err = valid().request_timeout(Duration::ZERO).build().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimeout { field: "request_timeout" }));
    }

    #[test]
    fn missing_endpoints_rejected() {
        let err = Config::builder().build().unwrap_err();
        assert!(matches!(err, ConfigError::NoEndpoints));
    }

    #[test]
    fn malformed_endpoint_rejected() {
        let err = valid().endpoint("dbadoy").build().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEndpoint(ref e) if e == "dbadoy"));
    }

    #[test]
    fn websocket_endpoint_rejected() {
        let err = Config::builder()
            .endpoint("ws://127.0.0.1:3821")
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedScheme { .. }));
    }

    #[test]
    fn parse_toml_with_defaults() {
        let config = Config::from_toml_str(
            r#"
endpoints = ["https://rpc.ankr.com/eth", "https://eth.llamarpc.com"]
threshold = 5
heartbeat_interval = "500ms"
"#,
        )
        .unwrap();
        assert_eq!(config.endpoints.len(), 2);
        assert_eq!(config.threshold, 5);
        assert_eq!(config.heartbeat_interval, Duration::from_millis(500));
        assert_eq!(config.heartbeat_timeout, DEFAULT_HEARTBEAT_TIMEOUT);
        assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);
    }

    #[test]
    fn parse_toml_rejects_bad_duration() {
        let err = Config::from_toml_str(
            r#"
endpoints = ["http://127.0.0.1:8545"]
heartbeat_timeout = "later"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn toml_round_trip_keeps_durations_readable() {
        let config = valid().build().unwrap();
        let text = config.to_toml_string().unwrap();
        assert!(text.contains("request_timeout = \"30m\""));
        assert_eq!(Config::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn from_file_reads_and_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rpcfan.toml");
        std::fs::write(&path, "endpoints = [\"http://10.0.0.1:8545\"]\n").unwrap();
        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.endpoints, vec!["http://10.0.0.1:8545"]);

        let missing = dir.path().join("missing.toml");
        assert!(matches!(Config::from_file(&missing), Err(ConfigError::Read(_))));
    }
}
