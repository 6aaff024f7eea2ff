//! Configuration for the dashboard.

use crate::core::{default_locations, Location, Metric, TransformSettings};
use crate::refresh::RefreshSettings;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration for the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// How often a refresh cycle starts
    #[serde(with = "duration_ms")]
    pub refresh_interval: Duration,

    /// Trailing history window requested from upstream
    pub history_window_minutes: u32,

    /// Monitored locations, in tie-break and display order
    pub locations: Vec<Location>,

    /// Metrics to align, in chart order
    pub metrics: Vec<Metric>,

    /// IANA zone used for time labels
    pub display_timezone: String,

    /// Where samples come from
    pub upstream: UpstreamConfig,

    /// Port for the dashboard HTTP server
    pub server_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(30),
            history_window_minutes: 60,
            locations: default_locations(),
            metrics: Metric::defaults(),
            display_timezone: "America/Toronto".to_string(),
            upstream: UpstreamConfig::default(),
            server_port: 8080,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::IoError(e.to_string()))?;
            Self::parse(&content)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse configuration from a JSON string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(&config_path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rideau-dashboard")
            .join("config.json")
    }

    /// Check the values a refresh loop depends on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.refresh_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "refresh_interval must be greater than zero".to_string(),
            ));
        }
        if self.history_window_minutes == 0 {
            return Err(ConfigError::Invalid(
                "history_window_minutes must be greater than zero".to_string(),
            ));
        }
        if self.locations.is_empty() {
            return Err(ConfigError::Invalid("no locations configured".to_string()));
        }

        let mut seen = HashSet::new();
        if let Some(dup) = self.locations.iter().find(|l| !seen.insert(*l)) {
            return Err(ConfigError::Invalid(format!("duplicate location: {dup}")));
        }

        if self.metrics.is_empty() {
            return Err(ConfigError::Invalid("no metrics configured".to_string()));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.metrics.iter().find(|m| !seen.insert(**m)) {
            return Err(ConfigError::Invalid(format!("duplicate metric: {dup}")));
        }

        self.timezone()?;
        Ok(())
    }

    /// Parsed display time zone.
    pub fn timezone(&self) -> Result<Tz, ConfigError> {
        self.display_timezone.parse::<Tz>().map_err(|_| {
            ConfigError::Invalid(format!("unknown time zone: {}", self.display_timezone))
        })
    }

    /// Validate and convert into refresh loop settings.
    pub fn refresh_settings(&self) -> Result<RefreshSettings, ConfigError> {
        self.validate()?;

        Ok(RefreshSettings {
            refresh_interval: self.refresh_interval,
            history_window_minutes: self.history_window_minutes,
            transform: TransformSettings {
                locations: self.locations.clone(),
                metrics: self.metrics.clone(),
                display_timezone: self.timezone()?,
            },
        })
    }
}

/// Where the dashboard reads samples from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UpstreamConfig {
    /// Aggregation HTTP API
    Http {
        base_url: String,
        #[serde(with = "duration_ms")]
        timeout: Duration,
    },
    /// Local JSON or JSON-lines sample file
    File { path: PathBuf },
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        UpstreamConfig::Http {
            base_url: "http://127.0.0.1:3000".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ConfigError::Invalid(e) => write!(f, "Invalid config: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Serde support for Duration as milliseconds.
mod duration_ms {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.refresh_interval, Duration::from_secs(30));
        assert_eq!(config.history_window_minutes, 60);
        assert_eq!(config.locations.len(), 3);
        assert_eq!(config.metrics, Metric::defaults());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_json_shape() {
        let json = serde_json::to_value(Config::default()).unwrap();
        assert_eq!(json["refresh_interval"], 30_000);
        assert_eq!(json["locations"][0], "Dow's Lake");
        assert_eq!(json["metrics"][1], "avgSurfaceTemp");
        assert_eq!(json["upstream"]["kind"], "http");
        assert_eq!(json["upstream"]["timeout"], 10_000);
    }

    #[test]
    fn test_parse_file_upstream() {
        let config = Config::parse(
            r#"{
                "refresh_interval": 5000,
                "history_window_minutes": 15,
                "locations": ["NAC", "Dow's Lake"],
                "metrics": ["maxSnowAccumulation"],
                "display_timezone": "UTC",
                "upstream": { "kind": "file", "path": "/var/lib/rideau/samples.jsonl" },
                "server_port": 0
            }"#,
        )
        .unwrap();

        assert_eq!(
            config.upstream,
            UpstreamConfig::File {
                path: PathBuf::from("/var/lib/rideau/samples.jsonl")
            }
        );

        let settings = config.refresh_settings().unwrap();
        assert_eq!(settings.refresh_interval, Duration::from_millis(5000));
        assert_eq!(settings.transform.locations[0], Location::new("NAC"));
        assert_eq!(settings.transform.display_timezone, chrono_tz::UTC);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.refresh_interval = Duration::ZERO;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.locations.push(Location::new("NAC"));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate location: NAC"));

        let mut config = Config::default();
        config.metrics.clear();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.display_timezone = "Mars/Olympus".to_string();
        assert!(config.refresh_settings().is_err());
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            Config::parse("{ not json"),
            Err(ConfigError::ParseError(_))
        ));
    }
}
