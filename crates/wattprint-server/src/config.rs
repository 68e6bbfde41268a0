//! Server configuration

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "wattprint-server")]
#[command(about = "WattPrint sustainability estimation server", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    pub config: String,

    /// Listen address
    #[arg(short = 'l', long)]
    pub listen: Option<String>,

    /// Listen port
    #[arg(short = 'P', long)]
    pub port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Upstream lookup endpoints
    #[serde(default)]
    pub upstreams: UpstreamConfig,

    /// Classification service
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Persistence sink
    #[serde(default)]
    pub sink: SinkConfig,
}

impl ServerConfig {
    /// Load configuration from file and CLI overrides
    pub fn load(config_path: &str, cli: &Cli) -> anyhow::Result<Self> {
        let mut config = if Path::new(config_path).exists() {
            let content = std::fs::read_to_string(config_path)?;
            serde_yaml::from_str(&content)?
        } else {
            Self::default()
        };

        if let Some(listen) = &cli.listen {
            config.listen = listen.clone();
        }
        if let Some(port) = cli.port {
            config.port = port;
        }

        Ok(config)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            port: default_port(),
            upstreams: UpstreamConfig::default(),
            classifier: ClassifierConfig::default(),
            sink: SinkConfig::default(),
        }
    }
}

/// Upstream lookup endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Geolocation service base URL (`{base}/json/{ip}`)
    #[serde(default = "default_geo_url")]
    pub geo_base_url: String,

    /// Time service URL (`?timeZone={tz}`)
    #[serde(default = "default_time_url")]
    pub time_base_url: String,

    /// Carbon intensity service URL (`?lat=..&lon=..`)
    #[serde(default = "default_carbon_url")]
    pub carbon_base_url: String,

    /// `auth-token` header value for the carbon intensity service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbon_api_token: Option<String>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            geo_base_url: default_geo_url(),
            time_base_url: default_time_url(),
            carbon_base_url: default_carbon_url(),
            carbon_api_token: None,
        }
    }
}

/// Classification service configuration.
///
/// With no endpoint configured the pipeline still runs; every query gets
/// the fallback category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Predict endpoint URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Credential issuer URL returning `{"access_token": ...}`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_url: Option<String>,

    /// Fixed bearer token; takes precedence over `token_url`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_token: Option<String>,
}

/// Persistence sink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Enable the JSON-lines sink
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Sink file path
    #[serde(default = "default_sink_path")]
    pub path: PathBuf,

    /// Records buffered between flushes
    #[serde(default = "default_flush_interval")]
    pub flush_interval: usize,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_sink_path(),
            flush_interval: default_flush_interval(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_geo_url() -> String {
    "http://ip-api.com".to_string()
}

fn default_time_url() -> String {
    "https://timeapi.io/api/time/current/zone".to_string()
}

fn default_carbon_url() -> String {
    "https://api.electricitymap.org/v3/carbon-intensity/latest".to_string()
}

fn default_sink_path() -> PathBuf {
    PathBuf::from("./metrics.jsonl")
}

fn default_flush_interval() -> usize {
    10
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_yields_defaults() {
        let config: ServerConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.upstreams.geo_base_url, "http://ip-api.com");
        assert!(config.sink.enabled);
        assert!(config.classifier.endpoint.is_none());
    }

    #[test]
    fn partial_yaml_overrides_selected_fields() {
        let config: ServerConfig = serde_yaml::from_str(
            r#"
port: 9000
classifier:
  endpoint: "https://example.test/predict"
  static_token: "abc"
sink:
  enabled: false
"#,
        )
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(
            config.classifier.endpoint.as_deref(),
            Some("https://example.test/predict")
        );
        assert!(!config.sink.enabled);
        // Untouched sections keep defaults
        assert_eq!(config.listen, "0.0.0.0");
    }
}
