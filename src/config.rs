//! Application configuration loaded from environment variables.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;

use crate::predictor::PredictorKind;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Server Configuration ===
    /// Address the HTTP server binds to.
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port.
    #[serde(default = "default_port")]
    pub port: u16,

    // === Predictor ===
    /// Predictor kind (currently only `knn`).
    #[serde(default = "default_predictor")]
    pub predictor: String,

    /// CSV data set used by the nearest-neighbour model.
    #[serde(default = "default_hotels_path")]
    pub hotels_path: PathBuf,

    /// Number of neighbours the model averages over.
    #[serde(default = "default_knn_neighbors")]
    pub knn_neighbors: usize,

    // === Observability ===
    /// Port for the Prometheus exporter. Disabled when unset.
    #[serde(default)]
    pub metrics_port: Option<u16>,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    /// Emit logs as JSON lines.
    #[serde(default)]
    pub log_json: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_predictor() -> String {
    "knn".to_string()
}

fn default_hotels_path() -> PathBuf {
    PathBuf::from("data/hotels.csv")
}

fn default_knn_neighbors() -> usize {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            predictor: default_predictor(),
            hotels_path: default_hotels_path(),
            knn_neighbors: default_knn_neighbors(),
            metrics_port: None,
            rust_log: default_log_level(),
            log_json: false,
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if IpAddr::from_str(&self.host).is_err() {
            return Err(format!("HOST is not an IP address: {}", self.host));
        }

        if self.predictor_kind().is_err() {
            return Err(format!("PREDICTOR is not a known predictor: {}", self.predictor));
        }

        if self.hotels_path.as_os_str().is_empty() {
            return Err("HOTELS_PATH must not be empty".to_string());
        }

        if self.knn_neighbors == 0 {
            return Err("KNN_NEIGHBORS must be at least 1".to_string());
        }

        if self.metrics_port == Some(self.port) {
            return Err("METRICS_PORT must differ from PORT".to_string());
        }

        Ok(())
    }

    /// Parsed predictor kind.
    pub fn predictor_kind(&self) -> Result<PredictorKind, strum::ParseError> {
        PredictorKind::from_str(&self.predictor)
    }

    /// Socket address for the HTTP server.
    pub fn bind_addr(&self) -> Result<SocketAddr, String> {
        let ip = IpAddr::from_str(&self.host)
            .map_err(|e| format!("invalid HOST {}: {}", self.host, e))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// Socket address for the Prometheus exporter, if enabled.
    pub fn metrics_addr(&self) -> Option<SocketAddr> {
        let ip = IpAddr::from_str(&self.host).ok()?;
        self.metrics_port.map(|port| SocketAddr::new(ip, port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values_match_public_interface() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.predictor, "knn");
        assert_eq!(config.knn_neighbors, 5);
        assert!(config.metrics_port.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn bind_addr_uses_host_and_port() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 9000,
            ..Config::default()
        };
        assert_eq!(config.bind_addr().unwrap(), "127.0.0.1:9000".parse().unwrap());
    }

    #[test]
    fn validate_rejects_zero_neighbors() {
        let config = Config {
            knn_neighbors: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_unknown_predictor() {
        let config = Config {
            predictor: "oracle".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_host() {
        let config = Config {
            host: "not-an-ip".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
        assert!(config.bind_addr().is_err());
    }

    #[test]
    fn validate_rejects_metrics_port_clash() {
        let config = Config {
            metrics_port: Some(8080),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn metrics_addr_only_when_port_set() {
        let mut config = Config::default();
        assert!(config.metrics_addr().is_none());

        config.metrics_port = Some(9100);
        assert_eq!(config.metrics_addr().unwrap().port(), 9100);
    }
}
