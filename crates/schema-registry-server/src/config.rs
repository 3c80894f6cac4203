// Configuration Management
// Layers environment variables over an optional YAML file, falling back to defaults.

use schema_registry_core::{CompatibilityMode, Mode};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server configuration
    pub server: ServerSettings,

    /// Registry defaults applied when no per-subject override exists
    pub registry: RegistryDefaults,

    /// Observability configuration
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Server listen address
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    /// HTTP port
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Graceful shutdown timeout (seconds)
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_seconds: u64,

    /// Max request body size (bytes)
    #[serde(default = "default_max_body_size")]
    pub max_request_body_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryDefaults {
    /// Global default compatibility level (§4.6)
    #[serde(default = "default_compatibility")]
    pub default_compatibility: String,

    /// Global default mode (§4.6)
    #[serde(default = "default_mode")]
    pub default_mode: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Enable Prometheus metrics
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,

    /// Metrics endpoint path
    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,

    /// Log level (passed to `tracing_subscriber::EnvFilter`)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format: "json" or "pretty"
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_listen_address() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    8080
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_max_body_size() -> usize {
    10 * 1024 * 1024
}

fn default_compatibility() -> String {
    "BACKWARD".to_string()
}

fn default_mode() -> String {
    "READWRITE".to_string()
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_true() -> bool {
    true
}

impl ServerConfig {
    /// Load configuration from environment variables (`SCHEMA_REGISTRY__*`), defaults only.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("SCHEMA_REGISTRY")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Load configuration from a YAML file, overlaid by environment variables.
    pub fn from_file(path: &str) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(
                config::Environment::with_prefix("SCHEMA_REGISTRY")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Validate configuration, parsing the compatibility/mode strings along the way.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if CompatibilityMode::from_str(&self.registry.default_compatibility).is_err() {
            errors.push(format!(
                "invalid default compatibility level: {}",
                self.registry.default_compatibility
            ));
        }

        if Mode::from_str(&self.registry.default_mode).is_err() {
            errors.push(format!("invalid default mode: {}", self.registry.default_mode));
        }

        if self.server.http_port == 0 {
            errors.push("server.http_port must be nonzero".to_string());
        }

        if self.observability.log_format != "json" && self.observability.log_format != "pretty" {
            errors.push(format!(
                "observability.log_format must be \"json\" or \"pretty\", got {}",
                self.observability.log_format
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Parsed default compatibility level; panics if `validate()` was not called first.
    pub fn default_compatibility(&self) -> CompatibilityMode {
        CompatibilityMode::from_str(&self.registry.default_compatibility)
            .expect("validate() must be called before default_compatibility()")
    }

    /// Parsed default mode; panics if `validate()` was not called first.
    pub fn default_mode(&self) -> Mode {
        Mode::from_str(&self.registry.default_mode)
            .expect("validate() must be called before default_mode()")
    }

    /// Print configuration summary.
    pub fn print_summary(&self) {
        tracing::info!("===========================================");
        tracing::info!("Configuration Summary");
        tracing::info!("===========================================");
        tracing::info!("Server: {}:{}", self.server.listen_address, self.server.http_port);
        tracing::info!("Registry defaults: compatibility={} mode={}", self.registry.default_compatibility, self.registry.default_mode);
        tracing::info!("Observability: metrics={} log_level={} log_format={}", self.observability.metrics_enabled, self.observability.log_level, self.observability.log_format);
        tracing::info!("===========================================");
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                listen_address: default_listen_address(),
                http_port: default_http_port(),
                shutdown_timeout_seconds: default_shutdown_timeout(),
                max_request_body_bytes: default_max_body_size(),
            },
            registry: RegistryDefaults {
                default_compatibility: default_compatibility(),
                default_mode: default_mode(),
            },
            observability: ObservabilityConfig {
                metrics_enabled: true,
                metrics_path: default_metrics_path(),
                log_level: default_log_level(),
                log_format: default_log_format(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.server.http_port, 8080);
        assert_eq!(config.registry.default_compatibility, "BACKWARD");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_compatibility() {
        let mut config = ServerConfig::default();
        config.registry.default_compatibility = "NOT_A_LEVEL".to_string();
        let errors = config.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("compatibility")));
    }

    #[test]
    fn test_invalid_mode() {
        let mut config = ServerConfig::default();
        config.registry.default_mode = "NOT_A_MODE".to_string();
        let errors = config.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("mode")));
    }

    #[test]
    fn test_invalid_log_format() {
        let mut config = ServerConfig::default();
        config.observability.log_format = "xml".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_port_rejected() {
        let mut config = ServerConfig::default();
        config.server.http_port = 0;
        assert!(config.validate().is_err());
    }
}
