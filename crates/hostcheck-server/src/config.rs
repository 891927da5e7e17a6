//! Configuration loading and validation for the health check server

use crate::auth::AuthConfig;
use crate::types::ServerConfig;
use hostcheck::{EndpointTarget, PortTarget, ProbeTimeouts, ServiceTarget};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use validator::{Validate, ValidationError, ValidationErrors};

/// Overrides the configured listen host
pub const ENV_LISTEN_HOST: &str = "HEALTH_LISTEN_HOST";

/// Overrides the configured listen port
pub const ENV_LISTEN_PORT: &str = "HEALTH_LISTEN_PORT";

/// Selects the configuration file when no path is given on the command line
pub const ENV_CONFIG_FILE: &str = "HEALTHCHECK_CONFIG_FILE";

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(#[from] ValidationErrors),

    #[error("Invalid {section} entry '{name}': {source}")]
    InvalidEntry {
        section: &'static str,
        name: String,
        #[source]
        source: ValidationErrors,
    },

    #[error("Invalid value for {key}: {value}")]
    InvalidEnv { key: &'static str, value: String },
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub config: AppSettings,

    #[serde(default)]
    pub services: Vec<ServiceEntry>,

    #[serde(default)]
    pub ports: Vec<PortEntry>,

    #[serde(default)]
    pub endpoints: Vec<EndpointEntry>,
}

/// Server-level settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
#[validate(schema(function = "validate_credentials"))]
pub struct AppSettings {
    #[validate]
    pub listen: ListenSettings,

    #[validate]
    pub ssl: SslSettings,

    pub auth: AuthConfig,

    #[validate]
    pub timeouts: TimeoutSettings,

    pub logging: LoggingSettings,

    pub metrics: MetricsSettings,
}

/// Listen address
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ListenSettings {
    #[validate(length(min = 1))]
    pub host: String,

    #[validate(range(min = 1, max = 65535))]
    pub port: u32,
}

/// Inbound TLS
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
#[validate(schema(function = "validate_tls_material"))]
pub struct SslSettings {
    pub enabled: bool,
    pub cert_file: String,
    pub key_file: String,
}

/// Probe and shutdown timeouts
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct TimeoutSettings {
    #[serde(with = "humantime_serde")]
    #[validate(custom = "validate_timeout")]
    pub port: Duration,

    #[serde(with = "humantime_serde")]
    #[validate(custom = "validate_timeout")]
    pub endpoint: Duration,

    #[serde(with = "humantime_serde")]
    #[validate(custom = "validate_timeout")]
    pub service: Duration,

    #[serde(with = "humantime_serde")]
    #[validate(custom = "validate_timeout")]
    pub shutdown: Duration,
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: Option<String>,
    pub format: LogFormat,
}

/// Prometheus endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsSettings {
    pub enabled: bool,
}

/// A service whose active state is checked
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceEntry {
    pub name: String,
    pub status: String,
}

/// A TCP port that must accept connections
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PortEntry {
    pub name: String,

    #[validate(length(min = 1))]
    pub address: String,

    #[validate(range(min = 1, max = 65535))]
    pub port: u32,
}

/// An HTTP endpoint whose status code is checked
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EndpointEntry {
    pub name: String,

    #[validate(custom = "validate_endpoint_url")]
    pub url: String,

    #[validate(range(min = 100, max = 599))]
    pub status: u16,

    #[serde(default)]
    #[validate(custom = "validate_status_codes")]
    pub statuses: Vec<u16>,

    #[serde(default = "default_skip_tls_verify")]
    pub skip_tls_verify: bool,
}

// Default implementations

impl Default for ListenSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        let probes = ProbeTimeouts::default();
        Self {
            port: probes.port,
            endpoint: probes.endpoint,
            service: probes.service,
            shutdown: Duration::from_secs(5),
        }
    }
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn default_skip_tls_verify() -> bool {
    true
}

// Custom validators

fn validate_tls_material(ssl: &SslSettings) -> Result<(), ValidationError> {
    if ssl.enabled && (ssl.cert_file.trim().is_empty() || ssl.key_file.trim().is_empty()) {
        return Err(ValidationError::new("tls_material_missing"));
    }
    Ok(())
}

fn validate_credentials(settings: &AppSettings) -> Result<(), ValidationError> {
    if settings.auth.enabled && settings.auth.username.is_empty() {
        return Err(ValidationError::new("auth_username_missing"));
    }
    Ok(())
}

fn validate_timeout(timeout: &Duration) -> Result<(), ValidationError> {
    if timeout.is_zero() {
        return Err(ValidationError::new("timeout_zero"));
    }
    Ok(())
}

fn validate_endpoint_url(url: &str) -> Result<(), ValidationError> {
    let parsed = reqwest::Url::parse(url).map_err(|_| ValidationError::new("url_unparseable"))?;
    match parsed.scheme() {
        "http" | "https" if parsed.has_host() => Ok(()),
        "http" | "https" => Err(ValidationError::new("url_missing_host")),
        _ => Err(ValidationError::new("url_scheme_unsupported")),
    }
}

fn validate_status_codes(codes: &[u16]) -> Result<(), ValidationError> {
    if codes.iter().any(|code| !(100..=599).contains(code)) {
        return Err(ValidationError::new("status_code_out_of_range"));
    }
    Ok(())
}

// Configuration loading implementation

impl Config {
    /// Load, apply environment overrides, then validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let mut config = Self::load_unvalidated(path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate_all()?;
        Ok(config)
    }

    /// Read and parse a file without overrides or validation
    pub fn load_unvalidated(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        tracing::debug!("Loading configuration from: {}", path.display());
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::IoError {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Apply `HEALTH_LISTEN_HOST` / `HEALTH_LISTEN_PORT` through `lookup`
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(ENV_LISTEN_HOST) {
            self.config.listen.host = host;
        }

        if let Some(value) = lookup(ENV_LISTEN_PORT) {
            self.config.listen.port = value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                key: ENV_LISTEN_PORT,
                value,
            })?;
        }

        Ok(())
    }

    /// Validate settings and every target entry
    pub fn validate_all(&self) -> Result<(), ConfigError> {
        self.config.validate()?;

        for entry in &self.ports {
            entry.validate().map_err(|source| ConfigError::InvalidEntry {
                section: "ports",
                name: entry.name.clone(),
                source,
            })?;
        }

        for entry in &self.endpoints {
            entry.validate().map_err(|source| ConfigError::InvalidEntry {
                section: "endpoints",
                name: entry.name.clone(),
                source,
            })?;
        }

        Ok(())
    }

    /// Convert to ServerConfig. Call after [`Config::validate_all`].
    pub fn to_server_config(&self) -> ServerConfig {
        let settings = &self.config;
        ServerConfig {
            listen_host: settings.listen.host.clone(),
            listen_port: u16::try_from(settings.listen.port).unwrap_or_default(),
            tls_enabled: settings.ssl.enabled,
            cert_path: settings.ssl.cert_file.clone(),
            key_path: settings.ssl.key_file.clone(),
            shutdown_timeout: settings.timeouts.shutdown,
            metrics_enabled: settings.metrics.enabled,
        }
    }

    pub fn auth_config(&self) -> AuthConfig {
        self.config.auth.clone()
    }

    pub fn probe_timeouts(&self) -> ProbeTimeouts {
        let timeouts = &self.config.timeouts;
        ProbeTimeouts {
            port: timeouts.port,
            endpoint: timeouts.endpoint,
            service: timeouts.service,
        }
    }

    pub fn service_targets(&self) -> Vec<ServiceTarget> {
        self.services
            .iter()
            .map(|entry| ServiceTarget {
                name: entry.name.clone(),
                expected_status: entry.status.clone(),
            })
            .collect()
    }

    /// Port targets; entries outside the u16 range are skipped, which
    /// cannot happen for a validated config.
    pub fn port_targets(&self) -> Vec<PortTarget> {
        self.ports
            .iter()
            .filter_map(|entry| {
                let port = u16::try_from(entry.port).ok()?;
                Some(PortTarget {
                    name: entry.name.clone(),
                    address: entry.address.clone(),
                    port,
                })
            })
            .collect()
    }

    pub fn endpoint_targets(&self) -> Vec<EndpointTarget> {
        self.endpoints
            .iter()
            .map(|entry| EndpointTarget {
                name: entry.name.clone(),
                url: entry.url.clone(),
                expected_status: entry.status,
                expected_statuses: entry.statuses.clone(),
                skip_tls_verify: entry.skip_tls_verify,
            })
            .collect()
    }
}
