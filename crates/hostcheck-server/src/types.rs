//! Types shared by the HTTP surface and the server lifecycle.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Body status when every target passed
pub const STATUS_HEALTHY: &str = "Server is healthy";

/// Body status when at least one target failed
pub const STATUS_UNHEALTHY: &str = "Server is unhealthy";

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host or IP to bind
    pub listen_host: String,

    /// TCP port to bind
    pub listen_port: u16,

    /// Serve over TLS
    pub tls_enabled: bool,

    /// PEM certificate chain, used when TLS is enabled
    pub cert_path: String,

    /// PEM private key, used when TLS is enabled
    pub key_path: String,

    /// Grace period for in-flight requests on shutdown
    pub shutdown_timeout: Duration,

    /// Expose `/metrics`
    pub metrics_enabled: bool,
}

impl ServerConfig {
    /// `host:port`, bracketing IPv6 literals
    pub fn listen_addr(&self) -> String {
        if self.listen_host.contains(':') && !self.listen_host.starts_with('[') {
            format!("[{}]:{}", self.listen_host, self.listen_port)
        } else {
            format!("{}:{}", self.listen_host, self.listen_port)
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_host: "0.0.0.0".to_string(),
            listen_port: 8080,
            tls_enabled: false,
            cert_path: String::new(),
            key_path: String::new(),
            shutdown_timeout: Duration::from_secs(5),
            metrics_enabled: true,
        }
    }
}

/// JSON body of `/healthy`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub messages: Vec<String>,
}

impl HealthResponse {
    pub fn from_report(report: &hostcheck::HealthReport) -> Self {
        let status = if report.is_healthy() {
            STATUS_HEALTHY
        } else {
            STATUS_UNHEALTHY
        };
        Self {
            status: status.to_string(),
            messages: report.messages(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == STATUS_HEALTHY
    }
}

/// Lifecycle phase of the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Starting,
    Serving,
    Draining,
    Stopped,
}

impl std::fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Lifecycle::Starting => "starting",
            Lifecycle::Serving => "serving",
            Lifecycle::Draining => "draining",
            Lifecycle::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostcheck::{CheckReport, HealthReport, ProbeResult};

    #[test]
    fn test_listen_addr_brackets_ipv6() {
        let mut config = ServerConfig::default();
        assert_eq!(config.listen_addr(), "0.0.0.0:8080");

        config.listen_host = "::".to_string();
        assert_eq!(config.listen_addr(), "[::]:8080");

        config.listen_host = "[::1]".to_string();
        assert_eq!(config.listen_addr(), "[::1]:8080");
    }

    #[test]
    fn test_response_from_report() {
        let report = HealthReport {
            reports: vec![CheckReport::new(
                "port",
                vec![ProbeResult::unhealthy(
                    Duration::ZERO,
                    "Port Name: ssh, Port: 22 is not available",
                )],
            )],
            duration: Duration::ZERO,
        };

        let response = HealthResponse::from_report(&report);
        assert_eq!(response.status, STATUS_UNHEALTHY);
        assert!(!response.is_healthy());
        assert_eq!(response.messages, vec!["Port Name: ssh, Port: 22 is not available"]);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "Server is unhealthy");
        assert_eq!(json["messages"][0], "Port Name: ssh, Port: 22 is not available");
    }

    #[test]
    fn test_lifecycle_display() {
        assert_eq!(Lifecycle::Starting.to_string(), "starting");
        assert_eq!(Lifecycle::Stopped.to_string(), "stopped");
    }
}
