//! hostcheck server
//!
//! Answers "is this host healthy?" over HTTP. Each `GET /healthy` probes
//! every configured service, TCP port and HTTP endpoint and returns a
//! single JSON verdict.
//!
//! # Components
//!
//! - **Config**: YAML file plus environment overrides, validated at startup
//! - **Auth**: optional HTTP Basic gate with constant-time comparison
//! - **HTTP server**: `/healthy` and Prometheus `/metrics`
//! - **Server**: bind, serve, and drain within a grace period on shutdown

pub mod auth;
pub mod cli;
pub mod config;
pub mod http_server;
pub mod metrics;
pub mod server;
pub mod types;

pub use auth::AuthConfig;
pub use config::{Config, ConfigError};
pub use http_server::{AppState, router};
pub use metrics::MetricsRegistry;
pub use server::{BoundServer, HealthcheckServer, ServerError, shutdown_signal};
pub use types::{HealthResponse, ServerConfig};
