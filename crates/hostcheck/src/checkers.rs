//! Checker implementations.
//!
//! Every checker probes its targets one after another and yields exactly one
//! [`ProbeResult`] per target, in configured order.

use crate::service_manager::ServiceManager;
use crate::types::{CheckReport, EndpointTarget, PortTarget, ProbeResult, ServiceTarget};
use async_trait::async_trait;
use regex::Regex;
use std::sync::{Arc, LazyLock};
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Default TCP connect timeout for port checks
pub const DEFAULT_PORT_TIMEOUT: Duration = Duration::from_secs(1);

/// Default request timeout for endpoint checks
pub const DEFAULT_ENDPOINT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for a single service manager query
pub const DEFAULT_SERVICE_TIMEOUT: Duration = Duration::from_secs(5);

static SERVICE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9@:._][a-zA-Z0-9@:._-]*$").expect("service name pattern is valid")
});

/// Whether `name` is safe to hand to the service manager as an argument
pub fn is_valid_service_name(name: &str) -> bool {
    SERVICE_NAME.is_match(name)
}

/// Health checker trait
#[async_trait]
pub trait HealthChecker: Send + Sync {
    /// Probe every target once
    async fn check(&self) -> CheckReport;

    /// Get the name of this checker
    fn name(&self) -> &'static str;

    /// Number of configured targets
    fn target_count(&self) -> usize;
}

/// Service state checker
pub struct ServiceChecker {
    targets: Vec<ServiceTarget>,
    manager: Arc<dyn ServiceManager>,
}

impl ServiceChecker {
    pub fn new(targets: Vec<ServiceTarget>, manager: Arc<dyn ServiceManager>) -> Self {
        Self { targets, manager }
    }

    async fn check_one(&self, target: &ServiceTarget) -> ProbeResult {
        let start = Instant::now();

        if !is_valid_service_name(&target.name) {
            warn!(service = %target.name, "Rejected invalid service name");
            return ProbeResult::unhealthy(
                start.elapsed(),
                format!("Service Name: {} is invalid", target.name),
            );
        }

        let state = self.manager.query_state(&target.name).await;
        let duration = start.elapsed();

        if state.ok && state.state == target.expected_status {
            debug!(service = %target.name, state = %state.state, duration_ms = duration.as_millis(), "Service check successful");
            ProbeResult::healthy(
                duration,
                format!(
                    "Service Name: {}, Status: {} is as expected",
                    target.name, target.expected_status
                ),
            )
        } else {
            warn!(service = %target.name, expected = %target.expected_status, actual = %state.state, "Service check failed");
            ProbeResult::unhealthy(
                duration,
                format!(
                    "Service Name: {}, Expected Status: {}, Actual Status: {}",
                    target.name, target.expected_status, state.state
                ),
            )
        }
    }
}

#[async_trait]
impl HealthChecker for ServiceChecker {
    async fn check(&self) -> CheckReport {
        let mut results = Vec::with_capacity(self.targets.len());
        for target in &self.targets {
            results.push(self.check_one(target).await);
        }
        CheckReport::new(self.name(), results)
    }

    fn name(&self) -> &'static str {
        "service"
    }

    fn target_count(&self) -> usize {
        self.targets.len()
    }
}

/// TCP port checker
pub struct PortChecker {
    targets: Vec<PortTarget>,
    timeout_duration: Duration,
}

impl PortChecker {
    /// Create a new TCP port checker
    pub fn new(targets: Vec<PortTarget>, timeout_duration: Duration) -> Self {
        Self {
            targets,
            timeout_duration,
        }
    }

    async fn check_one(&self, target: &PortTarget) -> ProbeResult {
        let start = Instant::now();

        // Name resolution counts against the connect budget.
        let connect = TcpStream::connect((target.host(), target.port));
        let available = match timeout(self.timeout_duration, connect).await {
            Ok(Ok(stream)) => {
                drop(stream);
                true
            }
            Ok(Err(e)) => {
                warn!(address = %target.address, port = target.port, error = %e, "TCP check failed");
                false
            }
            Err(_) => {
                warn!(address = %target.address, port = target.port, "TCP check timed out");
                false
            }
        };
        let duration = start.elapsed();

        if available {
            debug!(address = %target.address, port = target.port, duration_ms = duration.as_millis(), "TCP check successful");
            ProbeResult::healthy(
                duration,
                format!("Port Name: {}, Port: {} is available", target.name, target.port),
            )
        } else {
            ProbeResult::unhealthy(
                duration,
                format!("Port Name: {}, Port: {} is not available", target.name, target.port),
            )
        }
    }
}

#[async_trait]
impl HealthChecker for PortChecker {
    async fn check(&self) -> CheckReport {
        let mut results = Vec::with_capacity(self.targets.len());
        for target in &self.targets {
            results.push(self.check_one(target).await);
        }
        CheckReport::new(self.name(), results)
    }

    fn name(&self) -> &'static str {
        "port"
    }

    fn target_count(&self) -> usize {
        self.targets.len()
    }
}

/// HTTP endpoint checker
pub struct EndpointChecker {
    targets: Vec<EndpointTarget>,
    client: reqwest::Client,
    insecure_client: reqwest::Client,
}

impl EndpointChecker {
    /// Create a new HTTP endpoint checker.
    ///
    /// Both clients are built up front and reuse their connection pools
    /// across requests.
    pub fn new(targets: Vec<EndpointTarget>, timeout_duration: Duration) -> common::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout_duration)
            .build()
            .map_err(common::Error::probe)?;

        let insecure_client = reqwest::Client::builder()
            .timeout(timeout_duration)
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(common::Error::probe)?;

        Ok(Self {
            targets,
            client,
            insecure_client,
        })
    }

    async fn check_one(&self, target: &EndpointTarget) -> ProbeResult {
        let start = Instant::now();

        let client = if target.uses_relaxed_tls() {
            &self.insecure_client
        } else {
            &self.client
        };

        let status_code = match client.get(&target.url).send().await {
            Ok(response) => {
                let code = response.status().as_u16();
                // Release the connection now; the body is never inspected.
                drop(response);
                code
            }
            Err(e) => {
                warn!(url = %target.url, error = %e, "HTTP check failed");
                return ProbeResult::unhealthy(
                    start.elapsed(),
                    format!("Endpoint Name: {}, URL: {} is not reachable", target.name, target.url),
                );
            }
        };
        let duration = start.elapsed();

        if target.accepts(status_code) {
            debug!(url = %target.url, status = status_code, duration_ms = duration.as_millis(), "HTTP check successful");
            ProbeResult::healthy(
                duration,
                format!(
                    "Endpoint Name: {}, URL: {}, Status: {} is as expected",
                    target.name, target.url, status_code
                ),
            )
        } else {
            warn!(url = %target.url, status = status_code, "HTTP check failed: unexpected status code");
            ProbeResult::unhealthy(
                duration,
                format!(
                    "Endpoint Name: {}, URL: {}, Status: {} is not as expected, got: {}",
                    target.name, target.url, target.expected_status, status_code
                ),
            )
        }
    }
}

#[async_trait]
impl HealthChecker for EndpointChecker {
    async fn check(&self) -> CheckReport {
        let mut results = Vec::with_capacity(self.targets.len());
        for target in &self.targets {
            results.push(self.check_one(target).await);
        }
        CheckReport::new(self.name(), results)
    }

    fn name(&self) -> &'static str {
        "endpoint"
    }

    fn target_count(&self) -> usize {
        self.targets.len()
    }
}
