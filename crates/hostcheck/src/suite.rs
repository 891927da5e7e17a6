//! Aggregation of all checkers into a single verdict.

use crate::checkers::{EndpointChecker, HealthChecker, PortChecker, ServiceChecker};
use crate::service_manager::ServiceManager;
use crate::types::{EndpointTarget, HealthReport, PortTarget, ServiceTarget};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Timeouts applied by the built-in checkers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeTimeouts {
    pub port: Duration,
    pub endpoint: Duration,
    pub service: Duration,
}

impl Default for ProbeTimeouts {
    fn default() -> Self {
        Self {
            port: crate::checkers::DEFAULT_PORT_TIMEOUT,
            endpoint: crate::checkers::DEFAULT_ENDPOINT_TIMEOUT,
            service: crate::checkers::DEFAULT_SERVICE_TIMEOUT,
        }
    }
}

/// Ordered set of checkers run for every health query.
///
/// The suite is immutable once built and safe to share between concurrent
/// requests; each [`CheckSuite::run`] builds its own report.
pub struct CheckSuite {
    checkers: Vec<Arc<dyn HealthChecker>>,
}

impl CheckSuite {
    /// Build the standard suite: ports, then services, then endpoints.
    pub fn new(
        ports: Vec<PortTarget>,
        services: Vec<ServiceTarget>,
        endpoints: Vec<EndpointTarget>,
        manager: Arc<dyn ServiceManager>,
        timeouts: ProbeTimeouts,
    ) -> common::Result<Self> {
        Ok(Self::from_checkers(vec![
            Arc::new(PortChecker::new(ports, timeouts.port)),
            Arc::new(ServiceChecker::new(services, manager)),
            Arc::new(EndpointChecker::new(endpoints, timeouts.endpoint)?),
        ]))
    }

    /// Build a suite from arbitrary checkers, run in the given order
    pub fn from_checkers(checkers: Vec<Arc<dyn HealthChecker>>) -> Self {
        Self { checkers }
    }

    /// Total number of targets across all checkers
    pub fn target_count(&self) -> usize {
        self.checkers.iter().map(|c| c.target_count()).sum()
    }

    /// Run every checker in order and collect the results.
    ///
    /// All checkers run even after a failure so that every target is
    /// reported.
    pub async fn run(&self) -> HealthReport {
        let start = Instant::now();
        let mut report = HealthReport::default();

        for checker in &self.checkers {
            let check = checker.check().await;
            debug!(
                checker = checker.name(),
                targets = check.results.len(),
                failures = check.failures(),
                "Checker finished"
            );
            report.reports.push(check);
        }

        report.duration = start.elapsed();
        if report.is_healthy() {
            info!(targets = report.len(), duration_ms = report.duration.as_millis(), "Health check passed");
        } else {
            let failed: usize = report.reports.iter().map(|r| r.failures()).sum();
            warn!(
                targets = report.len(),
                failed,
                duration_ms = report.duration.as_millis(),
                "Health check failed"
            );
        }
        report
    }
}
