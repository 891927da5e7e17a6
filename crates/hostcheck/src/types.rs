//! Probe targets and result types.

use std::fmt;
use std::time::Duration;

/// Outcome of a single probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    /// Target matched its expectation
    Healthy,
    /// Target did not match, or could not be reached
    Unhealthy,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "HEALTHY"),
            HealthStatus::Unhealthy => write!(f, "UNHEALTHY"),
        }
    }
}

/// Result of probing one target
#[derive(Debug, Clone)]
pub struct ProbeResult {
    /// Status of the probe
    pub status: HealthStatus,

    /// Operator-facing description of the outcome
    pub message: String,

    /// Wall time spent on the probe
    pub duration: Duration,
}

impl ProbeResult {
    /// Create a healthy result
    pub fn healthy(duration: Duration, message: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Healthy,
            message: message.into(),
            duration,
        }
    }

    /// Create an unhealthy result
    pub fn unhealthy(duration: Duration, message: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            message: message.into(),
            duration,
        }
    }

    /// Check if the result is healthy
    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

/// Results of one checker over all of its targets, in configured order.
#[derive(Debug, Clone)]
pub struct CheckReport {
    /// Name of the checker that produced the report
    pub checker: &'static str,

    /// One result per target
    pub results: Vec<ProbeResult>,
}

impl CheckReport {
    pub fn new(checker: &'static str, results: Vec<ProbeResult>) -> Self {
        Self { checker, results }
    }

    /// True when every target passed. An empty report passes.
    pub fn passed(&self) -> bool {
        self.results.iter().all(ProbeResult::is_healthy)
    }

    /// Number of failed targets
    pub fn failures(&self) -> usize {
        self.results.iter().filter(|r| !r.is_healthy()).count()
    }

    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.results.iter().map(|r| r.message.as_str())
    }
}

/// Aggregated outcome of a full health run. Built fresh for every run.
#[derive(Debug, Clone, Default)]
pub struct HealthReport {
    /// Per-checker reports in execution order
    pub reports: Vec<CheckReport>,

    /// Wall time of the whole run
    pub duration: Duration,
}

impl HealthReport {
    /// Logical AND across every checker
    pub fn is_healthy(&self) -> bool {
        self.reports.iter().all(CheckReport::passed)
    }

    /// All messages, checker by checker, each in target order
    pub fn messages(&self) -> Vec<String> {
        self.reports
            .iter()
            .flat_map(|report| report.messages().map(str::to_owned))
            .collect()
    }

    /// Total number of probed targets
    pub fn len(&self) -> usize {
        self.reports.iter().map(|r| r.results.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Expected state of an OS-managed service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceTarget {
    /// Unit name passed to the service manager
    pub name: String,

    /// Expected active state, compared exactly (e.g. "active")
    pub expected_status: String,
}

/// A TCP port that must accept connections
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortTarget {
    /// Human-readable label
    pub name: String,

    /// Hostname, IPv4 or IPv6 literal
    pub address: String,

    pub port: u16,
}

impl PortTarget {
    /// Host part suitable for socket address resolution.
    ///
    /// Bracketed IPv6 literals (`[::1]`) are unwrapped.
    pub fn host(&self) -> &str {
        self.address
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(&self.address)
    }
}

/// An HTTP(S) endpoint that must answer with an acceptable status code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointTarget {
    /// Human-readable label
    pub name: String,

    /// Absolute http or https URL
    pub url: String,

    /// Primary expected status code
    pub expected_status: u16,

    /// Additional acceptable status codes
    pub expected_statuses: Vec<u16>,

    /// Skip certificate verification for https URLs
    pub skip_tls_verify: bool,
}

impl EndpointTarget {
    /// Whether `code` is in `expected_statuses ∪ {expected_status}`
    pub fn accepts(&self, code: u16) -> bool {
        code == self.expected_status || self.expected_statuses.contains(&code)
    }

    /// Whether this target should be probed with certificate checks disabled
    pub fn uses_relaxed_tls(&self) -> bool {
        self.skip_tls_verify && self.url.starts_with("https://")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(status: u16, statuses: Vec<u16>) -> EndpointTarget {
        EndpointTarget {
            name: "api".to_string(),
            url: "https://localhost/health".to_string(),
            expected_status: status,
            expected_statuses: statuses,
            skip_tls_verify: true,
        }
    }

    #[test]
    fn test_accepts_union_of_status_and_statuses() {
        let target = endpoint(200, vec![301]);
        assert!(target.accepts(200));
        assert!(target.accepts(301));
        assert!(!target.accepts(404));
    }

    #[test]
    fn test_accepts_with_empty_statuses() {
        let target = endpoint(204, vec![]);
        assert!(target.accepts(204));
        assert!(!target.accepts(200));
    }

    #[test]
    fn test_relaxed_tls_only_for_https() {
        let mut target = endpoint(200, vec![]);
        assert!(target.uses_relaxed_tls());

        target.skip_tls_verify = false;
        assert!(!target.uses_relaxed_tls());

        target.skip_tls_verify = true;
        target.url = "http://localhost/health".to_string();
        assert!(!target.uses_relaxed_tls());
    }

    #[test]
    fn test_port_target_host_unwraps_ipv6_brackets() {
        let mut target = PortTarget {
            name: "dns".to_string(),
            address: "[::1]".to_string(),
            port: 53,
        };
        assert_eq!(target.host(), "::1");

        target.address = "::1".to_string();
        assert_eq!(target.host(), "::1");

        target.address = "example.com".to_string();
        assert_eq!(target.host(), "example.com");
    }

    #[test]
    fn test_report_aggregation() {
        let ok = ProbeResult::healthy(Duration::ZERO, "a");
        let bad = ProbeResult::unhealthy(Duration::ZERO, "b");

        let passing = CheckReport::new("port", vec![ok.clone()]);
        let failing = CheckReport::new("service", vec![ok, bad]);
        assert!(passing.passed());
        assert!(!failing.passed());
        assert_eq!(failing.failures(), 1);

        let report = HealthReport {
            reports: vec![passing, failing],
            duration: Duration::ZERO,
        };
        assert!(!report.is_healthy());
        assert_eq!(report.len(), 3);
        assert_eq!(report.messages(), vec!["a", "a", "b"]);
    }

    #[test]
    fn test_empty_report_is_healthy() {
        let report = HealthReport::default();
        assert!(report.is_healthy());
        assert!(report.is_empty());
        assert!(CheckReport::new("endpoint", vec![]).passed());
    }
}
