//! Prometheus metrics for the health check server.

use hostcheck::HealthReport;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::histogram::{Histogram, exponential_buckets};
use prometheus_client::registry::Registry;

/// Labels for health query metrics
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct RequestLabels {
    /// Outcome (healthy, unhealthy, unauthorized)
    pub outcome: String,
}

/// Labels for per-checker metrics
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct CheckerLabels {
    /// Checker type (port, service, endpoint)
    pub checker: String,
}

/// Labels for probe result metrics
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct ProbeLabels {
    /// Checker type (port, service, endpoint)
    pub checker: String,
    /// Result (success, failure)
    pub result: String,
}

/// Metrics registry with all server metrics
pub struct MetricsRegistry {
    /// Prometheus registry
    pub registry: Registry,

    /// Health queries by outcome
    requests_total: Family<RequestLabels, Counter>,
    /// Individual probes by checker and result
    probes_total: Family<ProbeLabels, Counter>,
    /// Probe latency by checker
    probe_duration_seconds: Family<CheckerLabels, Histogram>,
    /// Latency of a full health run
    run_duration_seconds: Histogram,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let requests_total = Family::<RequestLabels, Counter>::default();
        registry.register(
            "hostcheck_requests",
            "Health queries served, by outcome",
            requests_total.clone(),
        );

        let probes_total = Family::<ProbeLabels, Counter>::default();
        registry.register(
            "hostcheck_probes",
            "Individual target probes performed",
            probes_total.clone(),
        );

        let probe_duration_seconds = Family::<CheckerLabels, Histogram>::new_with_constructor(|| {
            // 1ms to ~16s, covering the endpoint timeout
            Histogram::new(exponential_buckets(0.001, 2.0, 15))
        });
        registry.register(
            "hostcheck_probe_duration_seconds",
            "Probe latency in seconds",
            probe_duration_seconds.clone(),
        );

        let run_duration_seconds = Histogram::new(exponential_buckets(0.001, 2.0, 16));
        registry.register(
            "hostcheck_run_duration_seconds",
            "Latency of a full health run in seconds",
            run_duration_seconds.clone(),
        );

        Self {
            registry,
            requests_total,
            probes_total,
            probe_duration_seconds,
            run_duration_seconds,
        }
    }

    /// Record every probe of a completed run and its overall outcome
    pub fn record_report(&self, report: &HealthReport) {
        for check in &report.reports {
            let histogram = self.probe_duration_seconds.get_or_create(&CheckerLabels {
                checker: check.checker.to_string(),
            });

            for result in &check.results {
                self.probes_total
                    .get_or_create(&ProbeLabels {
                        checker: check.checker.to_string(),
                        result: result_to_string(result.is_healthy()).to_string(),
                    })
                    .inc();
                histogram.observe(result.duration.as_secs_f64());
            }
        }

        self.run_duration_seconds
            .observe(report.duration.as_secs_f64());

        let outcome = if report.is_healthy() {
            "healthy"
        } else {
            "unhealthy"
        };
        self.record_request(outcome);
    }

    /// Record a query rejected by the auth gate
    pub fn record_unauthorized(&self) {
        self.record_request("unauthorized");
    }

    fn record_request(&self, outcome: &str) {
        self.requests_total
            .get_or_create(&RequestLabels {
                outcome: outcome.to_string(),
            })
            .inc();
    }

    /// Current value of the request counter for `outcome`
    pub fn requests(&self, outcome: &str) -> u64 {
        self.requests_total
            .get_or_create(&RequestLabels {
                outcome: outcome.to_string(),
            })
            .get()
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn result_to_string(healthy: bool) -> &'static str {
    if healthy { "success" } else { "failure" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostcheck::{CheckReport, ProbeResult};
    use prometheus_client::encoding::text::encode;
    use std::time::Duration;

    fn report(outcomes: &[bool]) -> HealthReport {
        let results = outcomes
            .iter()
            .map(|ok| {
                if *ok {
                    ProbeResult::healthy(Duration::from_millis(5), "ok")
                } else {
                    ProbeResult::unhealthy(Duration::from_millis(5), "bad")
                }
            })
            .collect();
        HealthReport {
            reports: vec![CheckReport::new("port", results)],
            duration: Duration::from_millis(10),
        }
    }

    #[test]
    fn test_record_report_counts_outcome() {
        let registry = MetricsRegistry::new();

        registry.record_report(&report(&[true, true]));
        registry.record_report(&report(&[true, false]));
        registry.record_unauthorized();

        assert_eq!(registry.requests("healthy"), 1);
        assert_eq!(registry.requests("unhealthy"), 1);
        assert_eq!(registry.requests("unauthorized"), 1);
    }

    #[test]
    fn test_encoded_output() {
        let registry = MetricsRegistry::new();
        registry.record_report(&report(&[false]));

        let mut buffer = String::new();
        encode(&mut buffer, &registry.registry).unwrap();

        assert!(buffer.contains("hostcheck_requests_total"));
        assert!(buffer.contains(r#"checker="port",result="failure""#));
        assert!(buffer.contains("hostcheck_probe_duration_seconds"));
    }

    #[test]
    fn test_result_to_string() {
        assert_eq!(result_to_string(true), "success");
        assert_eq!(result_to_string(false), "failure");
    }
}
