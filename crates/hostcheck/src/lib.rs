//! Host health probes.
//!
//! This crate answers "is this host healthy?" by probing three kinds of
//! targets:
//! - OS services, through a [`ServiceManager`] (systemd by default)
//! - TCP ports, with a bounded connect timeout
//! - HTTP/HTTPS endpoints, matching the response status code
//!
//! A [`CheckSuite`] runs the checkers in a fixed order and reduces every
//! per-target result into one [`HealthReport`].
//!
//! # Example
//!
//! ```no_run
//! use hostcheck::{CheckSuite, PortTarget, ProbeTimeouts, Systemctl};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let timeouts = ProbeTimeouts::default();
//! let suite = CheckSuite::new(
//!     vec![PortTarget {
//!         name: "ssh".to_string(),
//!         address: "127.0.0.1".to_string(),
//!         port: 22,
//!     }],
//!     vec![],
//!     vec![],
//!     Arc::new(Systemctl::new(timeouts.service)),
//!     timeouts,
//! )?;
//!
//! let report = suite.run().await;
//! println!("healthy: {}", report.is_healthy());
//! for message in report.messages() {
//!     println!("{message}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod checkers;
pub mod service_manager;
pub mod suite;
pub mod types;

pub use checkers::{EndpointChecker, HealthChecker, PortChecker, ServiceChecker};
pub use service_manager::{ServiceManager, ServiceState, Systemctl};
pub use suite::{CheckSuite, ProbeTimeouts};
pub use types::{
    CheckReport, EndpointTarget, HealthReport, HealthStatus, PortTarget, ProbeResult, ServiceTarget,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status_display() {
        assert_eq!(HealthStatus::Healthy.to_string(), "HEALTHY");
        assert_eq!(HealthStatus::Unhealthy.to_string(), "UNHEALTHY");
    }

    #[test]
    fn test_probe_result() {
        let result = ProbeResult::healthy(std::time::Duration::from_millis(100), "ok");
        assert!(result.is_healthy());
        assert_eq!(result.status, HealthStatus::Healthy);
        assert_eq!(result.message, "ok");
    }

    #[test]
    fn test_default_timeouts() {
        let timeouts = ProbeTimeouts::default();
        assert_eq!(timeouts.port, std::time::Duration::from_secs(1));
        assert_eq!(timeouts.endpoint, std::time::Duration::from_secs(10));
        assert_eq!(timeouts.service, std::time::Duration::from_secs(5));
    }
}
