//! Access to the OS service manager.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Answer from a service manager query
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServiceState {
    /// Reported state, trimmed (e.g. "active", "inactive", "failed")
    pub state: String,

    /// False when the query itself failed and `state` is not trustworthy
    pub ok: bool,
}

impl ServiceState {
    pub fn reported(state: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            ok: true,
        }
    }

    pub fn failed(state: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            ok: false,
        }
    }
}

/// Capability to look up the active state of a named service.
///
/// Names reaching this trait have already passed the allow-list in
/// [`crate::checkers::is_valid_service_name`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ServiceManager: Send + Sync {
    /// Query the current active state of `name`
    async fn query_state(&self, name: &str) -> ServiceState;
}

/// systemd backend using `systemctl is-active`
#[derive(Debug, Clone)]
pub struct Systemctl {
    program: String,
    timeout_duration: Duration,
}

impl Systemctl {
    pub fn new(timeout_duration: Duration) -> Self {
        Self::with_program("systemctl", timeout_duration)
    }

    /// Use a different executable with `systemctl`-compatible arguments
    pub fn with_program(program: impl Into<String>, timeout_duration: Duration) -> Self {
        Self {
            program: program.into(),
            timeout_duration,
        }
    }
}

#[async_trait]
impl ServiceManager for Systemctl {
    async fn query_state(&self, name: &str) -> ServiceState {
        let output = Command::new(&self.program)
            .arg("is-active")
            .arg("--")
            .arg(name)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .output();

        match timeout(self.timeout_duration, output).await {
            Ok(Ok(output)) => {
                let state = String::from_utf8_lossy(&output.stdout).trim().to_string();
                // Unknown units still print a state, so the exit code decides.
                if output.status.success() && !state.is_empty() {
                    debug!(service = name, state = %state, "Service state queried");
                    ServiceState::reported(state)
                } else {
                    warn!(service = name, state = %state, code = ?output.status.code(), "Service manager query failed");
                    ServiceState::failed(state)
                }
            }
            Ok(Err(e)) => {
                warn!(service = name, program = %self.program, error = %e, "Failed to run service manager");
                ServiceState::failed("")
            }
            Err(_) => {
                warn!(service = name, timeout_ms = self.timeout_duration.as_millis(), "Service manager query timed out");
                ServiceState::failed("")
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Write an executable shell script standing in for systemctl.
    fn fake_systemctl(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("systemctl");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn manager(path: &PathBuf, timeout: Duration) -> Systemctl {
        Systemctl::with_program(path.to_string_lossy().into_owned(), timeout)
    }

    #[tokio::test]
    async fn test_missing_program_is_failure() {
        let manager = Systemctl::with_program("/nonexistent/systemctl", Duration::from_secs(1));
        let state = manager.query_state("nginx").await;
        assert!(!state.ok);
        assert!(state.state.is_empty());
    }

    #[tokio::test]
    async fn test_printed_state_is_reported() {
        // `echo is-active -- nginx` prints its arguments and exits 0.
        let manager = Systemctl::with_program("echo", Duration::from_secs(1));
        let state = manager.query_state("nginx").await;
        assert!(state.ok);
        assert_eq!(state.state, "is-active -- nginx");
    }

    #[tokio::test]
    async fn test_empty_output_is_failure() {
        let manager = Systemctl::with_program("true", Duration::from_secs(1));
        let state = manager.query_state("nginx").await;
        assert_eq!(state, ServiceState::failed(""));
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_failure_with_printed_state() {
        let dir = TempDir::new().unwrap();
        let path = fake_systemctl(&dir, "echo inactive\nexit 4");

        let state = manager(&path, Duration::from_secs(1)).query_state("nosuchunit").await;
        assert_eq!(state, ServiceState::failed("inactive"));
    }

    #[tokio::test]
    async fn test_name_is_passed_after_option_terminator() {
        let dir = TempDir::new().unwrap();
        let path = fake_systemctl(&dir, r#"[ "$1" = is-active ] && [ "$2" = -- ] && echo "$3""#);

        let state = manager(&path, Duration::from_secs(1)).query_state("nginx").await;
        assert_eq!(state, ServiceState::reported("nginx"));
    }

    #[tokio::test]
    async fn test_hung_query_times_out() {
        let dir = TempDir::new().unwrap();
        let path = fake_systemctl(&dir, "sleep 5\necho active");

        let start = std::time::Instant::now();
        let state = manager(&path, Duration::from_millis(100)).query_state("nginx").await;
        assert_eq!(state, ServiceState::failed(""));
        assert!(start.elapsed() < Duration::from_secs(2));
    }
}
