//! Server lifecycle: bind, serve, drain.

use crate::http_server::{AppState, router};
use crate::types::{Lifecycle, ServerConfig};
use axum::Router;
use axum_server::Handle;
use axum_server::tls_rustls::RustlsConfig;
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinError;
use tokio::time::timeout;
use tracing::{error, info, warn};

/// Errors that stop the server
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to load TLS certificate {cert} / key {key}: {source}")]
    Tls {
        cert: String,
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),

    #[error("Server task failed: {0}")]
    Task(#[from] JoinError),

    #[error("Shutdown exceeded grace period of {0:?}")]
    ShutdownTimeout(Duration),
}

/// Health check server
pub struct HealthcheckServer {
    config: ServerConfig,
    state: AppState,
}

impl HealthcheckServer {
    /// Create a new health check server
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Bind the listener and load TLS material. Nothing is served yet.
    pub async fn bind(self) -> Result<BoundServer, ServerError> {
        let addr = self.config.listen_addr();
        info!(lifecycle = %Lifecycle::Starting, addr = %addr, tls = self.config.tls_enabled, "Starting health check server");

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .and_then(|listener| listener.into_std())
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;
        let local_addr = listener.local_addr()?;

        let tls = if self.config.tls_enabled {
            // Several rustls backends may be linked in; pin one for inbound TLS.
            let _ = rustls::crypto::ring::default_provider().install_default();
            let config = RustlsConfig::from_pem_file(&self.config.cert_path, &self.config.key_path)
                .await
                .map_err(|source| ServerError::Tls {
                    cert: self.config.cert_path.clone(),
                    key: self.config.key_path.clone(),
                    source,
                })?;
            Some(config)
        } else {
            None
        };

        Ok(BoundServer {
            listener,
            local_addr,
            tls,
            app: router(self.state),
            shutdown_timeout: self.config.shutdown_timeout,
        })
    }
}

/// A server whose listener is bound and ready to serve
pub struct BoundServer {
    listener: std::net::TcpListener,
    local_addr: SocketAddr,
    tls: Option<RustlsConfig>,
    app: Router,
    shutdown_timeout: Duration,
}

impl BoundServer {
    /// Address actually bound (resolves port 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve until `shutdown` resolves, then drain within the grace period.
    ///
    /// Returns [`ServerError::ShutdownTimeout`] when in-flight requests are
    /// still running at the end of the grace period; they are closed anyway.
    pub async fn serve<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send,
    {
        let handle = Handle::new();
        let app = self.app.into_make_service();
        let tls = self.tls.is_some();

        let mut server = match self.tls {
            Some(config) => tokio::spawn(
                axum_server::from_tcp_rustls(self.listener, config)
                    .handle(handle.clone())
                    .serve(app),
            ),
            None => tokio::spawn(
                axum_server::from_tcp(self.listener)
                    .handle(handle.clone())
                    .serve(app),
            ),
        };

        info!(lifecycle = %Lifecycle::Serving, addr = %self.local_addr, tls, "Server listening");

        tokio::select! {
            result = &mut server => {
                warn!("Server stopped without a shutdown request");
                return flatten(result);
            }
            _ = shutdown => {}
        }

        info!(
            lifecycle = %Lifecycle::Draining,
            connections = handle.connection_count(),
            grace_ms = self.shutdown_timeout.as_millis(),
            "Shutting down server"
        );
        handle.graceful_shutdown(None);

        match timeout(self.shutdown_timeout, &mut server).await {
            Ok(result) => {
                flatten(result)?;
                info!(lifecycle = %Lifecycle::Stopped, "Server exited gracefully");
                Ok(())
            }
            Err(_) => {
                handle.shutdown();
                server.abort();
                error!(
                    lifecycle = %Lifecycle::Stopped,
                    connections = handle.connection_count(),
                    "Server forced to shutdown"
                );
                Err(ServerError::ShutdownTimeout(self.shutdown_timeout))
            }
        }
    }
}

fn flatten(result: Result<std::io::Result<()>, JoinError>) -> Result<(), ServerError> {
    Ok(result??)
}

/// Resolves on SIGINT or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
