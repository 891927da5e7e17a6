//! HTTP surface: `/healthy` and the Prometheus `/metrics` endpoint.

use crate::auth::{AuthConfig, require_basic_auth};
use crate::config::Config;
use crate::metrics::MetricsRegistry;
use crate::types::HealthResponse;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use hostcheck::{CheckSuite, ServiceManager};
use prometheus_client::encoding::text::encode;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::warn;

/// State shared by every request. Everything in it is read-only except the
/// metric counters.
#[derive(Clone)]
pub struct AppState {
    pub suite: Arc<CheckSuite>,
    pub auth: Arc<AuthConfig>,
    pub metrics: Option<Arc<MetricsRegistry>>,
}

impl AppState {
    pub fn new(suite: CheckSuite, auth: AuthConfig, metrics: Option<MetricsRegistry>) -> Self {
        Self {
            suite: Arc::new(suite),
            auth: Arc::new(auth),
            metrics: metrics.map(Arc::new),
        }
    }

    /// Build the check suite and auth gate described by a validated config
    pub fn from_config(config: &Config, manager: Arc<dyn ServiceManager>) -> common::Result<Self> {
        let suite = CheckSuite::new(
            config.port_targets(),
            config.service_targets(),
            config.endpoint_targets(),
            manager,
            config.probe_timeouts(),
        )?;
        let metrics = config.config.metrics.enabled.then(MetricsRegistry::new);
        Ok(Self::new(suite, config.auth_config(), metrics))
    }
}

/// Build the router. Only `/healthy` sits behind the auth gate.
pub fn router(state: AppState) -> Router {
    let mut app = Router::new()
        .route("/healthy", get(healthy_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_basic_auth));

    if state.metrics.is_some() {
        app = app.route("/metrics", get(metrics_handler));
    }

    app.layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// Handler for /healthy: run every check for this request only
async fn healthy_handler(State(state): State<AppState>) -> Response {
    let report = state.suite.run().await;

    if let Some(metrics) = &state.metrics {
        metrics.record_report(&report);
    }

    let status = if report.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(HealthResponse::from_report(&report))).into_response()
}

/// Handler for /metrics endpoint
async fn metrics_handler(State(state): State<AppState>) -> Response {
    let Some(registry) = state.metrics else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let mut buffer = String::new();
    if let Err(e) = encode(&mut buffer, &registry.registry) {
        warn!(error = %e, "Failed to encode metrics");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to encode metrics: {}", e),
        )
            .into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4")],
        buffer,
    )
        .into_response()
}
