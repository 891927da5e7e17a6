//! HTTP Basic authentication gate.

use crate::http_server::AppState;
use axum::{
    extract::{Request, State},
    http::{
        HeaderMap, StatusCode,
        header::{AUTHORIZATION, WWW_AUTHENTICATE},
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;
use tracing::warn;

/// Challenge sent with every 401
pub const BASIC_CHALLENGE: &str = r#"Basic realm="Restricted""#;

/// Credentials required to query the server
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// When false the gate is bypassed entirely
    pub enabled: bool,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("enabled", &self.enabled)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Decide whether a request carrying `headers` may proceed.
///
/// Username and password are both compared in constant time, and both
/// comparisons always run.
pub fn authorize(headers: &HeaderMap, config: &AuthConfig) -> bool {
    if !config.enabled {
        return true;
    }

    let Some((username, password)) = basic_credentials(headers) else {
        return false;
    };

    let user_match = username.as_bytes().ct_eq(config.username.as_bytes());
    let pass_match = password.as_bytes().ct_eq(config.password.as_bytes());
    bool::from(user_match & pass_match)
}

/// Extract `(username, password)` from an `Authorization: Basic` header
fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

/// 401 response with the Basic challenge
pub fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(WWW_AUTHENTICATE, BASIC_CHALLENGE)],
        "Unauthorized",
    )
        .into_response()
}

/// Middleware rejecting requests without valid credentials.
///
/// The wrapped handler is never invoked for a rejected request.
pub async fn require_basic_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if authorize(request.headers(), &state.auth) {
        return next.run(request).await;
    }

    warn!(path = %request.uri().path(), "Rejected request with missing or invalid credentials");
    if let Some(metrics) = &state.metrics {
        metrics.record_unauthorized();
    }
    unauthorized()
}
