use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::{logout::LogoutRequest, session, template::RenderError, AppState};

// ── Health ────────────────────────────────────────────────────────────────────

pub async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

// ── Logout ────────────────────────────────────────────────────────────────────

/// Serves the logout endpoint for every method; the flow itself dispatches
/// `HEAD` probes to the empty short-circuit branch.
pub async fn logout(State(state): State<AppState>, request: Request) -> Response {
    let req = LogoutRequest {
        method: request.method().clone(),
        server_name: server_name(request.headers()),
        session: session::session_token(request.headers()),
    };

    match state.flow.handle(&req) {
        Ok(outcome) if outcome.body.is_empty() => Response::builder()
            .status(outcome.status)
            .body(Body::empty())
            .unwrap(),
        Ok(outcome) => (outcome.status, Html(outcome.body)).into_response(),
        Err(e) => internal_error(e),
    }
}

/// Declared server name of the request, without any port portion.
///
/// The name is trusted as declared; the origin's port comes from the stored
/// preferences, never from the `Host` header.
fn server_name(headers: &HeaderMap) -> String {
    let host = headers
        .get(http::header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .unwrap_or("localhost");
    strip_port(host).to_owned()
}

fn strip_port(host: &str) -> &str {
    // Bracketed IPv6 literals keep their brackets.
    if host.starts_with('[') {
        return match host.find(']') {
            Some(close) => &host[..=close],
            None => host,
        };
    }
    match host.rsplit_once(':') {
        Some((name, port)) if !name.is_empty() && port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn internal_error(e: RenderError) -> Response {
    error!(error = %e, "logout page rendering failed");
    (StatusCode::INTERNAL_SERVER_ERROR, "page rendering failed").into_response()
}
