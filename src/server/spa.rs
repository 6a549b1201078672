//! SPA document handlers
//!
//! Every non-asset GET receives `index.html` so the client-side router can
//! take over. The status code tells routed paths (200) from unrouted ones
//! (404); the body is the same document in both cases and the client renders
//! its fallback page.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{Method, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::services::ServeFile;

use super::error::HostError;
use super::state::HostState;
use crate::routes::Resolution;

/// GET /health
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub route_table_version: u32,
    pub routes: usize,
    pub index_present: bool,
}

/// Service info returned at the root when no front-end is built
#[derive(Debug, Serialize)]
pub struct InfoResponse {
    pub message: &'static str,
    pub websocket_endpoint: &'static str,
    pub routes: usize,
}

/// GET /health
pub async fn health(State(state): State<Arc<HostState>>) -> Json<HealthResponse> {
    let index_present = tokio::fs::metadata(state.index_path())
        .await
        .map(|m| m.is_file())
        .unwrap_or(false);

    Json(HealthResponse {
        status: if index_present { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.uptime_seconds(),
        route_table_version: state.table.version(),
        routes: state.table.len(),
        index_present,
    })
}

/// Router fallback
pub async fn spa_fallback(State(state): State<Arc<HostState>>, request: Request) -> Response {
    serve_request(&state, request).await
}

/// Serve a public file from the dist root, or the SPA document
pub async fn serve_request(state: &HostState, request: Request) -> Response {
    let method = request.method().clone();
    if method != Method::GET && method != Method::HEAD {
        return HostError::MethodNotAllowed(method.to_string()).into_response();
    }

    let path = request.uri().path().to_string();
    if let Some(file) = state.public_file(&path).await {
        return match ServeFile::new(file).oneshot(request).await {
            Ok(response) => response.map(Body::new),
            Err(never) => match never {},
        };
    }

    serve_document(state, &path).await
}

/// Return `index.html` for a client-side route
pub async fn serve_document(state: &HostState, path: &str) -> Response {
    let resolution = state.table.resolve(path);

    match tokio::fs::read_to_string(state.index_path()).await {
        Ok(html) => {
            let status = match &resolution {
                Resolution::Matched(_) => StatusCode::OK,
                Resolution::NotFound { path } => {
                    tracing::debug!(path = %path, "Serving document for unrouted path");
                    StatusCode::NOT_FOUND
                }
            };
            (status, Html(html)).into_response()
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            if resolution.route_name() == Some("home") {
                Json(InfoResponse {
                    message: "AGV Monitor API",
                    websocket_endpoint: "/ws/robot-status",
                    routes: state.table.len(),
                })
                .into_response()
            } else {
                HostError::NotFound(path.to_string()).into_response()
            }
        }
        Err(e) => HostError::Io(e).into_response(),
    }
}

