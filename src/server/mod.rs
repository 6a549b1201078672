//! SPA Host
//!
//! Production server for the built dashboard, built with Axum.
//!
//! # Endpoints
//!
//! - `GET /health` - Host status
//! - `GET /assets/*` - Bundled chunks and styles
//! - `GET /<file.ext>` - Public files in the dist root (favicon, robots.txt)
//! - `GET /*` - `index.html`; 200 for routed paths, 404 otherwise
//!
//! With no `index.html` in the dist directory, `/` answers with a JSON info
//! document and every other path with a JSON 404.
//!
//! The backend API is not proxied here; production deployments put the
//! dashboard and backend behind the same origin.

pub mod error;
pub mod spa;
pub mod state;

pub use error::{HostError, HostResult};
pub use state::HostState;

use axum::{routing::get, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::config::HostConfig;

/// Build the SPA host router
pub fn build_router(state: HostState) -> Router {
    let assets = ServeDir::new(state.assets_dir());
    let assets_prefix = state.assets_prefix();
    let shared_state = Arc::new(state);

    Router::new()
        .route("/health", get(spa::health))
        .nest_service(&assets_prefix, assets)
        .fallback(spa::spa_fallback)
        .layer(TraceLayer::new_for_http())
        .with_state(shared_state)
}

/// Bind a listener, logging the address
pub async fn bind(addr: &str) -> HostResult<TcpListener> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);
    Ok(listener)
}

/// Serve a router until Ctrl+C or SIGTERM
pub async fn serve(listener: TcpListener, router: Router) -> HostResult<()> {
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| HostError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Start the production host
pub async fn run(state: HostState, config: &HostConfig) -> HostResult<()> {
    state.check_dist();
    tracing::info!(
        dist = %state.dist_dir.display(),
        routes = state.table.len(),
        "Starting dashboard host"
    );

    let listener = bind(&config.addr()).await?;
    serve(listener, build_router(state)).await
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::RouteTable;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tempfile::tempdir;
    use tower::util::ServiceExt;

    const INDEX: &str = r#"<!doctype html><html><body><div id="app"></div></body></html>"#;

    fn create_dist() -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("assets")).unwrap();
        std::fs::write(dir.path().join("index.html"), INDEX).unwrap();
        std::fs::write(dir.path().join("assets/index-1a2b.js"), "console.log(1)").unwrap();
        std::fs::write(dir.path().join("favicon.ico"), [0u8, 1, 2]).unwrap();
        dir
    }

    fn create_test_app(dist: &std::path::Path) -> Router {
        let table = Arc::new(RouteTable::canonical().unwrap());
        build_router(HostState::new(table, dist, "app"))
    }

    async fn fetch(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    #[tokio::test]
    async fn test_routed_paths_get_document() {
        let dist = create_dist();

        for uri in ["/", "/service/build_from_raw", "/task-query?robot=1", "/map/"] {
            let (status, body) = fetch(create_test_app(dist.path()), uri).await;
            assert_eq!(status, StatusCode::OK, "{}", uri);
            assert_eq!(body, INDEX);
        }
    }

    #[tokio::test]
    async fn test_unrouted_path_gets_document_with_404() {
        let dist = create_dist();
        let (status, body) = fetch(create_test_app(dist.path()), "/does-not-exist").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, INDEX);
    }

    #[tokio::test]
    async fn test_assets_and_public_files() {
        let dist = create_dist();

        let (status, body) = fetch(create_test_app(dist.path()), "/assets/index-1a2b.js").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "console.log(1)");

        let (status, _) = fetch(create_test_app(dist.path()), "/assets/missing.js").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = fetch(create_test_app(dist.path()), "/favicon.ico").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_no_dist_serves_info() {
        let dir = tempdir().unwrap();

        let (status, body) = fetch(create_test_app(dir.path()), "/").await;
        assert_eq!(status, StatusCode::OK);
        let info: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(info["websocket_endpoint"], "/ws/robot-status");
        assert_eq!(info["message"], "AGV Monitor API");

        let (status, body) = fetch(create_test_app(dir.path()), "/map").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let err: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(err["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_health() {
        let dist = create_dist();
        let (status, body) = fetch(create_test_app(dist.path()), "/health").await;

        assert_eq!(status, StatusCode::OK);
        let health: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(health["status"], "healthy");
        assert_eq!(health["routes"], 8);
        assert_eq!(health["route_table_version"], 2);
    }

    #[tokio::test]
    async fn test_post_is_rejected() {
        let dist = create_dist();
        let response = create_test_app(dist.path())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/map")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_base_prefix() {
        let dist = create_dist();
        let table = Arc::new(
            RouteTable::canonical()
                .unwrap()
                .with_base("/console")
                .unwrap(),
        );
        let app = || build_router(HostState::new(Arc::clone(&table), dist.path(), "app"));

        let (status, _) = fetch(app(), "/console/map").await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = fetch(app(), "/console/assets/index-1a2b.js").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "console.log(1)");

        let (status, _) = fetch(app(), "/map").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
