//! Development Server
//!
//! Serves the dashboard like the production host, but first checks each
//! request against the configured proxy rules. Matching requests go to the
//! backend (HTTP forwarded, WebSocket upgrades tunnelled); everything else
//! falls through to the SPA document handlers.
//!
//! # Default rules
//!
//! - `/api/*` -> `http://localhost:8000/*` (prefix stripped)
//! - `/ws/*` -> `ws://localhost:8000/ws/*`

pub mod open;
pub mod proxy;
pub mod ws;

pub use proxy::ProxyTarget;

use axum::{
    extract::{Request, State},
    response::{IntoResponse, Response},
    Router,
};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::config::DevConfig;
use crate::server::{self, spa, HostError, HostResult, HostState};

/// Shared state for the development server
pub struct DevState {
    pub host: HostState,
    targets: Vec<ProxyTarget>,
    client: Client,
    timeout: Duration,
    max_body_bytes: usize,
}

impl DevState {
    pub fn new(host: HostState, config: &DevConfig) -> HostResult<Self> {
        let targets = config
            .proxy
            .iter()
            .map(ProxyTarget::compile)
            .collect::<HostResult<Vec<_>>>()?;
        let timeout = Duration::from_secs(config.proxy_timeout_secs);
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| HostError::Internal(format!("Failed to build proxy client: {}", e)))?;

        Ok(Self {
            host,
            targets,
            client,
            timeout,
            max_body_bytes: config.max_body_bytes,
        })
    }

    pub fn targets(&self) -> &[ProxyTarget] {
        &self.targets
    }

    /// First rule whose prefix covers the path
    pub fn target_for(&self, path: &str) -> Option<&ProxyTarget> {
        self.targets.iter().find(|t| t.matches(path))
    }
}

/// Build the development router
pub fn build_dev_router(state: DevState) -> Router {
    let assets = ServeDir::new(state.host.assets_dir());
    let assets_prefix = state.host.assets_prefix();

    Router::new()
        .nest_service(&assets_prefix, assets)
        .fallback(dispatch)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

async fn dispatch(State(state): State<Arc<DevState>>, request: Request) -> Response {
    let Some(target) = state.target_for(request.uri().path()) else {
        return spa::serve_request(&state.host, request).await;
    };

    let (parts, body) = request.into_parts();
    let result = if target.tunnels_websockets() && ws::is_upgrade(&parts) {
        ws::tunnel(target, parts, state.timeout).await
    } else {
        let request = Request::from_parts(parts, body);
        proxy::forward(&state.client, target, request, state.max_body_bytes).await
    };

    result.unwrap_or_else(IntoResponse::into_response)
}

/// Start the development server
pub async fn run(state: DevState, config: &DevConfig) -> HostResult<()> {
    state.host.check_dist();
    for target in state.targets() {
        tracing::info!(
            prefix = %target.prefix(),
            target = %target.target(),
            ws = target.tunnels_websockets(),
            "Proxy rule"
        );
    }

    let listener = server::bind(&config.addr()).await?;
    let host = match config.host.as_str() {
        "0.0.0.0" | "::" => "localhost",
        host => host,
    };
    let url = format!(
        "http://{}:{}{}",
        host,
        listener.local_addr()?.port(),
        state.host.table.base()
    );
    tracing::info!(url = %url, "Dev server ready");

    if config.open {
        if let Err(e) = open::open_browser(&url) {
            tracing::warn!(error = %e, "Could not open browser");
        }
    }

    server::serve(listener, build_dev_router(state)).await
}
