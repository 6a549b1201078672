//! Application shell
//!
//! Mounting wires the route table, page cache, navigator and API client
//! together and hands them back as one value. Nothing is registered globally;
//! whoever renders the dashboard receives the [`Shell`] explicitly.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::api::{ApiClient, ApiClientConfig, ApiClientError};
use crate::config::AppConfig;
use crate::navigation::{NavTarget, NavigationOutcome, Navigator};
use crate::pages::{PageCache, PageLoader};
use crate::routes::{RouteError, RouteTable};

/// UI theme handed to the widget layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Everything needed to mount the dashboard
#[derive(Debug, Clone)]
pub struct ShellConfig {
    pub mount_id: String,
    pub theme: Theme,
    pub base: String,
    pub api: ApiClientConfig,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self::from_app(&AppConfig::default())
    }
}

impl ShellConfig {
    pub fn from_app(app: &AppConfig) -> Self {
        Self {
            mount_id: app.mount_id.clone(),
            theme: app.theme,
            base: app.base.clone(),
            api: ApiClientConfig {
                origin: app.api_origin.clone(),
                base_path: app.api_base.clone(),
                ..Default::default()
            },
        }
    }
}

/// A mounted dashboard
pub struct Shell {
    config: ShellConfig,
    navigator: Arc<Navigator>,
    api: ApiClient,
}

impl Shell {
    /// Build the navigator and API client for a route table and page source
    pub fn mount(
        config: ShellConfig,
        table: RouteTable,
        loader: Arc<dyn PageLoader>,
    ) -> Result<Self, ShellError> {
        let id = config.mount_id.as_str();
        if id.is_empty() || id.contains(|c: char| c.is_whitespace() || c == '"' || c == '\'') {
            return Err(ShellError::InvalidMountPoint(config.mount_id.clone()));
        }

        let table = table.with_base(&config.base)?;
        let pages = Arc::new(PageCache::new(loader));
        let navigator = Arc::new(Navigator::new(Arc::new(table), pages));
        let api = ApiClient::new(&config.api)?;

        tracing::info!(
            mount_id = %config.mount_id,
            theme = ?config.theme,
            base = %config.base,
            api = %api.base_url(),
            routes = navigator.table().len(),
            "Dashboard mounted"
        );

        Ok(Self {
            config,
            navigator,
            api,
        })
    }

    /// Render the page for the browser's initial location
    pub async fn start(&self, initial_path: &str) -> Result<NavigationOutcome, ShellError> {
        Ok(self
            .navigator
            .navigate(NavTarget::path(initial_path))
            .await?)
    }

    pub fn navigator(&self) -> &Arc<Navigator> {
        &self.navigator
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn mount_id(&self) -> &str {
        &self.config.mount_id
    }

    pub fn theme(&self) -> Theme {
        self.config.theme
    }
}

/// Whether an HTML document contains the element the shell mounts into
///
/// Only a standalone `id` attribute counts; `data-id="app"` does not.
pub fn document_has_mount_point(html: &str, mount_id: &str) -> bool {
    let id = regex::escape(mount_id);
    let pattern = format!(r#"\sid\s*=\s*(?:"{id}"|'{id}')"#);
    Regex::new(&pattern)
        .map(|re| re.is_match(html))
        .unwrap_or(false)
}

/// Mounting errors
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("Invalid mount point id: {0:?}")]
    InvalidMountPoint(String),

    #[error("Route error: {0}")]
    Route(#[from] RouteError),

    #[error("API client error: {0}")]
    Api(#[from] ApiClientError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::StaticPageLoader;

    fn loader() -> Arc<dyn PageLoader> {
        Arc::new(
            StaticPageLoader::new()
                .with_page("views/Home.vue", "assets/Home.js", "home")
                .with_page("views/MapView.vue", "assets/MapView.js", "map"),
        )
    }

    #[tokio::test]
    async fn test_mount_and_start() {
        let shell = Shell::mount(
            ShellConfig::default(),
            RouteTable::canonical().unwrap(),
            loader(),
        )
        .unwrap();

        assert_eq!(shell.mount_id(), "app");
        assert_eq!(shell.theme(), Theme::Light);
        assert_eq!(shell.api().base_url(), "http://localhost:3000/api");

        let outcome = shell.start("/").await.unwrap();
        assert!(matches!(outcome, NavigationOutcome::Rendered { .. }));
        assert_eq!(shell.navigator().current_route().as_deref(), Some("home"));
    }

    #[tokio::test]
    async fn test_mount_under_base() {
        let config = ShellConfig {
            base: "/console".to_string(),
            ..Default::default()
        };
        let shell = Shell::mount(config, RouteTable::canonical().unwrap(), loader()).unwrap();

        shell
            .navigator()
            .navigate(NavTarget::name("map"))
            .await
            .unwrap();
        assert_eq!(
            shell.navigator().current_path().as_deref(),
            Some("/console/map")
        );
    }

    #[test]
    fn test_rejects_bad_mount_id() {
        let config = ShellConfig {
            mount_id: "my app".to_string(),
            ..Default::default()
        };
        let result = Shell::mount(config, RouteTable::canonical().unwrap(), loader());
        assert!(matches!(result, Err(ShellError::InvalidMountPoint(_))));
    }

    #[test]
    fn test_document_has_mount_point() {
        let html = r#"<body><div id="app"></div><script type="module" src="/assets/index.js"></script></body>"#;
        assert!(document_has_mount_point(html, "app"));
        assert!(!document_has_mount_point(html, "root"));
        assert!(document_has_mount_point("<div id='root'></div>", "root"));
        assert!(document_has_mount_point("<div\n  id = \"app\"></div>", "app"));
    }

    #[test]
    fn test_mount_point_ignores_lookalike_attributes() {
        assert!(!document_has_mount_point(r#"<div data-id="app"></div>"#, "app"));
        assert!(!document_has_mount_point(r#"<div aria-describedby-id="app"></div>"#, "app"));
        assert!(!document_has_mount_point(r#"<p>id="app"</p>"#, "app"));
        assert!(!document_has_mount_point(r#"<div id="app2"></div>"#, "app"));
        assert!(document_has_mount_point(r#"<div class="x" id="a.b"></div>"#, "a.b"));
        assert!(!document_has_mount_point(r#"<div id="axb"></div>"#, "a.b"));
    }
}
