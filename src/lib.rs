//! # AGV Monitor Web
//!
//! Client-side shell of the AGV monitoring dashboard: the route table that
//! maps browser paths to page units, lazy page loading with a per-process
//! cache, last-navigation-wins navigation, and the servers that deliver the
//! built dashboard.
//!
//! ## Modules
//!
//! - [`routes`]: Route table, path patterns and resolution
//! - [`pages`]: Page units, loaders and the page cache
//! - [`navigation`]: Navigator and history stack
//! - [`api`]: Backend API client with a fixed base path
//! - [`shell`]: Mounting the dashboard
//! - [`server`]: Production SPA host
//! - [`dev`]: Development server with backend proxy (feature `dev-proxy`)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use agv_monitor_web::{ManifestPageLoader, RouteTable, Shell, ShellConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let loader = Arc::new(ManifestPageLoader::new("web/dist"));
//!     let shell = Shell::mount(ShellConfig::default(), RouteTable::canonical()?, loader)?;
//!
//!     let outcome = shell.start("/map").await?;
//!     println!("{:?}", outcome);
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
#[cfg(feature = "dev-proxy")]
pub mod dev;
pub mod logging;
pub mod navigation;
pub mod pages;
pub mod routes;
pub mod server;
pub mod shell;

pub use routes::{
    Resolution, RouteEntry, RouteError, RouteMatch, RouteResult, RouteTable, ROUTE_TABLE_VERSION,
};

pub use pages::{
    ManifestPageLoader, Page, PageCache, PageId, PageLoadError, PageLoader, StaticPageLoader,
};

pub use navigation::{History, NavTarget, NavigationOutcome, Navigator, RenderState};

pub use api::{ApiClient, ApiClientConfig, ApiClientError};

pub use shell::{Shell, ShellConfig, ShellError, Theme};

pub use server::{build_router, HostError, HostResult, HostState};

pub use config::{Config, ConfigError, DevConfig, HostConfig, LoggingConfig, ProxyRule};
