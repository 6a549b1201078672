//! Page Units
//!
//! A page unit is the self-contained piece of UI bound to one route. Units
//! are fetched lazily through a [`PageLoader`] the first time their route is
//! visited and kept in a [`PageCache`] for the rest of the process.
//!
//! Loaders:
//! - [`ManifestPageLoader`] - chunks listed in the bundler's build manifest
//! - [`StaticPageLoader`] - pages held in memory

mod cache;
mod manifest;
mod memory;

pub use cache::{CacheStats, PageCache};
pub use manifest::ManifestPageLoader;
pub use memory::StaticPageLoader;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Deferred reference to a page unit, e.g. `views/MapView.vue`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(String);

impl PageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PageId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for PageId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A loaded page unit
#[derive(Debug, Clone)]
pub struct Page {
    pub id: PageId,
    /// Asset path relative to the dist directory
    pub asset: String,
    pub content: Vec<u8>,
    pub loaded_at: DateTime<Utc>,
}

impl Page {
    pub fn new(id: PageId, asset: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            id,
            asset: asset.into(),
            content,
            loaded_at: Utc::now(),
        }
    }

    pub fn size(&self) -> usize {
        self.content.len()
    }
}

/// Source of page units
#[async_trait]
pub trait PageLoader: Send + Sync {
    /// Fetch and instantiate a page unit
    async fn load(&self, id: &PageId) -> Result<Page, PageLoadError>;
}

/// Errors raised while lazily loading a page unit
///
/// All variants are recoverable: the cache does not remember failures, so a
/// later navigation retries the load.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PageLoadError {
    /// Loader has no page with this id
    #[error("Unknown page unit: {0}")]
    Unknown(PageId),

    /// Build manifest has no chunk for this page
    #[error("Page unit {0} is not listed in the build manifest")]
    NotInManifest(PageId),

    /// Build manifest missing or unreadable
    #[error("Invalid build manifest {path:?}: {error}")]
    Manifest { path: PathBuf, error: String },

    /// Chunk file could not be read
    #[error("Failed to read page asset {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    /// Loader transport failed
    #[error("Page unit unavailable: {0}")]
    Unavailable(String),
}

/// Result type alias for page loading
pub type PageResult<T> = Result<T, PageLoadError>;
