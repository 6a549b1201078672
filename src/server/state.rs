//! Host State
//!
//! Shared state for the SPA host handlers.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::routes::RouteTable;
use crate::shell::document_has_mount_point;

/// Shared state for all host handlers
#[derive(Clone)]
pub struct HostState {
    /// Route table used to tell routed paths from misses
    pub table: Arc<RouteTable>,
    /// Built front-end
    pub dist_dir: PathBuf,
    /// Element id the document must contain
    pub mount_id: String,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl HostState {
    pub fn new(
        table: Arc<RouteTable>,
        dist_dir: impl Into<PathBuf>,
        mount_id: impl Into<String>,
    ) -> Self {
        Self {
            table,
            dist_dir: dist_dir.into(),
            mount_id: mount_id.into(),
            start_time: Instant::now(),
        }
    }

    pub fn index_path(&self) -> PathBuf {
        self.dist_dir.join("index.html")
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.dist_dir.join("assets")
    }

    /// URL prefix assets are served under
    pub fn assets_prefix(&self) -> String {
        match self.table.base() {
            "/" => "/assets".to_string(),
            base => format!("{}/assets", base),
        }
    }

    /// Log what the dist directory looks like; the host still starts if it is empty
    pub fn check_dist(&self) -> bool {
        let index = self.index_path();
        match std::fs::read_to_string(&index) {
            Ok(html) => {
                if !document_has_mount_point(&html, &self.mount_id) {
                    tracing::warn!(
                        index = %index.display(),
                        mount_id = %self.mount_id,
                        "index.html has no mount element"
                    );
                }
                true
            }
            Err(e) => {
                tracing::warn!(
                    index = %index.display(),
                    error = %e,
                    "No built front-end found, serving API info only"
                );
                false
            }
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Map a request path to a file in the dist root, if one exists
    ///
    /// Only paths whose last segment has an extension are considered; hidden
    /// files and parent references are refused.
    pub async fn public_file(&self, path: &str) -> Option<PathBuf> {
        let base = self.table.base();
        let rel = if base == "/" {
            path
        } else {
            let rest = path.strip_prefix(base)?;
            if !rest.is_empty() && !rest.starts_with('/') {
                return None;
            }
            rest
        };
        let rel = rel.trim_start_matches('/');

        let last = rel.rsplit('/').next()?;
        if rel.is_empty() || !last.contains('.') {
            return None;
        }
        if rel
            .split('/')
            .any(|seg| seg.is_empty() || seg.starts_with('.'))
        {
            return None;
        }

        let candidate = Path::new(&self.dist_dir).join(rel);
        match tokio::fs::metadata(&candidate).await {
            Ok(meta) if meta.is_file() => Some(candidate),
            _ => None,
        }
    }
}
