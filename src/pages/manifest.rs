//! Build-manifest page loader
//!
//! The front-end bundler writes `<dist>/.vite/manifest.json`, mapping each
//! source module to the chunk it was compiled into:
//!
//! ```json
//! {
//!   "src/views/MapView.vue": {
//!     "file": "assets/MapView-4f1c2a.js",
//!     "src": "src/views/MapView.vue",
//!     "isDynamicEntry": true
//!   }
//! }
//! ```
//!
//! Page ids are looked up as `src/<id>` first, then as `<id>`.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::OnceCell;

use super::{Page, PageId, PageLoadError, PageLoader};

#[derive(Debug, Clone, Deserialize)]
struct ManifestChunk {
    file: String,
    #[serde(default)]
    src: Option<String>,
    #[serde(default, rename = "isDynamicEntry")]
    is_dynamic_entry: bool,
}

/// Loads page chunks from a built dist directory
pub struct ManifestPageLoader {
    dist_dir: PathBuf,
    manifest: OnceCell<HashMap<String, ManifestChunk>>,
}

impl ManifestPageLoader {
    pub fn new(dist_dir: impl Into<PathBuf>) -> Self {
        Self {
            dist_dir: dist_dir.into(),
            manifest: OnceCell::new(),
        }
    }

    pub fn dist_dir(&self) -> &Path {
        &self.dist_dir
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dist_dir.join(".vite").join("manifest.json")
    }

    /// Read and parse the manifest once; failures are retried on next call
    async fn manifest(&self) -> Result<&HashMap<String, ManifestChunk>, PageLoadError> {
        self.manifest
            .get_or_try_init(|| async {
                let path = self.manifest_path();
                let raw = tokio::fs::read_to_string(&path).await.map_err(|e| {
                    PageLoadError::Manifest {
                        path: path.clone(),
                        error: e.to_string(),
                    }
                })?;
                let manifest: HashMap<String, ManifestChunk> = serde_json::from_str(&raw)
                    .map_err(|e| PageLoadError::Manifest {
                        path: path.clone(),
                        error: e.to_string(),
                    })?;

                let dynamic = manifest.values().filter(|c| c.is_dynamic_entry).count();
                tracing::info!(
                    path = %path.display(),
                    chunks = manifest.len(),
                    dynamic_entries = dynamic,
                    "Loaded build manifest"
                );
                Ok::<_, PageLoadError>(manifest)
            })
            .await
    }
}

fn lookup<'a>(
    manifest: &'a HashMap<String, ManifestChunk>,
    id: &PageId,
) -> Option<&'a ManifestChunk> {
    manifest
        .get(&format!("src/{}", id))
        .or_else(|| manifest.get(id.as_str()))
        .or_else(|| {
            manifest
                .values()
                .find(|c| c.src.as_deref().is_some_and(|s| s.ends_with(id.as_str())))
        })
}

#[async_trait]
impl PageLoader for ManifestPageLoader {
    async fn load(&self, id: &PageId) -> Result<Page, PageLoadError> {
        let manifest = self.manifest().await?;
        let chunk = lookup(manifest, id).ok_or_else(|| PageLoadError::NotInManifest(id.clone()))?;

        let path = self.dist_dir.join(&chunk.file);
        let content = tokio::fs::read(&path).await.map_err(|e| PageLoadError::Io {
            path: path.clone(),
            error: e.to_string(),
        })?;

        tracing::debug!(page = %id, asset = %chunk.file, bytes = content.len(), "Page unit loaded");
        Ok(Page::new(id.clone(), chunk.file.clone(), content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_dist(dir: &Path) {
        std::fs::create_dir_all(dir.join(".vite")).unwrap();
        std::fs::create_dir_all(dir.join("assets")).unwrap();
        std::fs::write(
            dir.join(".vite/manifest.json"),
            r#"{
                "index.html": {"file": "assets/index-1a2b.js", "src": "index.html", "isEntry": true},
                "src/views/MapView.vue": {"file": "assets/MapView-4f1c.js", "src": "src/views/MapView.vue", "isDynamicEntry": true},
                "src/views/Broken.vue": {"file": "assets/Broken-0000.js", "src": "src/views/Broken.vue", "isDynamicEntry": true}
            }"#,
        )
        .unwrap();
        std::fs::write(dir.join("assets/MapView-4f1c.js"), "export default {}").unwrap();
    }

    #[tokio::test]
    async fn test_load_from_manifest() {
        let dir = tempdir().unwrap();
        write_dist(dir.path());

        let loader = ManifestPageLoader::new(dir.path());
        let page = loader.load(&PageId::from("views/MapView.vue")).await.unwrap();

        assert_eq!(page.asset, "assets/MapView-4f1c.js");
        assert_eq!(page.content, b"export default {}".to_vec());
    }

    #[tokio::test]
    async fn test_missing_page_and_chunk() {
        let dir = tempdir().unwrap();
        write_dist(dir.path());
        let loader = ManifestPageLoader::new(dir.path());

        let err = loader.load(&PageId::from("views/Home.vue")).await.unwrap_err();
        assert_eq!(err, PageLoadError::NotInManifest(PageId::from("views/Home.vue")));

        let err = loader.load(&PageId::from("views/Broken.vue")).await.unwrap_err();
        assert!(matches!(err, PageLoadError::Io { .. }));
    }

    #[tokio::test]
    async fn test_missing_manifest_then_recovered() {
        let dir = tempdir().unwrap();
        let loader = ManifestPageLoader::new(dir.path());

        let err = loader.load(&PageId::from("views/MapView.vue")).await.unwrap_err();
        assert!(matches!(err, PageLoadError::Manifest { .. }));

        write_dist(dir.path());
        assert!(loader.load(&PageId::from("views/MapView.vue")).await.is_ok());
    }
}
