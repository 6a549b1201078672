//! In-memory page loader

use async_trait::async_trait;
use std::collections::HashMap;

use super::{Page, PageId, PageLoadError, PageLoader};

/// Loader backed by a fixed set of pages held in memory
#[derive(Debug, Clone, Default)]
pub struct StaticPageLoader {
    pages: HashMap<PageId, (String, Vec<u8>)>,
}

impl StaticPageLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a page with its asset name and content
    pub fn with_page(
        mut self,
        id: impl Into<PageId>,
        asset: impl Into<String>,
        content: impl Into<Vec<u8>>,
    ) -> Self {
        self.pages.insert(id.into(), (asset.into(), content.into()));
        self
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

#[async_trait]
impl PageLoader for StaticPageLoader {
    async fn load(&self, id: &PageId) -> Result<Page, PageLoadError> {
        let (asset, content) = self
            .pages
            .get(id)
            .ok_or_else(|| PageLoadError::Unknown(id.clone()))?;
        Ok(Page::new(id.clone(), asset.clone(), content.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_loader() {
        let loader = StaticPageLoader::new().with_page("views/Home.vue", "assets/Home.js", "home");
        assert_eq!(loader.len(), 1);

        let page = loader.load(&PageId::from("views/Home.vue")).await.unwrap();
        assert_eq!(page.asset, "assets/Home.js");
        assert_eq!(page.content, b"home".to_vec());

        let err = loader.load(&PageId::from("views/Map.vue")).await.unwrap_err();
        assert_eq!(err, PageLoadError::Unknown(PageId::from("views/Map.vue")));
    }
}
