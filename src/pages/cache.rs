//! Lazy page cache
//!
//! Each page id gets one slot. The first request for a page runs the loader;
//! requests that arrive while that load is in flight wait on the same slot
//! instead of loading again. A failed load leaves the slot empty.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::OnceCell;

use super::{Page, PageId, PageLoadError, PageLoader};

type Slot = Arc<OnceCell<Arc<Page>>>;

/// Process-lifetime cache of loaded page units
pub struct PageCache {
    loader: Arc<dyn PageLoader>,
    slots: RwLock<HashMap<PageId, Slot>>,
    loads: AtomicU64,
    failures: AtomicU64,
}

/// Cache counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct CacheStats {
    /// Loader invocations, successful or not
    pub loads: u64,
    /// Loader invocations that failed
    pub failures: u64,
    /// Pages currently held
    pub cached: usize,
}

impl PageCache {
    pub fn new(loader: Arc<dyn PageLoader>) -> Self {
        Self {
            loader,
            slots: RwLock::new(HashMap::new()),
            loads: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    /// Cached page, without loading
    pub fn get(&self, id: &PageId) -> Option<Arc<Page>> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        slots.get(id).and_then(|slot| slot.get().cloned())
    }

    pub fn is_cached(&self, id: &PageId) -> bool {
        self.get(id).is_some()
    }

    /// Return the page, loading it on first use
    pub async fn load(&self, id: &PageId) -> Result<Arc<Page>, PageLoadError> {
        if let Some(page) = self.get(id) {
            return Ok(page);
        }

        let slot = self.slot(id);
        let page = slot
            .get_or_try_init(|| async {
                self.loads.fetch_add(1, Ordering::Relaxed);
                match self.loader.load(id).await {
                    Ok(page) => {
                        tracing::debug!(page = %id, bytes = page.size(), "Page unit cached");
                        Ok(Arc::new(page))
                    }
                    Err(e) => {
                        self.failures.fetch_add(1, Ordering::Relaxed);
                        tracing::warn!(page = %id, error = %e, "Page unit load failed");
                        Err(e)
                    }
                }
            })
            .await?;

        Ok(Arc::clone(page))
    }

    pub fn stats(&self) -> CacheStats {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        CacheStats {
            loads: self.loads.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            cached: slots.values().filter(|s| s.initialized()).count(),
        }
    }

    fn slot(&self, id: &PageId) -> Slot {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(id.clone()).or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    /// Counts loads, sleeps, and fails the first `fail_first` calls
    struct CountingLoader {
        calls: AtomicUsize,
        fail_first: usize,
        delay: Duration,
    }

    impl CountingLoader {
        fn new(fail_first: usize, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail_first,
                delay,
            })
        }
    }

    #[async_trait]
    impl PageLoader for CountingLoader {
        async fn load(&self, id: &PageId) -> Result<Page, PageLoadError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if call < self.fail_first {
                return Err(PageLoadError::Unavailable("network down".to_string()));
            }
            Ok(Page::new(id.clone(), format!("assets/{}.js", id), b"page".to_vec()))
        }
    }

    #[tokio::test]
    async fn test_second_load_is_cache_hit() {
        let loader = CountingLoader::new(0, Duration::ZERO);
        let cache = PageCache::new(loader.clone());
        let id = PageId::from("views/MapView.vue");

        assert!(cache.get(&id).is_none());
        let first = cache.load(&id).await.unwrap();
        let second = cache.load(&id).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(cache.get(&id).is_some());
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            cache.stats(),
            CacheStats {
                loads: 1,
                failures: 0,
                cached: 1
            }
        );
    }

    #[tokio::test]
    async fn test_concurrent_loads_share_one_fetch() {
        let loader = CountingLoader::new(0, Duration::from_millis(20));
        let cache = Arc::new(PageCache::new(loader.clone()));
        let id = PageId::from("views/Home.vue");

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let id = id.clone();
                tokio::spawn(async move { cache.load(&id).await })
            })
            .collect();

        for task in tasks {
            assert!(task.await.unwrap().is_ok());
        }
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let loader = CountingLoader::new(1, Duration::ZERO);
        let cache = PageCache::new(loader.clone());
        let id = PageId::from("views/TaskQueryView.vue");

        let err = cache.load(&id).await.unwrap_err();
        assert_eq!(err, PageLoadError::Unavailable("network down".to_string()));
        assert!(!cache.is_cached(&id));

        assert!(cache.load(&id).await.is_ok());
        assert_eq!(loader.calls.load(Ordering::SeqCst), 2);

        let stats = cache.stats();
        assert_eq!(stats.loads, 2);
        assert_eq!(stats.failures, 1);
        assert_eq!(stats.cached, 1);
    }
}
