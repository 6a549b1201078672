//! Navigator
//!
//! Turns navigation requests into history updates and render states.
//!
//! Every navigation takes the next sequence number. A page that is not yet
//! cached is awaited; when the load completes its result is published only if
//! no newer navigation has started in the meantime. Abandoned loads keep
//! running and fill the cache, but their render is discarded.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;

use super::history::{History, HistoryEntry};
use crate::pages::{Page, PageCache, PageLoadError};
use crate::routes::{Resolution, RouteMatch, RouteResult, RouteTable};

/// Where to navigate
#[derive(Debug, Clone, PartialEq)]
pub enum NavTarget {
    /// A route by its unique name
    Named {
        name: String,
        params: HashMap<String, String>,
    },
    /// A literal browser path
    Path(String),
}

impl NavTarget {
    pub fn name(name: impl Into<String>) -> Self {
        NavTarget::Named {
            name: name.into(),
            params: HashMap::new(),
        }
    }

    pub fn path(path: impl Into<String>) -> Self {
        NavTarget::Path(path.into())
    }

    /// Add a route parameter; ignored for literal paths
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let NavTarget::Named { params, .. } = &mut self {
            params.insert(key.into(), value.into());
        }
        self
    }
}

/// What the mount point currently shows
#[derive(Debug, Clone)]
pub enum RenderState {
    /// Nothing navigated yet
    Idle,
    /// Waiting for a page unit to load
    Loading { seq: u64, path: String, route: String },
    Rendered {
        seq: u64,
        route: RouteMatch,
        page: Arc<Page>,
    },
    /// Unrouted path, with the fallback page when one is defined and loadable
    NotFound {
        seq: u64,
        path: String,
        fallback: Option<Arc<Page>>,
    },
    /// Page unit failed to load; navigating again retries
    Failed {
        seq: u64,
        path: String,
        route: String,
        error: PageLoadError,
    },
}

impl RenderState {
    pub fn seq(&self) -> u64 {
        match self {
            RenderState::Idle => 0,
            RenderState::Loading { seq, .. }
            | RenderState::Rendered { seq, .. }
            | RenderState::NotFound { seq, .. }
            | RenderState::Failed { seq, .. } => *seq,
        }
    }

    pub fn route_name(&self) -> Option<&str> {
        match self {
            RenderState::Loading { route, .. } | RenderState::Failed { route, .. } => Some(route),
            RenderState::Rendered { route, .. } => Some(&route.name),
            RenderState::Idle | RenderState::NotFound { .. } => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, RenderState::Loading { .. })
    }
}

/// Result of a single navigation
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationOutcome {
    /// Page rendered; `cached` when no load was needed
    Rendered { route: String, cached: bool },
    /// Unrouted path; fallback rendered
    NotFound { path: String },
    /// Page unit failed to load
    Failed(PageLoadError),
    /// A newer navigation started before this one finished
    Superseded { seq: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HistoryMode {
    Push,
    Replace,
    Traverse,
}

/// Resolves navigation requests against a route table and renders page units
pub struct Navigator {
    table: Arc<RouteTable>,
    pages: Arc<PageCache>,
    history: Mutex<History>,
    seq: AtomicU64,
    render: watch::Sender<RenderState>,
}

impl Navigator {
    pub fn new(table: Arc<RouteTable>, pages: Arc<PageCache>) -> Self {
        let (render, _) = watch::channel(RenderState::Idle);
        Self {
            table,
            pages,
            history: Mutex::new(History::new()),
            seq: AtomicU64::new(0),
            render,
        }
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    pub fn pages(&self) -> &PageCache {
        &self.pages
    }

    /// Navigate and push a history entry
    ///
    /// Fails only when a named target cannot be turned into a path; unrouted
    /// paths and page load failures are reported in the outcome.
    pub async fn navigate(&self, target: NavTarget) -> RouteResult<NavigationOutcome> {
        let path = self.target_path(target)?;
        Ok(self.visit(path, HistoryMode::Push).await)
    }

    /// Navigate and overwrite the current history entry
    pub async fn replace(&self, target: NavTarget) -> RouteResult<NavigationOutcome> {
        let path = self.target_path(target)?;
        Ok(self.visit(path, HistoryMode::Replace).await)
    }

    /// Step back in history; `None` at the first entry
    pub async fn back(&self) -> Option<NavigationOutcome> {
        let path = self.lock_history().back()?.path.clone();
        Some(self.visit(path, HistoryMode::Traverse).await)
    }

    /// Step forward in history; `None` at the last entry
    pub async fn forward(&self) -> Option<NavigationOutcome> {
        let path = self.lock_history().forward()?.path.clone();
        Some(self.visit(path, HistoryMode::Traverse).await)
    }

    pub fn current_path(&self) -> Option<String> {
        self.lock_history().current().map(|e| e.path.clone())
    }

    pub fn current_route(&self) -> Option<String> {
        self.lock_history().current().and_then(|e| e.route.clone())
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.lock_history().entries().to_vec()
    }

    /// Snapshot of the render state
    pub fn state(&self) -> RenderState {
        self.render.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RenderState> {
        self.render.subscribe()
    }

    /// Sequence number of the most recent navigation
    pub fn latest_seq(&self) -> u64 {
        self.seq.load(Ordering::SeqCst)
    }

    fn target_path(&self, target: NavTarget) -> RouteResult<String> {
        match target {
            NavTarget::Named { name, params } => self.table.href(&name, &params),
            NavTarget::Path(path) => Ok(path),
        }
    }

    async fn visit(&self, path: String, mode: HistoryMode) -> NavigationOutcome {
        let resolution = self.table.resolve(&path);

        let seq = {
            let mut history = self.lock_history();
            let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
            let entry = HistoryEntry::new(path.as_str(), resolution.route_name(), seq);
            match mode {
                HistoryMode::Push => history.push(entry),
                HistoryMode::Replace => history.replace(entry),
                HistoryMode::Traverse => history.touch(seq),
            }
            seq
        };

        tracing::debug!(seq, path = %path, route = ?resolution.route_name(), "Navigating");

        match resolution {
            Resolution::NotFound { path } => self.render_not_found(seq, path).await,
            Resolution::Matched(route) => self.render_route(seq, route).await,
        }
    }

    async fn render_not_found(&self, seq: u64, path: String) -> NavigationOutcome {
        let fallback = match self.table.fallback() {
            Some(id) => match self.pages.load(id).await {
                Ok(page) => Some(page),
                Err(e) => {
                    tracing::warn!(page = %id, error = %e, "Fallback page unavailable");
                    None
                }
            },
            None => None,
        };

        let state = RenderState::NotFound {
            seq,
            path: path.clone(),
            fallback,
        };
        if self.publish(seq, state) {
            NavigationOutcome::NotFound { path }
        } else {
            NavigationOutcome::Superseded { seq }
        }
    }

    async fn render_route(&self, seq: u64, route: RouteMatch) -> NavigationOutcome {
        let name = route.name.clone();

        if let Some(page) = self.pages.get(&route.page) {
            let state = RenderState::Rendered { seq, route, page };
            return if self.publish(seq, state) {
                NavigationOutcome::Rendered {
                    route: name,
                    cached: true,
                }
            } else {
                NavigationOutcome::Superseded { seq }
            };
        }

        self.publish(
            seq,
            RenderState::Loading {
                seq,
                path: route.path.clone(),
                route: name.clone(),
            },
        );

        match self.pages.load(&route.page).await {
            Ok(page) => {
                let state = RenderState::Rendered { seq, route, page };
                if self.publish(seq, state) {
                    NavigationOutcome::Rendered {
                        route: name,
                        cached: false,
                    }
                } else {
                    tracing::debug!(seq, route = %name, "Discarding superseded page load");
                    NavigationOutcome::Superseded { seq }
                }
            }
            Err(error) => {
                let state = RenderState::Failed {
                    seq,
                    path: route.path.clone(),
                    route: name,
                    error: error.clone(),
                };
                if self.publish(seq, state) {
                    NavigationOutcome::Failed(error)
                } else {
                    NavigationOutcome::Superseded { seq }
                }
            }
        }
    }

    /// Publish `state` only if `seq` is still the latest navigation
    ///
    /// The check runs under the watch channel's lock, so a stale result can
    /// never land after a newer navigation's state.
    fn publish(&self, seq: u64, state: RenderState) -> bool {
        self.render.send_if_modified(|current| {
            if self.seq.load(Ordering::SeqCst) != seq {
                return false;
            }
            *current = state;
            true
        })
    }

    fn lock_history(&self) -> std::sync::MutexGuard<'_, History> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
