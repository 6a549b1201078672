//! Navigation history stack

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One visited location
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub path: String,
    /// Route name, `None` for unrouted paths
    pub route: Option<String>,
    /// Navigation sequence number that produced the entry
    pub seq: u64,
    pub at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(path: impl Into<String>, route: Option<&str>, seq: u64) -> Self {
        Self {
            path: path.into(),
            route: route.map(str::to_string),
            seq,
            at: Utc::now(),
        }
    }
}

/// Browser-style history: a list of entries and a cursor
///
/// Pushing while the cursor is not at the end drops the forward entries.
#[derive(Debug, Default)]
pub struct History {
    entries: Vec<HistoryEntry>,
    cursor: Option<usize>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        if let Some(i) = self.cursor {
            self.entries.truncate(i + 1);
        }
        self.entries.push(entry);
        self.cursor = Some(self.entries.len() - 1);
    }

    /// Overwrite the current entry, or push if the history is empty
    pub fn replace(&mut self, entry: HistoryEntry) {
        match self.cursor {
            Some(i) => self.entries[i] = entry,
            None => self.push(entry),
        }
    }

    pub fn back(&mut self) -> Option<&HistoryEntry> {
        let i = self.cursor.filter(|&i| i > 0)?;
        self.cursor = Some(i - 1);
        self.entries.get(i - 1)
    }

    pub fn forward(&mut self) -> Option<&HistoryEntry> {
        let i = self.cursor.filter(|&i| i + 1 < self.entries.len())?;
        self.cursor = Some(i + 1);
        self.entries.get(i + 1)
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        self.cursor.and_then(|i| self.entries.get(i))
    }

    /// Update the current entry after a back/forward traversal re-resolved it
    pub(crate) fn touch(&mut self, seq: u64) {
        if let Some(entry) = self.cursor.and_then(|i| self.entries.get_mut(i)) {
            entry.seq = seq;
            entry.at = Utc::now();
        }
    }

    pub fn can_go_back(&self) -> bool {
        self.cursor.is_some_and(|i| i > 0)
    }

    pub fn can_go_forward(&self) -> bool {
        self.cursor.is_some_and(|i| i + 1 < self.entries.len())
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &str, seq: u64) -> HistoryEntry {
        HistoryEntry::new(path, None, seq)
    }

    #[test]
    fn test_push_back_forward() {
        let mut h = History::new();
        assert!(h.current().is_none());
        assert!(h.back().is_none());

        h.push(entry("/", 1));
        h.push(entry("/map", 2));
        h.push(entry("/service", 3));
        assert_eq!(h.current().unwrap().path, "/service");

        assert_eq!(h.back().unwrap().path, "/map");
        assert_eq!(h.back().unwrap().path, "/");
        assert!(h.back().is_none());
        assert!(h.can_go_forward());

        assert_eq!(h.forward().unwrap().path, "/map");
        assert_eq!(h.len(), 3);
    }

    #[test]
    fn test_push_truncates_forward_entries() {
        let mut h = History::new();
        h.push(entry("/", 1));
        h.push(entry("/map", 2));
        h.back();
        h.push(entry("/task-query", 3));

        assert_eq!(h.len(), 2);
        assert!(!h.can_go_forward());
        assert_eq!(h.current().unwrap().path, "/task-query");
    }

    #[test]
    fn test_replace() {
        let mut h = History::new();
        h.replace(entry("/", 1));
        assert_eq!(h.len(), 1);

        h.replace(entry("/map", 2));
        assert_eq!(h.len(), 1);
        assert_eq!(h.current().unwrap().path, "/map");
        assert!(!h.can_go_back());
    }
}
