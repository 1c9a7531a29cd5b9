//! Bounded search and navigation histories for interactive sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tcq_core::SearchKind;

pub const SEARCH_HISTORY_LIMIT: usize = 50;
pub const NAVIGATION_HISTORY_LIMIT: usize = 100;

// ============================================================================
// SEARCH HISTORY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHistoryEntry {
    pub query: String,
    pub kind: SearchKind,
    pub result_count: u64,
    pub searched_at: DateTime<Utc>,
}

impl SearchHistoryEntry {
    pub fn new(query: impl Into<String>, kind: SearchKind, result_count: u64) -> Self {
        Self {
            query: query.into(),
            kind,
            result_count,
            searched_at: Utc::now(),
        }
    }
}

/// Past searches with a recall cursor.
///
/// Adding an entry moves the cursor onto it. A query equal to the most
/// recent one is ignored, whatever its kind.
#[derive(Debug, Clone)]
pub struct SearchHistory {
    entries: VecDeque<SearchHistoryEntry>,
    cursor: Option<usize>,
    limit: usize,
}

impl Default for SearchHistory {
    fn default() -> Self {
        Self::with_limit(SEARCH_HISTORY_LIMIT)
    }
}

impl SearchHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(limit.min(SEARCH_HISTORY_LIMIT)),
            cursor: None,
            limit: limit.max(1),
        }
    }

    pub fn add(&mut self, entry: SearchHistoryEntry) {
        if self.entries.back().is_some_and(|last| last.query == entry.query) {
            return;
        }
        if self.entries.len() == self.limit {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
        self.cursor = Some(self.entries.len() - 1);
    }

    /// Step the cursor back one entry. `None` at the oldest entry.
    pub fn previous(&mut self) -> Option<&SearchHistoryEntry> {
        let cursor = self.cursor.filter(|&c| c > 0)?;
        self.cursor = Some(cursor - 1);
        self.entries.get(cursor - 1)
    }

    /// Step the cursor forward one entry. `None` at the newest entry.
    pub fn next(&mut self) -> Option<&SearchHistoryEntry> {
        let cursor = self.cursor.filter(|&c| c + 1 < self.entries.len())?;
        self.cursor = Some(cursor + 1);
        self.entries.get(cursor + 1)
    }

    /// Oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &SearchHistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
    }
}

// ============================================================================
// NAVIGATION HISTORY
// ============================================================================

/// A browser-style back/forward stack.
///
/// Pushing discards everything ahead of the cursor. When the stack is full
/// the oldest entry is dropped.
#[derive(Debug, Clone)]
pub struct NavigationHistory<T> {
    entries: VecDeque<T>,
    cursor: Option<usize>,
    limit: usize,
}

impl<T> Default for NavigationHistory<T> {
    fn default() -> Self {
        Self::with_limit(NAVIGATION_HISTORY_LIMIT)
    }
}

impl<T> NavigationHistory<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            cursor: None,
            limit: limit.max(1),
        }
    }

    pub fn push(&mut self, entry: T) {
        let keep = self.cursor.map_or(0, |c| c + 1);
        self.entries.truncate(keep);
        self.entries.push_back(entry);
        if self.entries.len() > self.limit {
            self.entries.pop_front();
        }
        self.cursor = Some(self.entries.len() - 1);
    }

    pub fn can_go_back(&self) -> bool {
        self.cursor.is_some_and(|c| c > 0)
    }

    pub fn can_go_forward(&self) -> bool {
        self.cursor.is_some_and(|c| c + 1 < self.entries.len())
    }

    pub fn back(&mut self) -> Option<&T> {
        if !self.can_go_back() {
            return None;
        }
        let cursor = self.cursor? - 1;
        self.cursor = Some(cursor);
        self.entries.get(cursor)
    }

    pub fn forward(&mut self) -> Option<&T> {
        if !self.can_go_forward() {
            return None;
        }
        let cursor = self.cursor? + 1;
        self.cursor = Some(cursor);
        self.entries.get(cursor)
    }

    pub fn current(&self) -> Option<&T> {
        self.cursor.and_then(|c| self.entries.get(c))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
    }
}

// ============================================================================
// TESTS
// ============================================================================
