// SPDX-FileCopyrightText: 2026 Todosync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query parameter state: search text (raw and debounced), completion
//! filter, and page.
//!
//! Pure state; nothing here touches the network. Time is passed in by the
//! caller so the debounce can be driven by a timer or stepped in tests.

use std::time::Duration;

use todosync_core::{CompletionFilter, TodoError};
use tokio::time::Instant;

/// The fields that drive a fetch. Two equal values produce the same query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParams {
    /// Debounced search text; empty means no search filter.
    pub search: String,
    pub filter: CompletionFilter,
    /// One based.
    pub page: usize,
    pub page_size: usize,
}

impl QueryParams {
    /// Zero-based offset of the first row of [`page`](Self::page).
    pub fn offset(&self) -> usize {
        self.page.saturating_sub(1) * self.page_size
    }
}

/// Search, filter and pagination state with a restartable search debounce.
#[derive(Debug, Clone)]
pub struct QueryState {
    search_raw: String,
    search_debounced: String,
    filter: CompletionFilter,
    page: usize,
    page_size: usize,
    debounce: Duration,
    /// Time of the last keystroke not yet folded into `search_debounced`.
    pending_since: Option<Instant>,
}

impl QueryState {
    pub fn new(page_size: usize, debounce: Duration) -> Self {
        Self {
            search_raw: String::new(),
            search_debounced: String::new(),
            filter: CompletionFilter::All,
            page: 1,
            page_size: page_size.max(1),
            debounce,
            pending_since: None,
        }
    }

    pub fn search_raw(&self) -> &str {
        &self.search_raw
    }

    pub fn search_debounced(&self) -> &str {
        &self.search_debounced
    }

    pub fn filter(&self) -> CompletionFilter {
        self.filter
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// The effective parameters for the next fetch.
    pub fn params(&self) -> QueryParams {
        QueryParams {
            search: self.search_debounced.trim().to_string(),
            filter: self.filter,
            page: self.page,
            page_size: self.page_size,
        }
    }

    /// Records a keystroke. Any pending debounce restarts from `now`.
    pub fn set_search(&mut self, text: impl Into<String>, now: Instant) {
        self.search_raw = text.into();
        self.pending_since = Some(now);
    }

    /// When the pending debounce fires, if one is pending.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending_since.map(|since| since + self.debounce)
    }

    /// Folds the raw search into the debounced one once the quiet period
    /// has elapsed.
    ///
    /// Returns true when `search_debounced` changed, in which case the page
    /// is back to 1.
    pub fn poll_debounce(&mut self, now: Instant) -> bool {
        match self.deadline() {
            Some(deadline) if now >= deadline => {
                self.pending_since = None;
                self.commit_search()
            }
            _ => false,
        }
    }

    /// Applies the raw search immediately, cancelling the pending debounce.
    pub fn flush_search(&mut self) -> bool {
        self.pending_since = None;
        self.commit_search()
    }

    /// Surrounding whitespace never reaches the query, so it is not a change.
    fn commit_search(&mut self) -> bool {
        if self.search_raw.trim() == self.search_debounced.trim() {
            return false;
        }
        self.search_debounced = self.search_raw.clone();
        self.page = 1;
        true
    }

    /// Sets the completion filter and resets the page to 1.
    ///
    /// Returns true when the effective parameters changed.
    pub fn set_filter(&mut self, filter: CompletionFilter) -> bool {
        let changed = self.filter != filter || self.page != 1;
        self.filter = filter;
        self.page = 1;
        changed
    }

    /// Sets the page without touching search or filter.
    ///
    /// Returns true when the page changed.
    pub fn set_page(&mut self, page: usize) -> Result<bool, TodoError> {
        if page == 0 {
            return Err(TodoError::Validation("page numbers start at 1".to_string()));
        }
        let changed = self.page != page;
        self.page = page;
        Ok(changed)
    }

    /// Moves one page back. Returns false on the first page.
    pub(crate) fn step_back(&mut self) -> bool {
        if self.page <= 1 {
            return false;
        }
        self.page -= 1;
        true
    }

    /// Back to the first page of an unfiltered, unsearched view.
    pub fn reset(&mut self) {
        *self = Self::new(self.page_size, self.debounce);
    }
}
