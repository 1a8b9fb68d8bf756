// SPDX-FileCopyrightText: 2026 Todosync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Todo fetch controller.
//!
//! Turns a session plus [`QueryParams`] into an owner-scoped [`TodoQuery`],
//! runs it, and applies the result to the cache only if no newer fetch was
//! started in the meantime. Every [`begin`](FetchController::begin) bumps a
//! generation counter; a completion carrying an older generation is stale
//! and dropped.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use todosync_core::{ResultPage, Session, SortOrder, TodoError, TodoQuery, TodoStore, UserId};
use tracing::{debug, warn};

use crate::cache::TodoCache;
use crate::query::QueryParams;

/// Identifies one fetch request for stale-response suppression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
}

/// What happened to a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The result replaced the cache.
    Applied,
    /// A newer request superseded this one; its result was dropped.
    Stale,
    /// Nothing to fetch (no session, or parameters unchanged).
    Skipped,
}

/// Issues scoped reads against the record store.
pub struct FetchController {
    store: Arc<dyn TodoStore>,
    order: SortOrder,
    generation: AtomicU64,
    in_flight: AtomicUsize,
}

impl FetchController {
    pub fn new(store: Arc<dyn TodoStore>, order: SortOrder) -> Self {
        Self {
            store,
            order,
            generation: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Builds the scoped query for `owner`.
    ///
    /// The owner filter is always present; search applies only when
    /// non-empty; `All` adds no completion filter.
    pub fn build_query(&self, owner: &UserId, params: &QueryParams) -> TodoQuery {
        let search = params.search.trim();
        TodoQuery {
            owner: owner.clone(),
            search: (!search.is_empty()).then(|| search.to_string()),
            completed: params.filter.completed(),
            order: self.order,
            offset: params.offset(),
            limit: params.page_size,
        }
    }

    /// Reads one page. Without a session this returns an empty page and
    /// never touches the network.
    pub async fn fetch(
        &self,
        session: Option<&Session>,
        params: &QueryParams,
    ) -> Result<ResultPage, TodoError> {
        let Some(session) = session else {
            debug!("no session, skipping fetch");
            return Ok(ResultPage::empty());
        };

        let query = self.build_query(&session.user_id, params);
        debug!(
            owner = %query.owner,
            search = ?query.search,
            completed = ?query.completed,
            offset = query.offset,
            limit = query.limit,
            "fetching todos"
        );

        let mut page = self
            .store
            .scoped_query(session, &query)
            .await
            .map_err(TodoError::into_fetch)?;

        let before = page.items.len();
        page.items.retain(|todo| todo.user_id == session.user_id);
        let foreign = before - page.items.len();
        if foreign > 0 {
            warn!(count = foreign, "store returned records owned by another user, dropped");
            page.total_count = page.total_count.saturating_sub(foreign as u64);
        }
        if page.items.len() > params.page_size {
            warn!(
                returned = page.items.len(),
                page_size = params.page_size,
                "store ignored the window, truncating"
            );
            page.items.truncate(params.page_size);
        }
        Ok(page)
    }

    /// Starts a request; any earlier in-flight request becomes stale.
    pub fn begin(&self) -> FetchTicket {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        FetchTicket {
            generation: self.generation.fetch_add(1, Ordering::SeqCst) + 1,
        }
    }

    /// Makes every in-flight request stale without starting a new one.
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// True if no request was started (or invalidated) after `ticket`.
    pub fn is_current(&self, ticket: FetchTicket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.generation
    }

    /// Bumped by every `begin` and `invalidate`.
    pub(crate) fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Number of requests started but not yet completed.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Finishes the request behind `ticket`.
    ///
    /// A current success replaces the cache; a current failure leaves the
    /// cache untouched and is returned. Stale results are dropped either way.
    pub(crate) fn complete(
        &self,
        ticket: FetchTicket,
        result: Result<ResultPage, TodoError>,
        cache: &mut TodoCache,
    ) -> Result<FetchOutcome, TodoError> {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if !self.is_current(ticket) {
            warn!(generation = ticket.generation, "discarding stale fetch response");
            return Ok(FetchOutcome::Stale);
        }
        let page = result?;
        debug!(
            items = page.items.len(),
            total = page.total_count,
            "fetch applied"
        );
        cache.replace(page);
        Ok(FetchOutcome::Applied)
    }

    /// Drops every cached record and any response still in flight.
    pub(crate) fn drop_records(&self, cache: &mut TodoCache) {
        self.invalidate();
        cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::query::QueryState;
    use todosync_core::{CompletionFilter, Todo, TodoId};
    use todosync_test_utils::{InMemoryTodoStore, test_session};
    use tracing_test::traced_test;

    fn params(search: &str, filter: CompletionFilter, page: usize) -> QueryParams {
        QueryParams {
            search: search.to_string(),
            filter,
            page,
            page_size: 2,
        }
    }

    fn seeded_store() -> Arc<InMemoryTodoStore> {
        let store = Arc::new(InMemoryTodoStore::new());
        store.seed("alice", "buy milk", false);
        store.seed("alice", "walk dog", true);
        store.seed("alice", "Milk the cow", false);
        store.seed("mallory", "steal milk", false);
        store
    }

    #[test]
    fn query_always_scopes_by_owner() {
        let fetcher = FetchController::new(Arc::new(InMemoryTodoStore::new()), SortOrder::default());
        let q = fetcher.build_query(&"alice".into(), &params("", CompletionFilter::All, 1));
        assert_eq!(q.owner, UserId::from("alice"));
        assert_eq!(q.search, None);
        assert_eq!(q.completed, None);
        assert_eq!((q.offset, q.limit), (0, 2));
    }

    #[test]
    fn query_maps_filter_search_and_window() {
        let fetcher = FetchController::new(Arc::new(InMemoryTodoStore::new()), SortOrder::IdDesc);
        let q = fetcher.build_query(&"alice".into(), &params("  milk ", CompletionFilter::Pending, 3));
        assert_eq!(q.search.as_deref(), Some("milk"));
        assert_eq!(q.completed, Some(false));
        assert_eq!(q.order, SortOrder::IdDesc);
        assert_eq!((q.offset, q.limit), (4, 2));
    }

    #[tokio::test]
    async fn no_session_means_no_network() {
        let store = seeded_store();
        let fetcher = FetchController::new(store.clone(), SortOrder::default());
        let page = fetcher
            .fetch(None, &params("", CompletionFilter::All, 1))
            .await
            .unwrap();
        assert_eq!(page, ResultPage::empty());
        assert_eq!(store.query_calls(), 0);
    }

    #[tokio::test]
    async fn search_is_case_insensitive_and_owner_scoped() {
        let store = seeded_store();
        let fetcher = FetchController::new(store.clone(), SortOrder::default());
        let session = test_session("alice");
        let page = fetcher
            .fetch(Some(&session), &params("MILK", CompletionFilter::All, 1))
            .await
            .unwrap();
        assert_eq!(page.total_count, 2);
        assert!(page.items.iter().all(|t| t.user_id == session.user_id));
        assert_eq!(page.items[0].text, "Milk the cow");
    }

    #[tokio::test]
    async fn total_count_ignores_window() {
        let store = seeded_store();
        let fetcher = FetchController::new(store, SortOrder::default());
        let session = test_session("alice");
        let first = fetcher
            .fetch(Some(&session), &params("", CompletionFilter::All, 1))
            .await
            .unwrap();
        let second = fetcher
            .fetch(Some(&session), &params("", CompletionFilter::All, 2))
            .await
            .unwrap();
        assert_eq!(first.total_count, 3);
        assert_eq!(second.total_count, 3);
        assert_eq!(first.items.len(), 2);
        assert_eq!(second.items.len(), 1);
    }

    #[tokio::test]
    async fn foreign_rows_from_a_leaky_store_are_dropped() {
        let store = seeded_store();
        store.ignore_owner_filter(true);
        let fetcher = FetchController::new(store, SortOrder::default());
        let session = test_session("alice");
        let page = fetcher
            .fetch(Some(&session), &params("steal", CompletionFilter::All, 1))
            .await
            .unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total_count, 0);
    }

    #[tokio::test]
    async fn store_failure_is_a_fetch_error() {
        let store = seeded_store();
        store.fail_next("connection reset");
        let fetcher = FetchController::new(store, SortOrder::default());
        let err = fetcher
            .fetch(Some(&test_session("alice")), &params("", CompletionFilter::All, 1))
            .await
            .unwrap_err();
        assert!(err.is_fetch());
    }

    #[test]
    #[traced_test]
    fn older_ticket_is_stale() {
        let fetcher = FetchController::new(Arc::new(InMemoryTodoStore::new()), SortOrder::default());
        let mut cache = TodoCache::default();
        let first = fetcher.begin();
        let second = fetcher.begin();
        assert_eq!(fetcher.in_flight(), 2);

        let newer = ResultPage {
            items: vec![Todo {
                id: TodoId(2),
                text: "new".into(),
                completed: false,
                user_id: "alice".into(),
                created_at: None,
            }],
            total_count: 1,
        };
        assert_eq!(
            fetcher.complete(second, Ok(newer.clone()), &mut cache).unwrap(),
            FetchOutcome::Applied
        );
        assert_eq!(
            fetcher.complete(first, Ok(ResultPage::empty()), &mut cache).unwrap(),
            FetchOutcome::Stale
        );
        assert_eq!(cache.items(), newer.items.as_slice());
        assert_eq!(fetcher.in_flight(), 0);
        assert!(logs_contain("discarding stale fetch response"));
    }

    #[test]
    fn failed_fetch_keeps_previous_page() {
        let fetcher = FetchController::new(Arc::new(InMemoryTodoStore::new()), SortOrder::default());
        let mut cache = TodoCache::default();
        let ticket = fetcher.begin();
        cache.replace(ResultPage {
            items: Vec::new(),
            total_count: 5,
        });
        let err = fetcher
            .complete(ticket, Err(TodoError::remote(Some(500), "boom").into_fetch()), &mut cache)
            .unwrap_err();
        assert!(err.is_fetch());
        assert_eq!(cache.total_count(), 5);
    }

    proptest::proptest! {
        /// Whatever the filters, a fetch never returns more than a page or a
        /// record owned by someone else.
        #[test]
        fn fetch_is_scoped_and_bounded(
            rows in proptest::collection::vec(
                (proptest::sample::select(vec!["alice", "bob", "mallory"]), "[a-c]{1,4}", proptest::bool::ANY),
                0..40,
            ),
            search in "[a-c]{0,2}",
            filter in proptest::sample::select(vec![
                CompletionFilter::All,
                CompletionFilter::Completed,
                CompletionFilter::Pending,
            ]),
            page in 1usize..5,
            leaky in proptest::bool::ANY,
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let store = Arc::new(InMemoryTodoStore::new());
            for (owner, text, completed) in &rows {
                store.seed(owner, text, *completed);
            }
            store.ignore_owner_filter(leaky);
            let fetcher = FetchController::new(store, SortOrder::default());
            let session = test_session("alice");
            let mut state = QueryState::new(3, Duration::ZERO);
            state.set_filter(filter);
            state.set_search(search, tokio::time::Instant::now());
            state.flush_search();
            state.set_page(page).unwrap();

            let result = runtime.block_on(fetcher.fetch(Some(&session), &state.params())).unwrap();
            proptest::prop_assert!(result.items.len() <= 3);
            proptest::prop_assert!(result.items.iter().all(|t| t.user_id == session.user_id));
        }
    }
}
