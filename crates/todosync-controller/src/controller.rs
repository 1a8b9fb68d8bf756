// SPDX-FileCopyrightText: 2026 Todosync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The composed todo controller.
//!
//! Binds the session manager to the query state, the fetch and mutation
//! controllers, and the edit session. The presentation layer calls the
//! public methods (or [`TodoController::dispatch`] with an [`Intent`]) and
//! renders [`TodoController::view`].
//!
//! Fetches are triggered by two named events: a session change
//! ([`on_session_change`](TodoController::on_session_change)) and a change
//! of the effective query ([`tick`](TodoController::tick),
//! [`set_filter`](TodoController::set_filter),
//! [`set_page`](TodoController::set_page)). Controller state sits behind a
//! mutex that is never held across a remote call.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use todosync_config::{ReconcileMode, TodosyncConfig};
use todosync_core::types::total_pages;
use todosync_core::{
    AuthState, CompletionFilter, Credentials, Session, SortOrder, Todo, TodoError, TodoId,
    TodoPatch, TodoStore, UserId,
};
use tokio::sync::{Mutex, Notify};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::TodoCache;
use crate::edit::EditSession;
use crate::fetch::{FetchController, FetchOutcome};
use crate::mutation::{MutationController, Reconcile};
use crate::query::{QueryParams, QueryState};
use crate::session::SessionManager;

/// Tunables for a [`TodoController`].
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub page_size: usize,
    pub debounce: Duration,
    pub order: SortOrder,
    pub reconcile: ReconcileMode,
    /// How often the run loop checks the session for upcoming expiry.
    pub expiry_check: Duration,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            page_size: 10,
            debounce: Duration::from_millis(400),
            order: SortOrder::default(),
            reconcile: ReconcileMode::default(),
            expiry_check: Duration::from_secs(30),
        }
    }
}

impl ControllerOptions {
    pub fn from_config(config: &TodosyncConfig) -> Self {
        Self {
            page_size: config.query.page_size,
            debounce: config.query.debounce(),
            order: config.query.order,
            reconcile: config.sync.reconcile,
            ..Self::default()
        }
    }
}

/// A user action, as forwarded by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// A keystroke in the search box; applied after the debounce.
    SetSearch(String),
    /// Apply the search box now.
    SubmitSearch,
    SetFilter(CompletionFilter),
    SetPage(usize),
    NextPage,
    PrevPage,
    SetCompose(String),
    /// Create a todo from the compose input.
    Create,
    Delete(TodoId),
    Toggle(TodoId),
    OpenEdit(TodoId),
    SetDraft(String),
    CommitEdit,
    CancelEdit,
}

/// Snapshot of everything the presentation layer renders.
#[derive(Debug, Clone)]
pub struct ViewState {
    pub auth: AuthState,
    pub items: Vec<Todo>,
    pub total_count: u64,
    pub total_pages: u64,
    pub page: usize,
    pub page_size: usize,
    pub filter: CompletionFilter,
    /// What the user has typed.
    pub search_raw: String,
    /// What the current page is filtered by.
    pub search: String,
    pub edit: EditSession,
    pub compose: String,
    pub loading: bool,
    pub last_error: Option<String>,
}

struct ControllerState {
    query: QueryState,
    cache: TodoCache,
    edit: EditSession,
    compose: String,
    last_error: Option<String>,
    /// User the cache belongs to.
    seen_user: Option<UserId>,
}

/// Session-scoped todo synchronization controller.
pub struct TodoController {
    sessions: Arc<SessionManager>,
    fetcher: FetchController,
    mutator: MutationController,
    state: Mutex<ControllerState>,
    reconcile: ReconcileMode,
    expiry_check: Duration,
    wake: Notify,
}

impl TodoController {
    pub fn new(
        sessions: Arc<SessionManager>,
        store: Arc<dyn TodoStore>,
        options: ControllerOptions,
    ) -> Self {
        Self {
            sessions,
            fetcher: FetchController::new(store.clone(), options.order),
            mutator: MutationController::new(store),
            state: Mutex::new(ControllerState {
                query: QueryState::new(options.page_size, options.debounce),
                cache: TodoCache::default(),
                edit: EditSession::default(),
                compose: String::new(),
                last_error: None,
                seen_user: None,
            }),
            reconcile: options.reconcile,
            expiry_check: options.expiry_check,
            wake: Notify::new(),
        }
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// Resolves the persisted session and loads the first page.
    pub async fn start(&self) -> Result<AuthState, TodoError> {
        let restored = self.sessions.restore().await;
        let state = self.sessions.state();
        if let AuthState::Authenticated(session) = &state
            && session.is_expired(Utc::now())
        {
            info!(user = %session.user_id, "restored session has expired, refreshing");
            if let Err(e) = self.sessions.refresh().await {
                warn!(error = %e, "could not refresh restored session");
                self.sessions.expire();
            }
        }
        self.on_session_change().await?;
        restored?;
        Ok(self.sessions.state())
    }

    pub async fn sign_in(&self, credentials: &Credentials) -> Result<Session, TodoError> {
        let session = self.record(self.sessions.sign_in(credentials).await).await?;
        self.on_session_change().await?;
        Ok(session)
    }

    /// Returns `None` when the provider wants the e-mail confirmed first.
    pub async fn sign_up(&self, credentials: &Credentials) -> Result<Option<Session>, TodoError> {
        let session = self.record(self.sessions.sign_up(credentials).await).await?;
        self.on_session_change().await?;
        Ok(session)
    }

    /// The view is reset even when the provider rejects the sign-out; that
    /// error is still returned.
    pub async fn sign_out(&self) -> Result<(), TodoError> {
        let result = self.sessions.sign_out().await;
        self.on_session_change().await?;
        self.record(result).await
    }

    /// Reacts to the session manager's current state.
    ///
    /// A different user (or none) drops every cached record and resets the
    /// view; a newly authenticated user gets a fresh fetch. A refresh for
    /// the same user changes nothing.
    pub async fn on_session_change(&self) -> Result<FetchOutcome, TodoError> {
        let authenticated = {
            let session = self.sessions.current_session();
            let mut state = self.state.lock().await;
            let changed = self.observe_session(&mut state, session.as_ref());
            changed && session.is_some()
        };
        if authenticated {
            self.refresh().await
        } else {
            Ok(FetchOutcome::Skipped)
        }
    }

    /// Re-runs the current query.
    ///
    /// Without a session this is a no-op. If another fetch is started, or
    /// the session changes, before this one resolves, its result is
    /// discarded.
    pub async fn refresh(&self) -> Result<FetchOutcome, TodoError> {
        let (ticket, session, params) = {
            let mut state = self.state.lock().await;
            let session = self.sessions.current_session();
            self.observe_session(&mut state, session.as_ref());
            let Some(session) = session else {
                return Ok(FetchOutcome::Skipped);
            };
            (self.fetcher.begin(), session, state.query.params())
        };

        let result = self.fetcher.fetch(Some(&session), &params).await;

        let mut state = self.state.lock().await;
        match self.fetcher.complete(ticket, result, &mut state.cache) {
            Ok(outcome) => {
                if outcome == FetchOutcome::Applied {
                    state.last_error = None;
                }
                Ok(outcome)
            }
            Err(e) => {
                state.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Records a search keystroke. The query changes once the debounce
    /// window passes without another keystroke.
    pub async fn set_search(&self, text: impl Into<String>) {
        self.state
            .lock()
            .await
            .query
            .set_search(text, tokio::time::Instant::now());
        self.wake.notify_one();
    }

    /// Applies a search whose debounce has elapsed, fetching if the
    /// effective search changed.
    pub async fn tick(&self) -> Result<FetchOutcome, TodoError> {
        let changed = self
            .state
            .lock()
            .await
            .query
            .poll_debounce(tokio::time::Instant::now());
        self.refresh_if(changed).await
    }

    /// Applies the typed search immediately.
    pub async fn submit_search(&self) -> Result<FetchOutcome, TodoError> {
        let changed = self.state.lock().await.query.flush_search();
        self.refresh_if(changed).await
    }

    pub async fn set_filter(&self, filter: CompletionFilter) -> Result<FetchOutcome, TodoError> {
        let changed = self.state.lock().await.query.set_filter(filter);
        self.refresh_if(changed).await
    }

    /// Jumps to `page` (one based) without touching search or filter.
    pub async fn set_page(&self, page: usize) -> Result<FetchOutcome, TodoError> {
        let changed = {
            let mut state = self.state.lock().await;
            let changed = state.query.set_page(page);
            Self::note(&mut state, changed)?
        };
        self.refresh_if(changed).await
    }

    pub async fn next_page(&self) -> Result<FetchOutcome, TodoError> {
        let target = {
            let state = self.state.lock().await;
            let last = total_pages(state.cache.total_count(), state.query.page_size()).max(1);
            let page = state.query.page();
            (page < last as usize).then_some(page + 1)
        };
        match target {
            Some(page) => self.set_page(page).await,
            None => Ok(FetchOutcome::Skipped),
        }
    }

    pub async fn prev_page(&self) -> Result<FetchOutcome, TodoError> {
        let page = self.state.lock().await.query.page();
        if page > 1 {
            self.set_page(page - 1).await
        } else {
            Ok(FetchOutcome::Skipped)
        }
    }

    pub async fn set_compose(&self, text: impl Into<String>) {
        self.state.lock().await.compose = text.into();
    }

    /// Creates a todo from the compose input.
    pub async fn create_from_compose(&self) -> Result<Todo, TodoError> {
        let text = self.state.lock().await.compose.clone();
        self.create(&text).await
    }

    /// Creates a todo.
    ///
    /// The compose input is cleared once the remote insert has been
    /// attempted, whatever its outcome; text rejected locally stays. The new
    /// record is put on the page when it belongs there, otherwise the page
    /// is refetched. A fetch started while the insert was in flight may
    /// already hold the record, so it is refetched then too.
    pub async fn create(&self, text: &str) -> Result<Todo, TodoError> {
        let session = self.sessions.current_session();
        let generation = self.fetcher.generation();
        let result = self.mutator.create(session.as_ref(), text).await;
        if !matches!(&result, Err(e) if e.is_validation() || e.is_auth()) {
            self.state.lock().await.compose.clear();
        }
        let todo = self.record(result).await?;

        let refetch = {
            let mut state = self.state.lock().await;
            if self.owns_cache(&state, &todo.user_id) {
                let params = state.query.params();
                let outcome = self.mutator.apply_created(&mut state.cache, todo.clone(), &params);
                self.needs_refetch(outcome) || self.fetcher.generation() != generation
            } else {
                false
            }
        };
        self.refetch_after_mutation(refetch).await;
        Ok(todo)
    }

    /// Deletes a todo owned by the current user.
    ///
    /// When the delete empties a page after the first, the view steps back
    /// one page.
    pub async fn delete(&self, id: TodoId) -> Result<(), TodoError> {
        let session = self.sessions.current_session();
        self.record(self.mutator.delete(session.as_ref(), id).await)
            .await?;

        let refetch = {
            let mut state = self.state.lock().await;
            if state.edit.target_id() == Some(id) {
                state.edit.cancel();
            }
            match session {
                Some(session) if self.owns_cache(&state, &session.user_id) => {
                    let params = state.query.params();
                    let outcome = self.mutator.apply_deleted(&mut state.cache, id, &params);
                    let step_back = state.cache.is_empty() && state.query.step_back();
                    if step_back {
                        debug!(page = state.query.page(), "page emptied, stepping back");
                    }
                    step_back || self.needs_refetch(outcome)
                }
                _ => false,
            }
        };
        self.refetch_after_mutation(refetch).await;
        Ok(())
    }

    /// Flips the completion flag of a todo on the current page.
    pub async fn toggle_completion(&self, id: TodoId) -> Result<Todo, TodoError> {
        let todo = self.cached(id).await?;
        let session = self.sessions.current_session();
        let toggled = self
            .record(self.mutator.toggle_completion(session.as_ref(), &todo).await)
            .await?;
        self.reconcile_patch(&toggled.user_id, id, &TodoPatch::completed(toggled.completed))
            .await;
        Ok(toggled)
    }

    /// Replaces the text of a todo and closes its edit session.
    pub async fn update_text(&self, id: TodoId, text: &str) -> Result<String, TodoError> {
        let session = self.sessions.current_session();
        let stored = self
            .record(self.mutator.update_text(session.as_ref(), id, text).await)
            .await?;
        if let Some(session) = session {
            {
                let mut state = self.state.lock().await;
                if state.edit.target_id() == Some(id) {
                    state.edit.cancel();
                }
            }
            self.reconcile_patch(&session.user_id, id, &TodoPatch::text(stored.clone()))
                .await;
        }
        Ok(stored)
    }

    /// Opens an edit on a todo from the current page.
    pub async fn open_edit(&self, id: TodoId) -> Result<(), TodoError> {
        let todo = self.cached(id).await?;
        self.state.lock().await.edit.open(&todo);
        Ok(())
    }

    pub async fn set_draft(&self, text: impl Into<String>) {
        self.state.lock().await.edit.set_draft(text);
    }

    pub async fn cancel_edit(&self) {
        self.state.lock().await.edit.cancel();
    }

    /// Saves the draft. On failure the edit stays open.
    pub async fn commit_edit(&self) -> Result<String, TodoError> {
        let (id, draft) = {
            let mut state = self.state.lock().await;
            let target = state.edit.target_id();
            let target = Self::note(
                &mut state,
                target.ok_or_else(|| TodoError::Validation("no edit in progress".to_string())),
            )?;
            (target, state.edit.draft_text().to_string())
        };
        self.update_text(id, &draft).await
    }

    /// Routes an intent to the matching operation.
    pub async fn dispatch(&self, intent: Intent) -> Result<(), TodoError> {
        debug!(?intent, "dispatching intent");
        match intent {
            Intent::SetSearch(text) => self.set_search(text).await,
            Intent::SubmitSearch => {
                self.submit_search().await?;
            }
            Intent::SetFilter(filter) => {
                self.set_filter(filter).await?;
            }
            Intent::SetPage(page) => {
                self.set_page(page).await?;
            }
            Intent::NextPage => {
                self.next_page().await?;
            }
            Intent::PrevPage => {
                self.prev_page().await?;
            }
            Intent::SetCompose(text) => self.set_compose(text).await,
            Intent::Create => {
                self.create_from_compose().await?;
            }
            Intent::Delete(id) => self.delete(id).await?,
            Intent::Toggle(id) => {
                self.toggle_completion(id).await?;
            }
            Intent::OpenEdit(id) => self.open_edit(id).await?,
            Intent::SetDraft(text) => self.set_draft(text).await,
            Intent::CommitEdit => {
                self.commit_edit().await?;
            }
            Intent::CancelEdit => self.cancel_edit().await,
        }
        Ok(())
    }

    /// Snapshot for rendering.
    pub async fn view(&self) -> ViewState {
        let state = self.state.lock().await;
        let page_size = state.query.page_size();
        ViewState {
            auth: self.sessions.state(),
            items: state.cache.items().to_vec(),
            total_count: state.cache.total_count(),
            total_pages: total_pages(state.cache.total_count(), page_size),
            page: state.query.page(),
            page_size,
            filter: state.query.filter(),
            search_raw: state.query.search_raw().to_string(),
            search: state.query.search_debounced().to_string(),
            edit: state.edit.clone(),
            compose: state.compose.clone(),
            loading: self.fetcher.in_flight() > 0,
            last_error: state.last_error.clone(),
        }
    }

    /// Drives the triggers that do not come from a direct call: session
    /// changes published by the session manager, search debounce deadlines,
    /// and session expiry. Returns when `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), TodoError> {
        info!("controller loop running");
        let mut auth_rx = self.sessions.subscribe();
        auth_rx.borrow_and_update();
        let mut expiry = tokio::time::interval(self.expiry_check);
        expiry.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        if let Err(e) = self.on_session_change().await {
            warn!(error = %e, "initial fetch failed");
        }

        loop {
            let deadline = self.state.lock().await.query.deadline();
            let debounce = async {
                match deadline {
                    Some(deadline) => tokio::time::sleep_until(deadline).await,
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("controller loop stopping");
                    break;
                }
                changed = auth_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    auth_rx.borrow_and_update();
                    if let Err(e) = self.on_session_change().await {
                        warn!(error = %e, "fetch after session change failed");
                    }
                }
                _ = debounce => {
                    if let Err(e) = self.tick().await {
                        warn!(error = %e, "fetch after search change failed");
                    }
                }
                _ = self.wake.notified() => {}
                _ = expiry.tick() => {
                    if let Err(e) = self.sessions.check_expiry(Utc::now()).await {
                        warn!(error = %e, "session expiry check failed");
                    }
                }
            }
        }
        Ok(())
    }

    /// Aligns the cache with `session`. Returns true when the user changed,
    /// in which case every cached record and in-flight fetch was dropped.
    fn observe_session(&self, state: &mut ControllerState, session: Option<&Session>) -> bool {
        let user = session.map(|s| s.user_id.clone());
        if state.seen_user == user {
            return false;
        }
        match &user {
            Some(user) => info!(%user, "session user changed, resetting view"),
            None => info!("session ended, dropping cached todos"),
        }
        self.fetcher.drop_records(&mut state.cache);
        state.query.reset();
        state.edit.cancel();
        state.compose.clear();
        state.last_error = None;
        state.seen_user = user;
        true
    }

    fn owns_cache(&self, state: &ControllerState, user: &UserId) -> bool {
        let owns = state.seen_user.as_ref() == Some(user);
        if !owns {
            debug!(%user, "session changed during mutation, not patching");
        }
        owns
    }

    fn needs_refetch(&self, outcome: Reconcile) -> bool {
        self.reconcile == ReconcileMode::Refetch
            || outcome == Reconcile::Refetch
            || self.fetcher.in_flight() > 0
    }

    async fn reconcile_patch(&self, owner: &UserId, id: TodoId, patch: &TodoPatch) {
        let refetch = {
            let mut state = self.state.lock().await;
            if self.owns_cache(&state, owner) {
                let params: QueryParams = state.query.params();
                let outcome = self.mutator.apply_patch(&mut state.cache, id, patch, &params);
                self.needs_refetch(outcome)
            } else {
                false
            }
        };
        self.refetch_after_mutation(refetch).await;
    }

    /// A failed follow-up fetch does not fail the mutation that caused it;
    /// the error is kept for display.
    async fn refetch_after_mutation(&self, refetch: bool) {
        if refetch && let Err(e) = self.refresh().await {
            warn!(error = %e, "refetch after mutation failed");
        }
    }

    async fn refresh_if(&self, changed: bool) -> Result<FetchOutcome, TodoError> {
        if changed {
            self.refresh().await
        } else {
            Ok(FetchOutcome::Skipped)
        }
    }

    async fn cached(&self, id: TodoId) -> Result<Todo, TodoError> {
        let mut state = self.state.lock().await;
        let todo = state.cache.get(id).cloned();
        Self::note(
            &mut state,
            todo.ok_or_else(|| TodoError::Validation(format!("todo {id} is not on the current page"))),
        )
    }

    /// Keeps the error for [`ViewState::last_error`]; success clears it.
    async fn record<T>(&self, result: Result<T, TodoError>) -> Result<T, TodoError> {
        let mut state = self.state.lock().await;
        Self::note(&mut state, result)
    }

    fn note<T>(state: &mut ControllerState, result: Result<T, TodoError>) -> Result<T, TodoError> {
        match &result {
            Ok(_) => state.last_error = None,
            Err(e) => state.last_error = Some(e.to_string()),
        }
        result
    }
}
