//! Search screen controller.
//!
//! # Responsibility
//! - Turn query edits into debounced remote searches.
//! - Mirror the favorites store into view state.
//!
//! # Invariants
//! - Exactly one favorites mirror and one query pipeline are live per
//!   activation; re-activation cancels and replaces both.
//! - A superseded search is aborted and fully stopped before its
//!   replacement starts, so a slow earlier response never lands last.
//! - A one-character query changes nothing beyond `search_query`.
//! - The result cache only ever holds the latest non-empty successful
//!   result set.

use super::scope::{TaskScope, TaskSlot};
use super::state::{Activation, StateHolder, StateObserver};
use super::ui_text::UiText;
use crate::config::ControllerConfig;
use crate::model::book::Book;
use crate::repo::BookRepository;
use futures_util::StreamExt;
use log::{debug, info};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::runtime::Handle;
use tokio::time::{sleep_until, Instant};

const MIN_SEARCH_QUERY_CHARS: usize = 2;

/// View state of the search screen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    pub search_query: String,
    pub search_results: Vec<Book>,
    pub favorite_books: Vec<Book>,
    pub is_loading: bool,
    pub selected_tab_index: usize,
    pub error_message: Option<UiText>,
}

/// User intents accepted by the search screen.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchAction {
    OnSearchQueryChange(String),
    /// Navigation handles this; the controller ignores it.
    OnBookClick(Book),
    OnTabSelected(usize),
}

/// Controller for the search screen.
///
/// Dropping it cancels every task it started.
pub struct SearchController {
    inner: Arc<Inner>,
}

struct Inner {
    repository: Arc<dyn BookRepository>,
    config: ControllerConfig,
    state: StateHolder<SearchState>,
    scope: TaskScope,
    favorites_mirror: TaskSlot,
    query_pipeline: TaskSlot,
    search: TaskSlot,
    cached_books: Mutex<Vec<Book>>,
}

impl SearchController {
    pub fn new(
        repository: Arc<dyn BookRepository>,
        config: ControllerConfig,
        runtime: Handle,
    ) -> Self {
        let state = StateHolder::new(
            SearchState::default(),
            config.state_grace_window,
            runtime.clone(),
        );
        Self {
            inner: Arc::new(Inner {
                repository,
                config,
                state,
                scope: TaskScope::new(runtime),
                favorites_mirror: TaskSlot::new(),
                query_pipeline: TaskSlot::new(),
                search: TaskSlot::new(),
                cached_books: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Returns a state observer, starting subscriptions when inactive.
    pub fn state(&self) -> StateObserver<SearchState> {
        let (observer, activation) = self.inner.state.observe();
        if activation == Activation::Start {
            Inner::start(&self.inner);
        }
        observer
    }

    /// Latest state without registering an observer.
    pub fn snapshot(&self) -> SearchState {
        self.inner.state.snapshot()
    }

    pub fn on_action(&self, action: SearchAction) {
        match action {
            SearchAction::OnSearchQueryChange(query) => {
                self.inner.state.update(|state| state.search_query = query);
            }
            SearchAction::OnTabSelected(index) => {
                self.inner
                    .state
                    .update(|state| state.selected_tab_index = index);
            }
            SearchAction::OnBookClick(_) => {}
        }
    }
}

impl Drop for SearchController {
    fn drop(&mut self) {
        self.inner.scope.cancel();
    }
}

impl Inner {
    fn start(this: &Arc<Self>) {
        info!("event=controller_start module=search_controller status=ok");

        let inner = Arc::clone(this);
        if let Some(handle) = this.scope.spawn(async move { inner.mirror_favorites().await }) {
            this.favorites_mirror.replace(handle);
        }

        let inner = Arc::clone(this);
        if let Some(handle) = this.scope.spawn(async move { inner.observe_search_query().await }) {
            this.query_pipeline.replace(handle);
        }
    }

    async fn mirror_favorites(self: Arc<Self>) {
        let mut favorites = self.repository.get_favorite_books();
        while let Some(books) = favorites.next().await {
            self.state.update(|state| state.favorite_books = books);
        }
    }

    /// Distinct-then-debounce over `search_query`.
    ///
    /// Changes to other state fields never reset the debounce deadline.
    async fn observe_search_query(self: Arc<Self>) {
        let mut receiver = self.state.subscribe_raw();
        let debounce = self.config.search_debounce;

        let mut last_query = receiver.borrow_and_update().search_query.clone();
        let mut pending = Some((last_query.clone(), Instant::now() + debounce));

        loop {
            let deadline = pending
                .as_ref()
                .map_or_else(Instant::now, |(_, deadline)| *deadline);

            tokio::select! {
                changed = receiver.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let query = receiver.borrow_and_update().search_query.clone();
                    if query != last_query {
                        last_query = query.clone();
                        pending = Some((query, Instant::now() + debounce));
                    }
                }
                _ = sleep_until(deadline), if pending.is_some() => {
                    if let Some((query, _)) = pending.take() {
                        Arc::clone(&self).on_debounced_query(query).await;
                    }
                }
            }
        }
    }

    async fn on_debounced_query(self: Arc<Self>, query: String) {
        if query.trim().is_empty() {
            self.search.cancel_and_wait().await;
            let cached = self
                .cached_books
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone();
            debug!(
                "event=search_restore_cache module=search_controller status=ok cached={}",
                cached.len()
            );
            self.state.update(|state| {
                state.error_message = None;
                state.search_results = cached;
                state.is_loading = false;
            });
            return;
        }

        if query.chars().count() < MIN_SEARCH_QUERY_CHARS {
            return;
        }

        self.search.cancel_and_wait().await;
        let inner = Arc::clone(&self);
        if let Some(handle) = self.scope.spawn(async move { inner.search_books(query).await }) {
            self.search.replace(handle);
        }
    }

    async fn search_books(self: Arc<Self>, query: String) {
        debug!(
            "event=search module=search_controller status=start query_len={}",
            query.chars().count()
        );
        self.state.update(|state| state.is_loading = true);

        match self.repository.search_books(&query).await {
            Ok(books) => {
                if !books.is_empty() {
                    *self
                        .cached_books
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner) = books.clone();
                }
                self.state.update(|state| {
                    state.is_loading = false;
                    state.error_message = None;
                    state.search_results = books;
                });
            }
            Err(err) => {
                debug!(
                    "event=search module=search_controller status=error error_code={}",
                    err.code()
                );
                self.state.update(|state| {
                    state.search_results = Vec::new();
                    state.is_loading = false;
                    state.error_message = Some(UiText::from(err));
                });
            }
        }
    }
}
