//! Detail screen controller.
//!
//! # Responsibility
//! - Enrich the selected book with its description (offline-first).
//! - Keep `is_favorite` in sync with the favorites store and apply
//!   favorite toggles.
//! - Follow the shared selection while the screen is active.
//!
//! # Invariants
//! - The favorites store is the authority for `is_favorite`. A click flips
//!   the flag at once and holds it until its own write has finished and the
//!   store agrees, the write fails, or a newer click supersedes it.
//! - Store emissions are ignored while any write up to the latest click is
//!   still outstanding, so the flag never flickers during rapid clicks.
//! - Favorite writes run one at a time in click order.

use super::scope::{TaskScope, TaskSlot};
use super::state::{Activation, StateHolder, StateObserver};
use crate::config::ControllerConfig;
use crate::error::{EmptyResult, LocalError};
use crate::model::book::{Book, BookId};
use crate::navigation::SelectedBook;
use crate::repo::BookRepository;
use futures_util::StreamExt;
use log::{debug, info, warn};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::mpsc;

/// View state of the detail screen.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailState {
    /// True until the description lookup settles.
    pub is_loading: bool,
    pub is_favorite: bool,
    pub book: Option<Book>,
}

impl Default for DetailState {
    fn default() -> Self {
        Self {
            is_loading: true,
            is_favorite: false,
            book: None,
        }
    }
}

/// User intents accepted by the detail screen.
#[derive(Debug, Clone, PartialEq)]
pub enum DetailAction {
    /// Navigation handles this; the controller ignores it.
    OnBackClick,
    OnFavoriteClick,
    OnSelectedBookChange(Book),
}

/// Controller for one detail screen activation.
///
/// Dropping it cancels every task it started, including queued favorite
/// writes that have not run yet.
pub struct DetailController {
    inner: Arc<Inner>,
}

struct Inner {
    repository: Arc<dyn BookRepository>,
    book_id: Option<BookId>,
    selection: SelectedBook,
    state: StateHolder<DetailState>,
    scope: TaskScope,
    description_fetch: TaskSlot,
    favorite_mirror: TaskSlot,
    selection_follower: TaskSlot,
    favorite: Mutex<FavoriteGuard>,
    /// `Some` once the description lookup succeeded.
    fetched_description: Mutex<Option<Option<String>>>,
    writes: mpsc::UnboundedSender<FavoriteWrite>,
}

#[derive(Debug, Default)]
struct FavoriteGuard {
    /// Last value emitted by the store.
    confirmed: bool,
    pending: Option<PendingToggle>,
    next_seq: u64,
    /// Seq of the last write the writer task finished.
    finished_seq: u64,
}

#[derive(Debug, Clone, Copy)]
struct PendingToggle {
    seq: u64,
    expected: bool,
}

enum FavoriteOp {
    Mark(Book),
    Delete(BookId),
}

struct FavoriteWrite {
    seq: u64,
    op: FavoriteOp,
}

impl DetailController {
    /// Builds a controller for `route_id`, seeded from `selection`.
    ///
    /// Without a route id the selected book's id is used.
    pub fn new(
        repository: Arc<dyn BookRepository>,
        route_id: Option<BookId>,
        selection: SelectedBook,
        config: ControllerConfig,
        runtime: Handle,
    ) -> Self {
        let seed = selection.get();
        let book_id = route_id.or_else(|| seed.as_ref().map(|book| book.id.clone()));
        let state = StateHolder::new(
            DetailState {
                book: seed,
                ..DetailState::default()
            },
            config.state_grace_window,
            runtime.clone(),
        );
        let (writes, write_queue) = mpsc::unbounded_channel();

        let inner = Arc::new(Inner {
            repository,
            book_id,
            selection,
            state,
            scope: TaskScope::new(runtime),
            description_fetch: TaskSlot::new(),
            favorite_mirror: TaskSlot::new(),
            selection_follower: TaskSlot::new(),
            favorite: Mutex::new(FavoriteGuard::default()),
            fetched_description: Mutex::new(None),
            writes,
        });

        let writer = Arc::clone(&inner);
        let _ = inner
            .scope
            .spawn(async move { writer.run_favorite_writer(write_queue).await });

        Self { inner }
    }

    pub fn book_id(&self) -> Option<&str> {
        self.inner.book_id.as_deref()
    }

    /// Returns a state observer, starting subscriptions when inactive.
    pub fn state(&self) -> StateObserver<DetailState> {
        let (observer, activation) = self.inner.state.observe();
        if activation == Activation::Start {
            Inner::start(&self.inner);
        }
        observer
    }

    pub fn snapshot(&self) -> DetailState {
        self.inner.state.snapshot()
    }

    pub fn on_action(&self, action: DetailAction) {
        match action {
            DetailAction::OnFavoriteClick => self.inner.on_favorite_click(),
            DetailAction::OnSelectedBookChange(book) => self.inner.merge_selected_book(book),
            DetailAction::OnBackClick => {}
        }
    }
}

impl Drop for DetailController {
    fn drop(&mut self) {
        self.inner.scope.cancel();
    }
}

impl Inner {
    fn start(this: &Arc<Self>) {
        let Some(book_id) = this.book_id.clone() else {
            warn!("event=controller_start module=detail_controller status=skipped reason=no_book_id");
            this.state.update(|state| state.is_loading = false);
            return;
        };
        info!("event=controller_start module=detail_controller status=ok");

        let inner = Arc::clone(this);
        let id = book_id.clone();
        if let Some(handle) = this
            .scope
            .spawn(async move { inner.fetch_description(id).await })
        {
            this.description_fetch.replace(handle);
        }

        let inner = Arc::clone(this);
        if let Some(handle) = this
            .scope
            .spawn(async move { inner.mirror_favorite_status(book_id).await })
        {
            this.favorite_mirror.replace(handle);
        }

        let inner = Arc::clone(this);
        if let Some(handle) = this.scope.spawn(async move { inner.follow_selection().await }) {
            this.selection_follower.replace(handle);
        }
    }

    async fn fetch_description(self: Arc<Self>, book_id: BookId) {
        match self.repository.get_book_description(&book_id).await {
            Ok(description) => {
                let mut fetched = self
                    .fetched_description
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                *fetched = Some(description.clone());
                self.state.update(|state| {
                    state.book = state
                        .book
                        .take()
                        .map(|book| book.with_description(description));
                    state.is_loading = false;
                });
            }
            Err(err) => {
                warn!(
                    "event=book_description module=detail_controller status=error error_code={}",
                    err.code()
                );
                self.state.update(|state| state.is_loading = false);
            }
        }
    }

    async fn mirror_favorite_status(self: Arc<Self>, book_id: BookId) {
        let mut statuses = self.repository.is_book_favorite(&book_id);
        while let Some(is_favorite) = statuses.next().await {
            self.apply_store_status(is_favorite);
        }
    }

    async fn follow_selection(self: Arc<Self>) {
        let mut receiver = self.selection.subscribe();
        let current = receiver.borrow_and_update().clone();
        if let Some(book) = current {
            self.merge_selected_book(book);
        }
        while receiver.changed().await.is_ok() {
            let selected = receiver.borrow_and_update().clone();
            if let Some(book) = selected {
                self.merge_selected_book(book);
            }
        }
    }

    async fn run_favorite_writer(self: Arc<Self>, mut queue: mpsc::UnboundedReceiver<FavoriteWrite>) {
        while let Some(write) = queue.recv().await {
            let result = match &write.op {
                FavoriteOp::Mark(book) => self.repository.mark_as_favorite(book).await,
                FavoriteOp::Delete(id) => self.repository.delete_from_favorites(id).await,
            };
            self.finish_write(write.seq, result);
        }
    }

    /// Stores `book` as the screen's book, keeping an already fetched
    /// description.
    fn merge_selected_book(&self, book: Book) {
        let fetched = self
            .fetched_description
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let book = match fetched.as_ref() {
            Some(description)
                if book.description.is_none() && self.book_id.as_deref() == Some(book.id.as_str()) =>
            {
                book.with_description(description.clone())
            }
            _ => book,
        };
        self.state.update(|state| state.book = Some(book));
    }

    fn on_favorite_click(&self) {
        let Some(book_id) = self.book_id.clone() else {
            return;
        };
        let mut guard = self.favorite.lock().unwrap_or_else(PoisonError::into_inner);
        let snapshot = self.state.snapshot();
        let displayed = snapshot.is_favorite;

        let op = if displayed {
            FavoriteOp::Delete(book_id)
        } else {
            match snapshot.book {
                Some(book) => FavoriteOp::Mark(book),
                None => return,
            }
        };

        guard.next_seq += 1;
        let seq = guard.next_seq;
        guard.pending = Some(PendingToggle {
            seq,
            expected: !displayed,
        });
        self.state.update(|state| state.is_favorite = !displayed);
        debug!(
            "event=favorite_toggle module=detail_controller status=pending seq={seq} expected={}",
            !displayed
        );

        if self.writes.send(FavoriteWrite { seq, op }).is_err() {
            guard.pending = None;
            let confirmed = guard.confirmed;
            self.state.update(|state| state.is_favorite = confirmed);
        }
    }

    fn apply_store_status(&self, is_favorite: bool) {
        let mut guard = self.favorite.lock().unwrap_or_else(PoisonError::into_inner);
        guard.confirmed = is_favorite;
        if let Some(pending) = guard.pending {
            if guard.finished_seq < pending.seq {
                return;
            }
            guard.pending = None;
        }
        self.state.update(|state| state.is_favorite = is_favorite);
    }

    fn finish_write(&self, seq: u64, result: EmptyResult<LocalError>) {
        let mut guard = self.favorite.lock().unwrap_or_else(PoisonError::into_inner);
        guard.finished_seq = seq;
        let Some(pending) = guard.pending.filter(|pending| pending.seq == seq) else {
            return;
        };

        match result {
            Ok(()) => {
                if guard.confirmed == pending.expected {
                    guard.pending = None;
                }
            }
            Err(err) => {
                warn!(
                    "event=favorite_toggle module=detail_controller status=error seq={seq} error_code={}",
                    err.code()
                );
                guard.pending = None;
                let confirmed = guard.confirmed;
                self.state.update(|state| state.is_favorite = confirmed);
            }
        }
    }
}
