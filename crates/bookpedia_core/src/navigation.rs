//! Book navigation graph and its shared selection.
//!
//! # Responsibility
//! - Define the routes of the book feature.
//! - Own the cross-screen selected book for the lifetime of the graph.
//! - Build screen controllers bound to the graph's repository and runtime.
//!
//! # Invariants
//! - Entering the list screen clears the selection, so nothing carries over
//!   into the next detail screen.
//! - The selection is scoped to one `BookGraph`; there is no process-wide
//!   selection.

use crate::config::ControllerConfig;
use crate::controller::{DetailController, SearchController};
use crate::model::book::{Book, BookId};
use crate::repo::BookRepository;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::watch;

/// Destinations of the book feature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Graph root; resolves to `BookList`.
    BookGraph,
    BookList,
    BookDetail { id: Option<BookId> },
}

/// Shared, observable selected book.
///
/// Clones share the same cell.
#[derive(Clone)]
pub struct SelectedBook {
    cell: Arc<watch::Sender<Option<Book>>>,
}

impl Default for SelectedBook {
    fn default() -> Self {
        let (cell, _) = watch::channel(None);
        Self {
            cell: Arc::new(cell),
        }
    }
}

impl SelectedBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<Book> {
        self.cell.borrow().clone()
    }

    pub fn select(&self, book: Option<Book>) {
        self.cell.send_replace(book);
    }

    /// Change notifications; the current value is already marked seen.
    pub fn subscribe(&self) -> watch::Receiver<Option<Book>> {
        self.cell.subscribe()
    }
}

/// Navigation-graph scope of the book feature.
pub struct BookGraph {
    repository: Arc<dyn BookRepository>,
    selection: SelectedBook,
    config: ControllerConfig,
    runtime: Handle,
}

impl BookGraph {
    pub fn new(repository: Arc<dyn BookRepository>, config: ControllerConfig, runtime: Handle) -> Self {
        Self {
            repository,
            selection: SelectedBook::new(),
            config,
            runtime,
        }
    }

    pub fn selection(&self) -> &SelectedBook {
        &self.selection
    }

    pub fn start_destination(&self) -> Route {
        Route::BookGraph
    }

    /// Enters `route`, resolving the graph root to the list screen.
    pub fn navigate(&self, route: Route) -> Route {
        match route {
            Route::BookGraph | Route::BookList => self.enter_book_list(),
            detail @ Route::BookDetail { .. } => detail,
        }
    }

    /// Shows the list screen, clearing any previous selection.
    pub fn enter_book_list(&self) -> Route {
        self.selection.select(None);
        Route::BookList
    }

    /// Selects `book` and returns the detail route for it.
    pub fn select_book(&self, book: Book) -> Route {
        let id = book.id.clone();
        self.selection.select(Some(book));
        Route::BookDetail { id: Some(id) }
    }

    /// Leaves the detail screen.
    pub fn back(&self) -> Route {
        self.enter_book_list()
    }

    pub fn search_controller(&self) -> SearchController {
        SearchController::new(
            Arc::clone(&self.repository),
            self.config,
            self.runtime.clone(),
        )
    }

    /// Builds a detail controller for `route`.
    ///
    /// Returns `None` unless `route` is `Route::BookDetail`.
    pub fn detail_controller(&self, route: &Route) -> Option<DetailController> {
        let Route::BookDetail { id } = route else {
            return None;
        };
        Some(DetailController::new(
            Arc::clone(&self.repository),
            id.clone(),
            self.selection.clone(),
            self.config,
            self.runtime.clone(),
        ))
    }
}
