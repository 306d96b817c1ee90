//! Book repository contract and default implementation.
//!
//! # Responsibility
//! - Give controllers one domain-facing API over the remote catalog and the
//!   local favorites store.
//! - Decide where book descriptions come from (local snapshot first).
//!
//! # Invariants
//! - Search always goes to the remote source; there is no offline search.
//! - A favorited book never triggers a description request, even when its
//!   stored description is `None`.
//! - Errors pass through unchanged; the only recovery is the local-miss
//!   fallback to the remote detail endpoint.

use super::favorite_repo::{FavoriteBookStore, StoreError};
use super::mappers::{book_to_record, record_to_book, searched_book_to_book};
use crate::error::{DataError, EmptyResult, LocalError, RemoteError, ResultExt};
use crate::model::book::{Book, BookId};
use crate::remote::RemoteBookDataSource;
use async_trait::async_trait;
use futures_util::stream::{BoxStream, StreamExt};
use log::{debug, error};
use std::sync::Arc;

/// Reactive stream of favorited books, re-emitted on every store change.
pub type BookStream = BoxStream<'static, Vec<Book>>;

/// Domain-facing book data API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookRepository: Send + Sync {
    async fn search_books(&self, query: &str) -> Result<Vec<Book>, RemoteError>;

    /// Returns the description, consulting the favorites store first.
    async fn get_book_description(&self, book_id: &str) -> Result<Option<String>, DataError>;

    fn get_favorite_books(&self) -> BookStream;

    /// Streams whether `id` is currently favorited.
    fn is_book_favorite(&self, id: &str) -> BoxStream<'static, bool>;

    async fn mark_as_favorite(&self, book: &Book) -> EmptyResult<LocalError>;

    /// Removes `id` from favorites; a missing id is not an error.
    async fn delete_from_favorites(&self, id: &str) -> EmptyResult<LocalError>;
}

/// Repository merging a remote data source with a favorites store.
pub struct DefaultBookRepository {
    remote: Arc<dyn RemoteBookDataSource>,
    favorites: Arc<dyn FavoriteBookStore>,
    covers_base_url: String,
}

impl DefaultBookRepository {
    pub fn new(
        remote: Arc<dyn RemoteBookDataSource>,
        favorites: Arc<dyn FavoriteBookStore>,
        covers_base_url: impl Into<String>,
    ) -> Self {
        Self {
            remote,
            favorites,
            covers_base_url: covers_base_url.into(),
        }
    }
}

#[async_trait]
impl BookRepository for DefaultBookRepository {
    async fn search_books(&self, query: &str) -> Result<Vec<Book>, RemoteError> {
        let covers_base_url = self.covers_base_url.as_str();
        self.remote
            .search_books(query, None)
            .await
            .on_error(|err| {
                debug!(
                    "event=book_search module=repo status=error error_code={} query_len={}",
                    err.code(),
                    query.chars().count()
                );
            })
            .map(|response| {
                response
                    .results
                    .into_iter()
                    .map(|dto| searched_book_to_book(dto, covers_base_url))
                    .collect()
            })
    }

    async fn get_book_description(&self, book_id: &str) -> Result<Option<String>, DataError> {
        let local = self
            .favorites
            .get_by_id(book_id)
            .await
            .map_err(|err| DataError::Local(local_error("favorite_lookup", err)))?;

        if let Some(record) = local {
            debug!("event=book_description module=repo status=ok source=local");
            return Ok(record.description);
        }

        let work = self.remote.get_book_details(book_id).await?;
        debug!("event=book_description module=repo status=ok source=remote");
        Ok(work.description)
    }

    fn get_favorite_books(&self) -> BookStream {
        self.favorites
            .get_all()
            .map(|records| records.into_iter().map(record_to_book).collect())
            .boxed()
    }

    fn is_book_favorite(&self, id: &str) -> BoxStream<'static, bool> {
        let id: BookId = id.to_string();
        self.favorites
            .get_all()
            .map(move |records| records.iter().any(|record| record.id == id))
            .boxed()
    }

    async fn mark_as_favorite(&self, book: &Book) -> EmptyResult<LocalError> {
        self.favorites
            .upsert(book_to_record(book))
            .await
            .map_err(|err| local_error("favorite_upsert", err))
    }

    async fn delete_from_favorites(&self, id: &str) -> EmptyResult<LocalError> {
        self.favorites
            .delete_by_id(id)
            .await
            .map_err(|err| local_error("favorite_delete", err))
    }
}

fn local_error(event: &'static str, err: StoreError) -> LocalError {
    let mapped = match err {
        StoreError::DiskFull => LocalError::DiskFull,
        _ => LocalError::Unknown,
    };
    error!(
        "event={event} module=repo status=error error_code={} error={err}",
        mapped.code()
    );
    mapped
}
