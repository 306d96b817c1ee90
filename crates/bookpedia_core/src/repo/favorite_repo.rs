//! Favorites store contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist favorited book snapshots keyed by external book id.
//! - Publish the full favorites snapshot to every subscriber after each
//!   effective write.
//!
//! # Invariants
//! - At most one row per `id`; upsert replaces every column.
//! - `get_all` streams start with the current snapshot and never need a
//!   manual refresh.
//! - Snapshots are published while the connection lock is held, so
//!   subscribers never observe an older snapshot after a newer one.
//! - Deleting a missing id succeeds and publishes nothing.

use crate::db::DbError;
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use log::{debug, error};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

const FAVORITE_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    image_url,
    languages,
    authors,
    first_publish_year,
    ratings_average,
    ratings_count,
    num_pages_median,
    num_editions
FROM favorite_books";

pub type StoreResult<T> = Result<T, StoreError>;

/// Reactive stream of full favorites snapshots.
pub type FavoriteBookStream = BoxStream<'static, Vec<FavoriteBookRecord>>;

/// Persisted snapshot of a favorited book.
#[derive(Debug, Clone, PartialEq)]
pub struct FavoriteBookRecord {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub image_url: String,
    pub languages: Vec<String>,
    pub authors: Vec<String>,
    pub first_publish_year: Option<String>,
    pub ratings_average: Option<f64>,
    pub ratings_count: Option<u32>,
    pub num_pages_median: Option<u32>,
    pub num_editions: u32,
}

/// Favorites store failure.
#[derive(Debug)]
pub enum StoreError {
    /// SQLite reported `SQLITE_FULL`.
    DiskFull,
    Db(DbError),
    InvalidData(String),
    /// The blocking worker or the connection lock was lost.
    Unavailable(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DiskFull => write!(f, "favorites store is out of disk space"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted favorite: {message}"),
            Self::Unavailable(message) => write!(f, "favorites store unavailable: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        if value.is_disk_full() {
            Self::DiskFull
        } else {
            Self::Db(value)
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        DbError::Sqlite(value).into()
    }
}

/// Favorites persistence boundary used by the book repository.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FavoriteBookStore: Send + Sync {
    /// Inserts or fully replaces the record with the same id.
    async fn upsert(&self, record: FavoriteBookRecord) -> StoreResult<()>;

    /// Streams the full favorites list, current snapshot first.
    fn get_all(&self) -> FavoriteBookStream;

    async fn get_by_id(&self, id: &str) -> StoreResult<Option<FavoriteBookRecord>>;

    /// Deletes by id; a missing id is not an error.
    async fn delete_by_id(&self, id: &str) -> StoreResult<()>;
}

/// SQLite-backed favorites store.
///
/// Cheap to share behind `Arc`; all screens write through one instance.
pub struct SqliteFavoriteBookStore {
    conn: Arc<Mutex<Connection>>,
    snapshot: Arc<watch::Sender<Vec<FavoriteBookRecord>>>,
}

impl SqliteFavoriteBookStore {
    /// Wraps a migrated connection and loads the initial snapshot.
    pub fn try_new(conn: Connection) -> StoreResult<Self> {
        let initial = select_all(&conn)?;
        let (snapshot, _) = watch::channel(initial);
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            snapshot: Arc::new(snapshot),
        })
    }

    /// Runs `operation` on the blocking pool with the connection locked.
    async fn with_conn<T, F>(&self, operation: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection, &watch::Sender<Vec<FavoriteBookRecord>>) -> StoreResult<T>
            + Send
            + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let snapshot = Arc::clone(&self.snapshot);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().unwrap_or_else(PoisonError::into_inner);
            operation(&guard, &snapshot)
        })
        .await
        .map_err(|err| StoreError::Unavailable(err.to_string()))?
    }
}

#[async_trait]
impl FavoriteBookStore for SqliteFavoriteBookStore {
    async fn upsert(&self, record: FavoriteBookRecord) -> StoreResult<()> {
        let id_len = record.id.len();
        let result = self
            .with_conn(move |conn, snapshot| {
                let languages = encode_list(&record.languages)?;
                let authors = encode_list(&record.authors)?;
                conn.execute(
                    "INSERT INTO favorite_books (
                        id,
                        title,
                        description,
                        image_url,
                        languages,
                        authors,
                        first_publish_year,
                        ratings_average,
                        ratings_count,
                        num_pages_median,
                        num_editions
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                    ON CONFLICT(id) DO UPDATE SET
                        title = excluded.title,
                        description = excluded.description,
                        image_url = excluded.image_url,
                        languages = excluded.languages,
                        authors = excluded.authors,
                        first_publish_year = excluded.first_publish_year,
                        ratings_average = excluded.ratings_average,
                        ratings_count = excluded.ratings_count,
                        num_pages_median = excluded.num_pages_median,
                        num_editions = excluded.num_editions;",
                    params![
                        record.id.as_str(),
                        record.title.as_str(),
                        record.description.as_deref(),
                        record.image_url.as_str(),
                        languages,
                        authors,
                        record.first_publish_year.as_deref(),
                        record.ratings_average,
                        record.ratings_count,
                        record.num_pages_median,
                        record.num_editions,
                    ],
                )?;
                snapshot.send_replace(select_all(conn)?);
                Ok(())
            })
            .await;

        match &result {
            Ok(()) => debug!("event=favorite_upsert module=favorites status=ok id_len={id_len}"),
            Err(err) => error!("event=favorite_upsert module=favorites status=error error={err}"),
        }
        result
    }

    fn get_all(&self) -> FavoriteBookStream {
        Box::pin(WatchStream::new(self.snapshot.subscribe()))
    }

    async fn get_by_id(&self, id: &str) -> StoreResult<Option<FavoriteBookRecord>> {
        let id = id.to_string();
        self.with_conn(move |conn, _| {
            let mut stmt = conn.prepare(&format!("{FAVORITE_SELECT_SQL} WHERE id = ?1;"))?;
            let row = stmt
                .query_row([id.as_str()], |row| Ok(parse_favorite_row(row)))
                .optional()?;
            row.transpose()
        })
        .await
    }

    async fn delete_by_id(&self, id: &str) -> StoreResult<()> {
        let id = id.to_string();
        let result = self
            .with_conn(move |conn, snapshot| {
                let changed = conn.execute("DELETE FROM favorite_books WHERE id = ?1;", [&id])?;
                if changed > 0 {
                    snapshot.send_replace(select_all(conn)?);
                }
                Ok(changed)
            })
            .await;

        match result {
            Ok(changed) => {
                debug!("event=favorite_delete module=favorites status=ok changed={changed}");
                Ok(())
            }
            Err(err) => {
                error!("event=favorite_delete module=favorites status=error error={err}");
                Err(err)
            }
        }
    }
}

fn select_all(conn: &Connection) -> StoreResult<Vec<FavoriteBookRecord>> {
    let mut stmt = conn.prepare(&format!("{FAVORITE_SELECT_SQL} ORDER BY rowid ASC;"))?;
    let mut rows = stmt.query([])?;
    let mut records = Vec::new();

    while let Some(row) = rows.next()? {
        records.push(parse_favorite_row(row)?);
    }

    Ok(records)
}

fn parse_favorite_row(row: &Row<'_>) -> StoreResult<FavoriteBookRecord> {
    let id: String = row.get("id")?;
    let languages = decode_list(&id, "languages", row.get("languages")?)?;
    let authors = decode_list(&id, "authors", row.get("authors")?)?;

    Ok(FavoriteBookRecord {
        title: row.get("title")?,
        description: row.get("description")?,
        image_url: row.get("image_url")?,
        languages,
        authors,
        first_publish_year: row.get("first_publish_year")?,
        ratings_average: row.get("ratings_average")?,
        ratings_count: row.get("ratings_count")?,
        num_pages_median: row.get("num_pages_median")?,
        num_editions: row.get("num_editions")?,
        id,
    })
}

fn encode_list(values: &[String]) -> StoreResult<String> {
    serde_json::to_string(values).map_err(|err| StoreError::InvalidData(err.to_string()))
}

fn decode_list(id: &str, column: &str, raw: String) -> StoreResult<Vec<String>> {
    serde_json::from_str(&raw).map_err(|err| {
        StoreError::InvalidData(format!(
            "invalid JSON list in favorite_books.{column} for `{id}`: {err}"
        ))
    })
}
