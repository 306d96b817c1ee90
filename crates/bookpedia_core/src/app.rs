//! Composition root for hosts embedding the core.
//!
//! # Responsibility
//! - Wire configuration, SQLite favorites store, HTTP data source and
//!   repository into one shareable service bundle.
//!
//! # Invariants
//! - One favorites store per bundle; every screen writes through it.
//! - Wiring failures are returned, never panicked.

use crate::config::AppConfig;
use crate::db::{open_db, open_db_in_memory, DbError};
use crate::navigation::BookGraph;
use crate::remote::HttpRemoteBookDataSource;
use crate::repo::{BookRepository, DefaultBookRepository, SqliteFavoriteBookStore, StoreError};
use log::info;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Handle;

/// Wiring failure.
#[derive(Debug)]
pub enum AppError {
    Db(DbError),
    Store(StoreError),
    Http(reqwest::Error),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "failed to open favorites database: {err}"),
            Self::Store(err) => write!(f, "failed to load favorites: {err}"),
            Self::Http(err) => write!(f, "failed to build http client: {err}"),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Http(err) => Some(err),
        }
    }
}

impl From<DbError> for AppError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}

/// Long-lived services shared by every navigation graph.
pub struct AppServices {
    pub config: AppConfig,
    pub repository: Arc<dyn BookRepository>,
}

impl AppServices {
    /// Opens `<data_dir>/<db_file_name>` and wires the services.
    pub fn open(config: AppConfig, data_dir: impl AsRef<Path>) -> Result<Self, AppError> {
        let db_path: PathBuf = data_dir.as_ref().join(&config.db_file_name);
        let conn = open_db(&db_path)?;
        info!("event=app_open module=app status=ok storage=file");
        Self::from_connection(config, conn)
    }

    /// Wires the services on a private in-memory database.
    pub fn open_in_memory(config: AppConfig) -> Result<Self, AppError> {
        let conn = open_db_in_memory()?;
        info!("event=app_open module=app status=ok storage=memory");
        Self::from_connection(config, conn)
    }

    fn from_connection(config: AppConfig, conn: Connection) -> Result<Self, AppError> {
        let favorites = Arc::new(SqliteFavoriteBookStore::try_new(conn)?);
        let remote = Arc::new(HttpRemoteBookDataSource::from_config(&config)?);
        let repository: Arc<dyn BookRepository> = Arc::new(DefaultBookRepository::new(
            remote,
            favorites,
            config.covers_base_url.clone(),
        ));
        Ok(Self { config, repository })
    }

    /// Starts a fresh book navigation graph on `runtime`.
    pub fn book_graph(&self, runtime: Handle) -> BookGraph {
        BookGraph::new(Arc::clone(&self.repository), self.config.controller, runtime)
    }
}
