//! Core domain logic for Bookpedia.
//! This crate owns book search, offline-first favorites and the screen
//! controllers built on top of them.

pub mod app;
pub mod config;
pub mod controller;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod navigation;
pub mod remote;
pub mod repo;

pub use app::{AppError, AppServices};
pub use config::{AppConfig, ConfigError, ControllerConfig};
pub use controller::{
    DetailAction, DetailController, DetailState, MessageKey, SearchAction, SearchController,
    SearchState, StateObserver, UiText,
};
pub use error::{DataError, EmptyResult, LocalError, RemoteError, ResultExt};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::book::{Book, BookId};
pub use navigation::{BookGraph, Route, SelectedBook};
pub use repo::{BookRepository, DefaultBookRepository};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
