//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the domain-facing book data contract used by controllers.
//! - Isolate SQLite query details and wire-format mapping from callers.
//!
//! # Invariants
//! - Repository APIs return the closed error taxonomy from `crate::error`;
//!   store and transport details never leak past this layer.

pub mod book_repo;
pub mod favorite_repo;
pub mod mappers;

pub use book_repo::{BookRepository, BookStream, DefaultBookRepository};
pub use favorite_repo::{
    FavoriteBookRecord, FavoriteBookStore, FavoriteBookStream, SqliteFavoriteBookStore,
    StoreError, StoreResult,
};
