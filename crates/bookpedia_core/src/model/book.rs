//! Book domain model.
//!
//! # Responsibility
//! - Define the immutable book value rendered by search and detail screens.
//!
//! # Invariants
//! - `id` is the remote catalog work id (for example `OL45804W`), reused
//!   unchanged as the local favorites key.
//! - `description` is filled lazily by the detail flow; search results never
//!   carry one.

/// Stable external identifier of a book work.
pub type BookId = String;

/// Canonical domain record for one book work.
#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub image_url: String,
    /// Author display names in catalog order.
    pub authors: Vec<String>,
    pub description: Option<String>,
    /// Language codes, e.g. `eng`.
    pub languages: Vec<String>,
    pub first_publish_year: Option<String>,
    pub average_rating: Option<f64>,
    pub rating_count: Option<u32>,
    pub num_pages: Option<u32>,
    pub num_editions: u32,
}

impl Book {
    /// Returns a copy of this book with `description` replaced.
    pub fn with_description(self, description: Option<String>) -> Self {
        Self {
            description,
            ..self
        }
    }
}
