//! Remote book data source contract and `reqwest` implementation.
//!
//! # Responsibility
//! - Issue exactly one GET per call against the search and work endpoints.
//! - Return wire DTOs; mapping to domain values happens in the repository.
//!
//! # Invariants
//! - Every failure is a `RemoteError`; nothing panics or leaks transport
//!   types to callers.

use super::dto::{BookWorkDto, SearchResponseDto};
use super::http::{build_http_client, safe_call};
use crate::config::AppConfig;
use crate::error::RemoteError;
use async_trait::async_trait;
use reqwest::Client;

const SEARCH_FIELDS: &str = "key,title,author_name,author_key,cover_edition_key,cover_i,\
ratings_average,ratings_count,first_publish_year,language,number_of_pages_median,edition_count";

/// Remote catalog boundary.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteBookDataSource: Send + Sync {
    /// Searches works; `result_limit` falls back to the configured default.
    async fn search_books(
        &self,
        query: &str,
        result_limit: Option<u32>,
    ) -> Result<SearchResponseDto, RemoteError>;

    /// Fetches one work by id (e.g. `OL45804W`).
    async fn get_book_details(&self, book_work_id: &str) -> Result<BookWorkDto, RemoteError>;
}

/// HTTP implementation over the Open Library style API.
pub struct HttpRemoteBookDataSource {
    client: Client,
    base_url: String,
    default_limit: u32,
}

impl HttpRemoteBookDataSource {
    /// Builds a data source with its own client from `config`.
    pub fn from_config(config: &AppConfig) -> reqwest::Result<Self> {
        let client = build_http_client(config.request_timeout)?;
        Ok(Self::new(
            client,
            config.api_base_url.clone(),
            config.search_limit,
        ))
    }

    pub fn new(client: Client, base_url: impl Into<String>, default_limit: u32) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            default_limit,
        }
    }
}

#[async_trait]
impl RemoteBookDataSource for HttpRemoteBookDataSource {
    async fn search_books(
        &self,
        query: &str,
        result_limit: Option<u32>,
    ) -> Result<SearchResponseDto, RemoteError> {
        let limit = result_limit.unwrap_or(self.default_limit).to_string();
        let request = self
            .client
            .get(format!("{}/search.json", self.base_url))
            .query(&[
                ("q", query),
                ("mode", "everything"),
                ("limit", limit.as_str()),
                ("fields", SEARCH_FIELDS),
            ]);
        safe_call("search", request).await
    }

    async fn get_book_details(&self, book_work_id: &str) -> Result<BookWorkDto, RemoteError> {
        let request = self
            .client
            .get(format!("{}/works/{}.json", self.base_url, book_work_id));
        safe_call("work_details", request).await
    }
}
