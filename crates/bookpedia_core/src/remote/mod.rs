//! Remote data layer for the book search API.
//!
//! # Responsibility
//! - Own HTTP transport details (client, timeouts, status mapping).
//! - Expose typed DTOs through the `RemoteBookDataSource` contract.

pub mod data_source;
pub mod dto;
pub mod http;

pub use data_source::{HttpRemoteBookDataSource, RemoteBookDataSource};
pub use dto::{BookWorkDto, SearchResponseDto, SearchedBookDto};
