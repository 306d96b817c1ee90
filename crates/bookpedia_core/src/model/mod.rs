//! Domain model shared by repository and controller layers.
//!
//! # Responsibility
//! - Define the plain `Book` value that crosses every layer boundary.
//!
//! # Invariants
//! - Domain values carry no persistence or transport concerns.
//! - A book is identified by the stable external work id.

pub mod book;
