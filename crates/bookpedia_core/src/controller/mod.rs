//! View-state controllers for the search and detail screens.
//!
//! # Responsibility
//! - Expose replay-latest state streams and a single `on_action` entry
//!   point per screen.
//! - Own every background task on behalf of a screen and cancel them with
//!   it.
//!
//! # Invariants
//! - Controllers never hand raw errors to observers; failures arrive as
//!   `UiText`.
//! - Navigation actions pass through untouched; routing lives in
//!   `crate::navigation`.

pub mod detail_controller;
pub mod scope;
pub mod search_controller;
pub mod state;
pub mod ui_text;

pub use detail_controller::{DetailAction, DetailController, DetailState};
pub use scope::{TaskScope, TaskSlot};
pub use search_controller::{SearchAction, SearchController, SearchState};
pub use state::{Activation, StateHolder, StateObserver};
pub use ui_text::{MessageKey, UiText};
