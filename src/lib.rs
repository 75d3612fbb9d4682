//! # taskboard
//!
//! The data-shaping and state-transition core of a multi-tenant task tracker:
//! everything between the tasks a storage service hands over and what a user
//! sees in the list and on the Kanban board.
//!
//! ## Key Features
//!
//! - **Filtering**: status and assignee selections, inclusive date-range
//!   overlap with an opt-in for undated tasks, case-insensitive search
//! - **Sorting**: stable ordering by creation time or due date, with undated
//!   tasks always last
//! - **Query strings**: the filter/sort state round-trips through the URL,
//!   leaving unrelated parameters untouched
//! - **Board projection**: four fixed status columns ordered by due date
//! - **Optimistic moves**: drag-and-drop status changes applied locally at
//!   once and rolled back to a full snapshot if the store refuses them
//!
//! ## Example
//!
//! ```
//! use taskboard::board::project_list;
//! use taskboard::query::{decode, QueryParams};
//!
//! let params = QueryParams::parse("?status=done&sort=due_date_asc&tab=list");
//! let (filter, sort) = decode(&params);
//! let tasks = Vec::new();
//! assert!(project_list(&tasks, &filter, sort).is_empty());
//! ```

pub mod board;
pub mod config;
pub mod controller;
pub mod dates;
pub mod fields;
pub mod filter;
pub mod query;
pub mod sort;
pub mod task;
pub mod store {
    pub mod envelope;
    pub mod error;
    pub mod json;
    pub mod traits;

    pub use error::StoreError;
    pub use json::JsonStore;
    pub use traits::TaskStore;
}
pub mod tui {
    pub mod board;
    pub mod colors;
    pub mod run;
}
