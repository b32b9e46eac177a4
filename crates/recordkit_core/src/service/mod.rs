//! View-facing orchestration over record repositories.
//!
//! # Responsibility
//! - Own the in-memory working copy and UI-facing flags (`app_store`).
//! - Provide pure derived views: sorting, counts, grouping (`view`).

pub mod app_store;
pub mod view;
