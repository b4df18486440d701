//! prdiff — pull-request diff synthesis engine (library crate).
//!
//! Re-exports public modules for integration tests and external use.

pub mod budget;
pub mod cache;
pub mod constants;
pub mod diff;
pub mod discover;
pub mod host;
pub mod models;
pub mod pipeline;
pub mod retrieve;
