//! Shared types used across all modules.
//!
//! This module defines the core data structures for pull-request
//! references, change entries, line operations, and diff blobs. Other
//! modules import from here rather than reaching into each other's
//! internals.

pub mod diff;
pub mod pr;

pub use diff::{DiffBlob, DiffMode, FileDiff, LineOp, LineOpKind};
pub use pr::{ChangeEntry, ChangeType, FileSnapshot, HostVariant, PullRequestInfo, PullRequestRef};
