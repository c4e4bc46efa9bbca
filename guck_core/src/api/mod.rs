//! Public data models shared with the HTTP layer and the desktop wrapper.
//!
//! The structures in this module are designed to be:
//! - serializable via `serde` so the API layer can emit them as JSON
//! - restricted to FFI-friendly primitives so `UniFFI` can lift them as-is

/// Diff request and result types.
pub mod diff;
/// Repository metadata surfaced alongside a diff.
pub mod repository;

pub use diff::{ComparisonRequest, DiffMode, DiffStats, FileChange, FileStatus};
pub use repository::RepositoryInfo;
