//! Core library for guck's local diff review workflow.
//!
//! The crate is layered around three primary responsibilities:
//! - repository access (HEAD, branch, remote and default-branch discovery)
//! - diff computation for branch, working-tree and staged comparisons
//! - a `UniFFI` session surface for the desktop wrapper
//!
//! Every call reads repository state at call time; nothing is cached between
//! requests.

#![warn(
    clippy::all,
    clippy::cargo,
    clippy::nursery,
    clippy::pedantic,
    missing_docs
)]
#![cfg_attr(
    not(test),
    deny(
        clippy::dbg_macro,
        clippy::expect_used,
        clippy::panic,
        clippy::print_stderr,
        clippy::print_stdout,
        clippy::todo,
        clippy::unwrap_used
    )
)]

use std::path::Path;

/// Public data models shared with the API layer.
pub mod api;
/// Cooperative cancellation for long-running comparisons.
pub mod cancel;
/// Engine options and their environment overrides.
pub mod config;
/// Comparison strategies and unified-diff normalization.
pub mod diff;
/// Public FFI surface.
pub mod ffi;
/// Git repository access helpers.
pub mod repository;

pub use api::{ComparisonRequest, DiffMode, DiffStats, FileChange, FileStatus, RepositoryInfo};
pub use cancel::Cancellation;
pub use config::DiffConfig;
pub use diff::DiffEngine;
pub use ffi::{open, CoreError, CoreSession};
pub use repository::Repository;

// Generated FFI converters name the tag as `crate::UniFfiTag`.
use ffi::UniFfiTag;

/// Common result type for the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the core library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Underlying git operation failed.
    #[error("git error: {source}")]
    Git {
        /// Original libgit2 error bubbled up by the core library.
        #[from]
        source: git2::Error,
    },
    /// Provided path does not correspond to a git repository.
    #[error("path does not reference a git repository: {path}")]
    NotARepository {
        /// Path that failed to resolve to a repository.
        path: String,
    },
    /// Bare repositories have no working tree to review.
    #[error("repository at {path} is bare and unsupported")]
    BareRepository {
        /// Path of the repository lacking a working tree.
        path: String,
    },
    /// Requested base branch exists neither on `origin` nor locally.
    #[error("base branch '{branch}' not found locally or on origin")]
    BranchNotFound {
        /// Branch name as requested by the caller.
        branch: String,
    },
    /// HEAD does not point at a commit yet.
    #[error("repository has no commits yet")]
    NoCommits,
    /// libgit2 could not produce the requested diff.
    #[error("failed to {operation}: {source}")]
    DiffFailed {
        /// Step that failed, phrased as a verb.
        operation: &'static str,
        /// Original libgit2 error.
        #[source]
        source: git2::Error,
    },
    /// The caller cancelled the request or its deadline passed.
    #[error("diff computation was cancelled")]
    Cancelled,
    /// Path does not exist in the requested revision.
    #[error("path not found: {path}")]
    PathNotFound {
        /// Repository-relative path that was requested.
        path: String,
    },
    /// Path is absolute or climbs out of the working tree.
    #[error("path escapes the repository root: {path}")]
    PathOutsideRepository {
        /// Repository-relative path that was requested.
        path: String,
    },
    /// Filesystem interaction failed.
    #[error("failed to access {path}: {source}")]
    Io {
        /// Filesystem path involved in the failed operation.
        path: String,
        /// Source I/O error returned by the standard library.
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Whether the caller asked for a base branch that does not exist.
    ///
    /// Callers typically pair this with [`Repository::default_branch`] to
    /// suggest a correction.
    pub const fn is_branch_not_found(&self) -> bool {
        matches!(self, Self::BranchNotFound { .. })
    }

    /// Whether the request ended early because of cancellation.
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Open the repository containing `root` and compute a diff in one call.
///
/// This is the entry point used by the HTTP layer: it discovers the
/// repository, dispatches on `mode` and returns the normalized file list.
///
/// # Errors
///
/// Returns [`Error::NotARepository`] when no repository is found,
/// [`Error::BranchNotFound`] for an unknown base in branch mode,
/// [`Error::NoCommits`] in branch/staged mode before the first commit,
/// [`Error::DiffFailed`] when libgit2 cannot produce the diff, and
/// [`Error::Cancelled`] when `cancellation` trips.
pub fn compute_diff(
    root: impl AsRef<Path>,
    mode: DiffMode,
    base_branch: &str,
    cancellation: &Cancellation,
) -> Result<Vec<FileChange>> {
    let repository = Repository::open(root)?;
    let request = ComparisonRequest {
        mode,
        base_branch: base_branch.to_owned(),
    };
    DiffEngine::new().compute(&repository, &request, cancellation)
}
