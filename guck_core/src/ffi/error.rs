use std::sync::PoisonError;

use thiserror::Error;

use crate::Error;

/// Errors surfaced through the `UniFFI` bindings.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Path does not correspond to a git repository.
    #[error("path is not a git repository")]
    NotARepository,
    /// Repository is bare and unsupported.
    #[error("repository is bare and unsupported")]
    BareRepository,
    /// Requested base branch does not exist.
    #[error("base branch not found")]
    BranchNotFound,
    /// Repository has no commits to compare against.
    #[error("repository has no commits yet")]
    NoCommits,
    /// libgit2 could not produce the diff.
    #[error("diff computation failed")]
    DiffFailed,
    /// Request was cancelled or timed out.
    #[error("diff computation was cancelled")]
    Cancelled,
    /// Path does not exist in the requested revision.
    #[error("path not found")]
    PathNotFound,
    /// Path escapes the repository root.
    #[error("path is outside the repository")]
    PathOutsideRepository,
    /// Underlying git operation failed.
    #[error("git error")]
    Git,
    /// Filesystem interaction failed.
    #[error("filesystem error")]
    Io,
    /// Internal invariant failed.
    #[error("internal error")]
    Internal,
}

impl From<Error> for CoreError {
    fn from(error: Error) -> Self {
        match error {
            Error::Git { .. } => Self::Git,
            Error::NotARepository { .. } => Self::NotARepository,
            Error::BareRepository { .. } => Self::BareRepository,
            Error::BranchNotFound { .. } => Self::BranchNotFound,
            Error::NoCommits => Self::NoCommits,
            Error::DiffFailed { .. } => Self::DiffFailed,
            Error::Cancelled => Self::Cancelled,
            Error::PathNotFound { .. } => Self::PathNotFound,
            Error::PathOutsideRepository { .. } => Self::PathOutsideRepository,
            Error::Io { .. } => Self::Io,
        }
    }
}

impl<T> From<PoisonError<T>> for CoreError {
    fn from(_: PoisonError<T>) -> Self {
        Self::Internal
    }
}
