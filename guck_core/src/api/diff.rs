use std::fmt;

use serde::{Deserialize, Serialize};

/// One changed file within a diff result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    /// Post-image path relative to the repository root (pre-image for deletions).
    pub path: String,
    /// Classification of the change.
    pub status: FileStatus,
    /// Number of added content lines.
    #[serde(default)]
    pub additions: u32,
    /// Number of removed content lines.
    #[serde(default)]
    pub deletions: u32,
    /// Self-contained unified diff for this file, starting at its `diff --git` header.
    #[serde(default)]
    pub patch: String,
}

impl FileChange {
    /// Build a record from a path, status, counted stats and patch text.
    pub fn new(
        path: impl Into<String>,
        status: FileStatus,
        stats: DiffStats,
        patch: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            status,
            additions: stats.additions,
            deletions: stats.deletions,
            patch: patch.into(),
        }
    }

    /// Line counts of this record.
    pub const fn stats(&self) -> DiffStats {
        DiffStats::new(self.additions, self.deletions)
    }
}

/// Summary information about the changes within a file diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DiffStats {
    /// Number of added lines.
    pub additions: u32,
    /// Number of removed lines.
    pub deletions: u32,
}

impl DiffStats {
    /// A stats instance with zero additions and deletions.
    pub const ZERO: Self = Self {
        additions: 0,
        deletions: 0,
    };

    /// Convenience constructor for explicit values.
    pub const fn new(additions: u32, deletions: u32) -> Self {
        Self {
            additions,
            deletions,
        }
    }
}

/// File status from the diff's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    /// File only exists on the compared side.
    Added,
    /// File exists on both sides with modifications.
    Modified,
    /// File only exists on the base side.
    Deleted,
    /// File path changed between base and compared side.
    Renamed,
    /// File exists in the working tree but is not tracked.
    Untracked,
}

impl FileStatus {
    /// Lowercase label used on the wire.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Modified => "modified",
            Self::Deleted => "deleted",
            Self::Renamed => "renamed",
            Self::Untracked => "untracked",
        }
    }

    /// Classify a change from its pre- and post-image names.
    ///
    /// A missing pre-image means the file was added, a missing post-image
    /// means it was deleted, and differing names mean it was renamed.
    pub fn from_names(pre: Option<&str>, post: Option<&str>) -> Self {
        match (pre.filter(|name| !name.is_empty()), post.filter(|name| !name.is_empty())) {
            (None, _) => Self::Added,
            (Some(_), None) => Self::Deleted,
            (Some(pre), Some(post)) if pre != post => Self::Renamed,
            (Some(_), Some(_)) => Self::Modified,
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which pair of repository states a diff compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum DiffMode {
    /// HEAD against the merge base with a base branch.
    #[default]
    Branch,
    /// Working tree (staged and unstaged) plus untracked files against HEAD.
    Working,
    /// Index against HEAD.
    Staged,
}

impl DiffMode {
    /// Every mode, in the order the UI lists them.
    pub const ALL: [Self; 3] = [Self::Branch, Self::Working, Self::Staged];

    /// Lowercase label used on the wire.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Branch => "branch",
            Self::Working => "working",
            Self::Staged => "staged",
        }
    }

    /// Parse a mode label, falling back to [`DiffMode::Branch`] for anything
    /// unknown or empty.
    pub fn parse_or_default(value: &str) -> Self {
        Self::parse(value).unwrap_or_default()
    }

    /// Parse a mode label exactly (case-insensitive, surrounding whitespace ignored).
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(value))
    }
}

impl From<String> for DiffMode {
    fn from(value: String) -> Self {
        Self::parse_or_default(&value)
    }
}

impl From<&str> for DiffMode {
    fn from(value: &str) -> Self {
        Self::parse_or_default(value)
    }
}

impl fmt::Display for DiffMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input describing which comparison to run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ComparisonRequest {
    /// Comparison strategy.
    #[serde(default)]
    pub mode: DiffMode,
    /// Base branch name, only consulted in [`DiffMode::Branch`].
    #[serde(default)]
    pub base_branch: String,
}

impl ComparisonRequest {
    /// Compare HEAD against `base_branch`.
    pub fn branch(base_branch: impl Into<String>) -> Self {
        Self {
            mode: DiffMode::Branch,
            base_branch: base_branch.into(),
        }
    }

    /// Compare the working tree against HEAD.
    pub fn working() -> Self {
        Self {
            mode: DiffMode::Working,
            base_branch: String::new(),
        }
    }

    /// Compare the index against HEAD.
    pub fn staged() -> Self {
        Self {
            mode: DiffMode::Staged,
            base_branch: String::new(),
        }
    }
}
