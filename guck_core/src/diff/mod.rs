//! Diff computation: strategy selection, the three comparators and the
//! normalizer that turns unified diff text into [`FileChange`] records.
//!
//! The comparators build records straight from libgit2 deltas; the
//! normalizer handles diff text that arrives from elsewhere.

mod branch;
pub mod normalize;
mod staged;
mod working;

use std::collections::HashSet;
use std::path::Path;

use git2::{
    Delta, Diff, DiffDelta, DiffFindOptions, DiffOptions, Patch, Repository as GitRepository,
};
use tracing::debug;

pub use normalize::{count_changes, parse_unified_diff};
pub use working::untracked_change;

use crate::{
    Cancellation, ComparisonRequest, DiffConfig, DiffMode, Error, FileChange, FileStatus,
    Repository, Result,
};

/// Entry point for diff generation.
///
/// The engine only holds immutable options, so one instance can serve any
/// number of requests against any number of repositories.
#[derive(Debug, Clone, Default)]
pub struct DiffEngine {
    config: DiffConfig,
}

impl DiffEngine {
    /// Construct an engine with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct an engine with explicit options.
    #[must_use]
    pub const fn with_config(config: DiffConfig) -> Self {
        Self { config }
    }

    /// Options this engine runs with.
    #[must_use]
    pub const fn config(&self) -> &DiffConfig {
        &self.config
    }

    /// Compute the file list for `request` against `repository`.
    ///
    /// A branch request without a base branch uses the configured one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BranchNotFound`], [`Error::NoCommits`],
    /// [`Error::DiffFailed`] or [`Error::Cancelled`] depending on the mode;
    /// see the individual comparators.
    pub fn compute(
        &self,
        repository: &Repository,
        request: &ComparisonRequest,
        cancellation: &Cancellation,
    ) -> Result<Vec<FileChange>> {
        let comparator = Comparator::for_request(request, &self.config);
        debug!(?comparator, root = %repository.root().display(), "computing diff");
        cancellation.check()?;

        let context = Comparison {
            repository,
            config: &self.config,
            cancellation,
        };

        match comparator.run(&context) {
            Ok(files) => {
                debug!(mode = %request.mode, files = files.len(), "diff computed");
                Ok(files)
            }
            Err(Error::Cancelled) => {
                debug!(mode = %request.mode, "diff cancelled");
                Err(Error::Cancelled)
            }
            Err(err) => Err(err),
        }
    }
}

/// The comparison strategy selected for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator<'a> {
    /// HEAD against its merge base with `base_branch`.
    Branch {
        /// Branch to compare against, looked up on `origin` first.
        base_branch: &'a str,
    },
    /// Working tree and untracked files against HEAD.
    Working,
    /// Index against HEAD.
    Staged,
}

impl<'a> Comparator<'a> {
    /// Select the strategy for `request`, filling in the configured base
    /// branch when the request leaves it empty.
    #[must_use]
    pub fn for_request(request: &'a ComparisonRequest, config: &'a DiffConfig) -> Self {
        match request.mode {
            DiffMode::Working => Self::Working,
            DiffMode::Staged => Self::Staged,
            DiffMode::Branch => {
                let requested = request.base_branch.trim();
                Self::Branch {
                    base_branch: if requested.is_empty() {
                        config.base_branch.as_str()
                    } else {
                        requested
                    },
                }
            }
        }
    }

    fn run(self, context: &Comparison<'_>) -> Result<Vec<FileChange>> {
        match self {
            Self::Branch { base_branch } => branch::compare(context, base_branch),
            Self::Working => working::compare(context),
            Self::Staged => staged::compare(context),
        }
    }
}

/// Everything a comparator needs for one request.
pub(crate) struct Comparison<'a> {
    pub(crate) repository: &'a Repository,
    pub(crate) config: &'a DiffConfig,
    pub(crate) cancellation: &'a Cancellation,
}

impl Comparison<'_> {
    pub(crate) const fn git(&self) -> &GitRepository {
        self.repository.git_repo()
    }

    pub(crate) fn check(&self) -> Result<()> {
        self.cancellation.check()
    }

    pub(crate) fn diff_options(&self) -> DiffOptions {
        let mut opts = DiffOptions::new();
        opts.context_lines(self.config.context_lines)
            .ignore_submodules(true)
            .include_untracked(false);
        opts
    }

    /// Pair deleted and added files of similar content into renames.
    pub(crate) fn detect_renames(&self, diff: &mut Diff<'_>) -> Result<()> {
        if !self.config.detect_renames {
            return Ok(());
        }

        let mut find = DiffFindOptions::new();
        find.renames(true);
        diff.find_similar(Some(&mut find))
            .map_err(self.failure("detect renames"))
    }

    /// One record per delta of `diff`, with the per-file patch text rendered
    /// by libgit2 and paths taken from the delta rather than the header.
    ///
    /// The handle is polled before every delta; a tripped handle discards
    /// everything collected so far.
    pub(crate) fn collect_files(&self, diff: &Diff<'_>) -> Result<Vec<FileChange>> {
        let mut seen = HashSet::new();
        let mut files = Vec::with_capacity(diff.deltas().len());

        for (index, delta) in diff.deltas().enumerate() {
            self.check()?;

            let (pre, post) = image_paths(&delta);
            let status = FileStatus::from_names(pre.as_deref(), post.as_deref());
            let Some(path) = post.or(pre) else {
                debug!(index, "skipping delta without a path");
                continue;
            };

            let patch = match Patch::from_diff(diff, index)
                .map_err(self.failure("build file patch"))?
            {
                Some(mut patch) => {
                    let buffer = patch.to_buf().map_err(self.failure("render file patch"))?;
                    String::from_utf8_lossy(buffer.as_ref()).into_owned()
                }
                None => String::new(),
            };

            if seen.insert(path.clone()) {
                let stats = count_changes(&patch);
                files.push(FileChange::new(path, status, stats, patch));
            }
        }

        Ok(files)
    }

    /// Map a libgit2 failure to [`Error::DiffFailed`], or to
    /// [`Error::Cancelled`] when the handle tripped while libgit2 was busy.
    pub(crate) fn failure(&self, operation: &'static str) -> impl Fn(git2::Error) -> Error + '_ {
        move |source| {
            if self.cancellation.is_cancelled() {
                Error::Cancelled
            } else {
                Error::DiffFailed { operation, source }
            }
        }
    }
}

/// Pre- and post-image names, with the absent side of additions and
/// deletions left empty.
fn image_paths(delta: &DiffDelta<'_>) -> (Option<String>, Option<String>) {
    let old = delta.old_file().path().map(path_string);
    let new = delta.new_file().path().map(path_string);

    match delta.status() {
        Delta::Added | Delta::Untracked => (None, new),
        Delta::Deleted => (old, None),
        _ => (old, new),
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use git2::{ErrorClass, ErrorCode, IndexAddOption};
    use tempfile::TempDir;

    use super::*;

    fn staged_files(count: usize) -> Result<(TempDir, Repository)> {
        let temp = TempDir::new().expect("tempdir");
        let git = GitRepository::init(temp.path())?;
        for n in 0..count {
            fs::write(temp.path().join(format!("file{n}.txt")), "one\ntwo\n")
                .expect("write file");
        }
        let mut index = git.index()?;
        index.add_all(["*"], IndexAddOption::DEFAULT, None)?;
        index.write()?;

        let repository = Repository::open(temp.path())?;
        Ok((temp, repository))
    }

    #[test]
    fn selector_routes_each_mode() {
        let config = DiffConfig::default();

        let working = ComparisonRequest::working();
        assert_eq!(
            Comparator::for_request(&working, &config),
            Comparator::Working
        );

        let staged = ComparisonRequest::staged();
        assert_eq!(Comparator::for_request(&staged, &config), Comparator::Staged);

        let branch = ComparisonRequest::branch("develop");
        assert_eq!(
            Comparator::for_request(&branch, &config),
            Comparator::Branch {
                base_branch: "develop"
            }
        );
    }

    #[test]
    fn empty_base_branch_uses_configured_default() {
        let config = DiffConfig {
            base_branch: "trunk".to_owned(),
            ..DiffConfig::default()
        };
        let request = ComparisonRequest::default();

        assert_eq!(
            Comparator::for_request(&request, &config),
            Comparator::Branch {
                base_branch: "trunk"
            }
        );
    }

    #[test]
    fn tripping_between_deltas_discards_collected_files() -> Result<()> {
        let (_temp, repository) = staged_files(6)?;
        let config = DiffConfig::default();
        let cancellation = Cancellation::new();
        let context = Comparison {
            repository: &repository,
            config: &config,
            cancellation: &cancellation,
        };

        let mut opts = context.diff_options();
        let diff = context.git().diff_tree_to_index(None, None, Some(&mut opts))?;
        assert_eq!(diff.deltas().len(), 6);
        assert_eq!(context.collect_files(&diff)?.len(), 6);

        // The request already passed its entry check; trip it from another holder.
        cancellation.clone().cancel();
        assert!(matches!(context.collect_files(&diff), Err(Error::Cancelled)));

        Ok(())
    }

    #[test]
    fn libgit2_aborts_read_as_cancelled_once_tripped() -> Result<()> {
        let (_temp, repository) = staged_files(1)?;
        let config = DiffConfig::default();
        let cancellation = Cancellation::new();
        let context = Comparison {
            repository: &repository,
            config: &config,
            cancellation: &cancellation,
        };
        let aborted = || git2::Error::new(ErrorCode::User, ErrorClass::Callback, "aborted");

        assert!(matches!(
            context.failure("render file patch")(aborted()),
            Error::DiffFailed {
                operation: "render file patch",
                ..
            }
        ));

        cancellation.cancel();
        assert!(matches!(
            context.failure("render file patch")(aborted()),
            Error::Cancelled
        ));

        Ok(())
    }
}
