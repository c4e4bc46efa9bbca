//! Repository access built on top of libgit2.

use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};

use git2::{
    Commit, ErrorClass, ErrorCode, Repository as GitRepository, Status, StatusOptions, Tree,
};
use tracing::debug;

use crate::{api::RepositoryInfo, Error, Result};

/// Branch names probed, in order, when `origin/HEAD` is not set.
const DEFAULT_BRANCH_CANDIDATES: [&str; 4] = ["main", "master", "develop", "development"];
/// Last-resort default branch guess.
const FALLBACK_DEFAULT_BRANCH: &str = "main";
const DETACHED_HEAD: &str = "HEAD";
const ORIGIN: &str = "origin";
const ORIGIN_PREFIX: &str = "refs/remotes/origin/";
const LOCAL_PREFIX: &str = "refs/heads/";

/// Lightweight handle to the repository a review runs against.
pub struct Repository {
    inner: GitRepository,
    root: PathBuf,
}

impl Repository {
    /// Open the repository containing `path`, walking up parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be canonicalized, does not resolve
    /// to a git repository, or resolves to a bare repository.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let original = path.as_ref();
        let canonical = fs::canonicalize(original).map_err(|source| Error::Io {
            path: display_path(original),
            source,
        })?;

        let repo = match GitRepository::discover(&canonical) {
            Ok(repo) => repo,
            Err(err)
                if err.class() == ErrorClass::Repository && err.code() == ErrorCode::NotFound =>
            {
                return Err(Error::NotARepository {
                    path: display_path(&canonical),
                })
            }
            Err(err) => return Err(Error::from(err)),
        };

        let root = repo
            .workdir()
            .map(Path::to_path_buf)
            .ok_or_else(|| Error::BareRepository {
                path: display_path(&canonical),
            })?;

        debug!(root = %root.display(), "opened repository");
        Ok(Self { inner: repo, root })
    }

    /// Returns the absolute path to the working-tree root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Short name of the checked-out branch, or `"HEAD"` when detached.
    ///
    /// Before the first commit this is the branch HEAD will create.
    ///
    /// # Errors
    ///
    /// Propagates failures reading the HEAD reference.
    pub fn current_branch(&self) -> Result<String> {
        let head = self.inner.find_reference("HEAD")?;
        match head.symbolic_target() {
            Some(target) => Ok(target
                .strip_prefix(LOCAL_PREFIX)
                .unwrap_or(target)
                .to_owned()),
            None => Ok(DETACHED_HEAD.to_owned()),
        }
    }

    /// Full hex object id of the HEAD commit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoCommits`] before the first commit.
    pub fn current_commit(&self) -> Result<String> {
        self.head_commit()?
            .map(|commit| commit.id().to_string())
            .ok_or(Error::NoCommits)
    }

    /// Fetch URL of the `origin` remote, if one is configured.
    ///
    /// # Errors
    ///
    /// Propagates libgit2 failures other than a missing remote.
    pub fn remote_url(&self) -> Result<Option<String>> {
        match self.inner.find_remote(ORIGIN) {
            Ok(remote) => Ok(remote.url().map(str::to_owned)),
            Err(err) if err.code() == ErrorCode::NotFound => Ok(None),
            Err(err) if err.class() == ErrorClass::Config => Ok(None),
            Err(err) => Err(Error::from(err)),
        }
    }

    /// Best-effort guess of the repository's default branch.
    ///
    /// Follows `origin/HEAD` when it is a symbolic reference, then probes
    /// well-known names (remote-tracking before local), then falls back to
    /// `"main"`. Never fails.
    #[must_use]
    pub fn default_branch(&self) -> String {
        if let Some(branch) = self.origin_head_branch() {
            return branch;
        }

        DEFAULT_BRANCH_CANDIDATES
            .into_iter()
            .find(|candidate| {
                self.reference_exists(&format!("{ORIGIN_PREFIX}{candidate}"))
                    || self.reference_exists(&format!("{LOCAL_PREFIX}{candidate}"))
            })
            .unwrap_or(FALLBACK_DEFAULT_BRANCH)
            .to_owned()
    }

    /// Aggregated metadata for status responses.
    ///
    /// # Errors
    ///
    /// Propagates errors from reading HEAD or the remote configuration.
    pub fn info(&self) -> Result<RepositoryInfo> {
        Ok(RepositoryInfo {
            root: display_path(&self.root),
            branch: self.current_branch()?,
            commit: self.head_commit()?.map(|commit| commit.id().to_string()),
            remote_url: self.remote_url()?,
            default_branch: self.default_branch(),
        })
    }

    /// Whether the working tree differs from HEAD, untracked files included.
    ///
    /// # Errors
    ///
    /// Propagates libgit2 status enumeration failures.
    pub fn has_uncommitted_changes(&self) -> Result<bool> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(true)
            .include_ignored(false)
            .exclude_submodules(true);

        let statuses = self.inner.statuses(Some(&mut opts))?;
        Ok(statuses.iter().any(|entry| {
            let status = entry.status();
            status != Status::CURRENT && !status.contains(Status::IGNORED)
        }))
    }

    /// Whether the index differs from HEAD.
    ///
    /// # Errors
    ///
    /// Propagates failures reading HEAD, the index, or diffing them.
    pub fn has_staged_changes(&self) -> Result<bool> {
        let head_tree = self.head_tree()?;
        let diff = self
            .inner
            .diff_tree_to_index(head_tree.as_ref(), None, None)?;
        Ok(diff.deltas().len() > 0)
    }

    /// Contents of `path` as committed at HEAD.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoCommits`] before the first commit and
    /// [`Error::PathNotFound`] when HEAD has no such file.
    pub fn file_at_head(&self, path: &str) -> Result<String> {
        let tree = self.head_tree()?.ok_or(Error::NoCommits)?;
        let entry = match tree.get_path(Path::new(path)) {
            Ok(entry) => entry,
            Err(err) if err.code() == ErrorCode::NotFound => {
                return Err(Error::PathNotFound {
                    path: path.to_owned(),
                })
            }
            Err(err) => return Err(Error::from(err)),
        };

        let blob = entry.to_object(&self.inner)?.peel_to_blob()?;
        Ok(String::from_utf8_lossy(blob.content()).into_owned())
    }

    /// Contents of `path` as it currently sits in the working tree.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PathOutsideRepository`] for absolute or `..` paths,
    /// [`Error::PathNotFound`] when the file is missing, and [`Error::Io`]
    /// for other read failures.
    pub fn working_file(&self, path: &str) -> Result<String> {
        let absolute = self.resolve_in_root(path)?;
        let bytes = fs::read(&absolute).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                Error::PathNotFound {
                    path: path.to_owned(),
                }
            } else {
                Error::Io {
                    path: path.to_owned(),
                    source,
                }
            }
        })?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub(crate) const fn git_repo(&self) -> &GitRepository {
        &self.inner
    }

    /// HEAD commit, or `None` when HEAD is unborn.
    pub(crate) fn head_commit(&self) -> Result<Option<Commit<'_>>> {
        let head = match self.inner.head() {
            Ok(head) => head,
            Err(err) if is_unborn(&err) => return Ok(None),
            Err(err) => return Err(Error::from(err)),
        };

        let resolved = head.resolve()?;
        Ok(Some(resolved.peel_to_commit()?))
    }

    /// Tree of the HEAD commit, or `None` when HEAD is unborn.
    pub(crate) fn head_tree(&self) -> Result<Option<Tree<'_>>> {
        match self.head_commit()? {
            Some(commit) => Ok(Some(commit.tree()?)),
            None => Ok(None),
        }
    }

    /// Resolve a repository-relative path, rejecting anything outside the root.
    pub(crate) fn resolve_in_root(&self, relative: &str) -> Result<PathBuf> {
        let candidate = Path::new(relative);
        let escapes = candidate.is_absolute()
            || candidate
                .components()
                .any(|component| matches!(component, Component::ParentDir | Component::Prefix(_)));
        if escapes {
            return Err(Error::PathOutsideRepository {
                path: relative.to_owned(),
            });
        }

        Ok(self.root.join(candidate))
    }

    fn origin_head_branch(&self) -> Option<String> {
        let reference = self
            .inner
            .find_reference(&format!("{ORIGIN_PREFIX}HEAD"))
            .ok()?;
        let branch = reference.symbolic_target()?.strip_prefix(ORIGIN_PREFIX)?;
        (!branch.is_empty()).then(|| branch.to_owned())
    }

    fn reference_exists(&self, name: &str) -> bool {
        self.inner.find_reference(name).is_ok()
    }
}

/// Whether a libgit2 error means HEAD points at a branch with no commits.
pub(crate) fn is_unborn(err: &git2::Error) -> bool {
    matches!(
        (err.class(), err.code()),
        (
            ErrorClass::Reference,
            ErrorCode::NotFound | ErrorCode::UnbornBranch
        )
    )
}

pub(crate) fn display_path(path: &Path) -> String {
    path.to_path_buf()
        .into_os_string()
        .to_string_lossy()
        .into_owned()
}

impl fmt::Debug for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}
