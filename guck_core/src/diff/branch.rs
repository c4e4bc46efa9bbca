use git2::{Commit, ErrorCode, Oid, Repository as GitRepository};
use tracing::{debug, warn};

use super::Comparison;
use crate::{Error, FileChange, Result};

const REMOTE_PREFIX: &str = "refs/remotes/origin/";
const LOCAL_PREFIX: &str = "refs/heads/";

/// HEAD against its merge base with `base_branch`.
///
/// The remote-tracking ref wins over the local branch so a stale local copy
/// of the base does not inflate the result. Unrelated histories fall back to
/// the base tip.
pub(super) fn compare(context: &Comparison<'_>, base_branch: &str) -> Result<Vec<FileChange>> {
    let repo = context.git();
    let base = resolve_base(repo, base_branch)?;
    let head = context.repository.head_commit()?.ok_or(Error::NoCommits)?;
    context.check()?;

    let base_tree = match merge_base(context, base.id(), head.id())? {
        Some(oid) => repo.find_commit(oid)?.tree()?,
        None => {
            warn!(
                base = base_branch,
                "base branch shares no history with HEAD, comparing against its tip"
            );
            base.tree()?
        }
    };
    let head_tree = head.tree()?;

    let mut opts = context.diff_options();
    let mut diff = repo
        .diff_tree_to_tree(Some(&base_tree), Some(&head_tree), Some(&mut opts))
        .map_err(context.failure("diff merge base against HEAD"))?;
    context.detect_renames(&mut diff)?;

    context.collect_files(&diff)
}

fn resolve_base<'r>(repo: &'r GitRepository, branch: &str) -> Result<Commit<'r>> {
    for name in [format!("{REMOTE_PREFIX}{branch}"), format!("{LOCAL_PREFIX}{branch}")] {
        match repo.find_reference(&name) {
            Ok(reference) => {
                debug!(reference = %name, "resolved base branch");
                return Ok(reference.peel_to_commit()?);
            }
            Err(err) if matches!(err.code(), ErrorCode::NotFound | ErrorCode::InvalidSpec) => {}
            Err(err) => return Err(err.into()),
        }
    }

    Err(Error::BranchNotFound {
        branch: branch.to_owned(),
    })
}

fn merge_base(context: &Comparison<'_>, base: Oid, head: Oid) -> Result<Option<Oid>> {
    match context.git().merge_bases(base, head) {
        Ok(bases) => {
            let first = bases.first().copied();
            debug!(merge_base = ?first, candidates = bases.len(), "resolved merge base");
            Ok(first)
        }
        Err(err) if err.code() == ErrorCode::NotFound => Ok(None),
        Err(err) => Err(context.failure("compute merge base")(err)),
    }
}
