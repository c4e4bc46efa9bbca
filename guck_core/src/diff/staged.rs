use super::Comparison;
use crate::{Error, FileChange, Result};

/// Index against the HEAD tree, i.e. what the next commit would contain.
pub(super) fn compare(context: &Comparison<'_>) -> Result<Vec<FileChange>> {
    let repo = context.git();
    let head_tree = context.repository.head_tree()?.ok_or(Error::NoCommits)?;

    // Without an explicit index libgit2 reloads it from disk first.
    let mut opts = context.diff_options();
    let mut diff = repo
        .diff_tree_to_index(Some(&head_tree), None, Some(&mut opts))
        .map_err(context.failure("diff index against HEAD"))?;
    context.detect_renames(&mut diff)?;

    context.collect_files(&diff)
}
