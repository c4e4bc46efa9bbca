use std::collections::HashSet;
use std::fs;

use git2::{Status, StatusOptions};
use tracing::debug;

use super::{
    normalize::{count_changes, quote_path},
    Comparison,
};
use crate::{DiffStats, FileChange, FileStatus, Result};

/// Bytes inspected when deciding whether an untracked file is binary.
const BINARY_PROBE_LEN: usize = 8000;

/// Working tree (through the index) against HEAD, plus untracked files.
///
/// Before the first commit there is no HEAD tree, so the index is compared
/// against the empty tree instead.
pub(super) fn compare(context: &Comparison<'_>) -> Result<Vec<FileChange>> {
    let repo = context.git();
    let mut opts = context.diff_options();

    let mut diff = match context.repository.head_tree()? {
        Some(head_tree) => repo
            .diff_tree_to_workdir_with_index(Some(&head_tree), Some(&mut opts))
            .map_err(context.failure("diff working tree against HEAD"))?,
        None => {
            debug!("HEAD is unborn, diffing the index against the empty tree");
            repo.diff_tree_to_index(None, None, Some(&mut opts))
                .map_err(context.failure("diff index against the empty tree"))?
        }
    };
    context.detect_renames(&mut diff)?;

    let mut files = context.collect_files(&diff)?;

    let tracked: HashSet<String> = files.iter().map(|file| file.path.clone()).collect();
    for path in untracked_paths(context)? {
        context.check()?;
        if tracked.contains(&path) {
            continue;
        }
        if let Some(change) = read_untracked(context, &path) {
            files.push(change);
        }
    }

    Ok(files)
}

fn untracked_paths(context: &Comparison<'_>) -> Result<Vec<String>> {
    let mut opts = StatusOptions::new();
    opts.include_untracked(true)
        .recurse_untracked_dirs(true)
        .include_ignored(false)
        .exclude_submodules(true);

    let statuses = context
        .git()
        .statuses(Some(&mut opts))
        .map_err(context.failure("list untracked files"))?;

    Ok(statuses
        .iter()
        .filter(|entry| entry.status().contains(Status::WT_NEW))
        .filter_map(|entry| entry.path().map(str::to_owned))
        .collect())
}

fn read_untracked(context: &Comparison<'_>, path: &str) -> Option<FileChange> {
    let absolute = context.repository.resolve_in_root(path).ok()?;
    match fs::read(&absolute) {
        Ok(content) => Some(untracked_change(path, &content)),
        Err(err) => {
            debug!(path, error = %err, "skipping unreadable untracked file");
            None
        }
    }
}

/// Build a new-file patch for an untracked file from its contents.
///
/// Header paths are quoted like git's own, so the patch reads the same as a
/// tracked file's.
///
/// Content with a NUL byte near the start is treated as binary and gets a
/// `Binary files ... differ` body with zero counts.
#[must_use]
pub fn untracked_change(path: &str, content: &[u8]) -> FileChange {
    let old = quote_path("a/", path);
    let new = quote_path("b/", path);
    let mut patch = format!("diff --git {old} {new}\nnew file mode 100644\n");

    if content.iter().take(BINARY_PROBE_LEN).any(|&byte| byte == 0) {
        patch.push_str(&format!("Binary files /dev/null and {new} differ\n"));
        return FileChange::new(path, FileStatus::Untracked, DiffStats::ZERO, patch);
    }

    patch.push_str(&format!("--- /dev/null\n+++ {new}\n"));

    let text = String::from_utf8_lossy(content);
    let lines: Vec<&str> = text.split_inclusive('\n').collect();
    match lines.len() {
        0 => {}
        1 => patch.push_str("@@ -0,0 +1 @@\n"),
        count => patch.push_str(&format!("@@ -0,0 +1,{count} @@\n")),
    }
    for line in lines {
        patch.push('+');
        patch.push_str(line);
        if !line.ends_with('\n') {
            patch.push_str("\n\\ No newline at end of file\n");
        }
    }

    let stats = count_changes(&patch);
    FileChange::new(path, FileStatus::Untracked, stats, patch)
}
