//! Split `git diff`-style text into per-file [`FileChange`] records.
//!
//! The parser is total: malformed segments are logged and skipped, and text
//! with no `diff --git` boundary yields an empty list.

use std::collections::HashSet;

use tracing::debug;

use crate::{DiffStats, FileChange, FileStatus};

const BOUNDARY: &str = "diff --git ";
const HUNK_MARKER: &str = "@@";

/// Parse a unified diff into one [`FileChange`] per file section.
///
/// Each record's `patch` is the exact text of its section, from its
/// `diff --git` line up to the next one. Anything before the first boundary
/// is discarded. When a path appears twice the first section wins.
#[must_use]
pub fn parse_unified_diff(text: &str) -> Vec<FileChange> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for segment in segments(text) {
        let Some(change) = parse_segment(segment) else {
            debug!(
                header = segment.lines().next().unwrap_or_default(),
                "skipping diff section without a usable path"
            );
            continue;
        };
        if seen.insert(change.path.clone()) {
            files.push(change);
        } else {
            debug!(path = %change.path, "dropping repeated diff section");
        }
    }

    files
}

/// Count added and removed lines inside the hunks of a patch.
///
/// Only lines after the first `@@` header count, so `---`/`+++` file headers
/// are never mistaken for content and a removed line that itself starts with
/// `--` is still a deletion. `\ No newline at end of file` markers and binary
/// notices count as nothing.
#[must_use]
pub fn count_changes(patch: &str) -> DiffStats {
    let mut stats = DiffStats::ZERO;
    let mut in_hunk = false;

    for line in patch.lines() {
        if line.starts_with(BOUNDARY) {
            in_hunk = false;
        } else if line.starts_with(HUNK_MARKER) {
            in_hunk = true;
        } else if in_hunk {
            match line.as_bytes().first() {
                Some(b'+') => stats.additions = stats.additions.saturating_add(1),
                Some(b'-') => stats.deletions = stats.deletions.saturating_add(1),
                _ => {}
            }
        }
    }

    stats
}

/// Slice `text` at every `diff --git ` that starts a line.
fn segments(text: &str) -> Vec<&str> {
    let starts: Vec<usize> = text
        .match_indices(BOUNDARY)
        .map(|(index, _)| index)
        .filter(|&index| index == 0 || text.as_bytes()[index - 1] == b'\n')
        .collect();

    starts
        .iter()
        .enumerate()
        .map(|(n, &start)| {
            let end = starts.get(n + 1).copied().unwrap_or(text.len());
            &text[start..end]
        })
        .collect()
}

fn parse_segment(segment: &str) -> Option<FileChange> {
    let header = segment.lines().next()?.strip_prefix(BOUNDARY)?;
    let path = post_image_path(header)?;
    let status = classify(segment);
    let stats = count_changes(segment);

    Some(FileChange::new(path, status, stats, segment))
}

/// Path of the post-image named by a `diff --git` header (boundary stripped).
fn post_image_path(header: &str) -> Option<String> {
    let header = header.trim_end();

    if let Some(path) = symmetric_path(header) {
        return Some(path.to_owned());
    }

    // Quoted paths: "a/caf\303\251" "b/caf\303\251"
    if let Some(index) = header.rfind(" \"b/") {
        let path = unquote(header[index + 4..].strip_suffix('"')?);
        return (!path.is_empty()).then_some(path);
    }

    if let Some(index) = header.rfind(" b/") {
        let path = &header[index + 3..];
        if !path.is_empty() {
            return Some(path.to_owned());
        }
    }

    let token = header.split_whitespace().nth(1)?.trim_matches('"');
    let path = token.strip_prefix("b/").unwrap_or(token);
    (!path.is_empty()).then(|| path.to_owned())
}

/// `prefix` followed by `path`, C-quoted the way git writes header paths
/// whenever the name holds control characters, quotes, backslashes or
/// non-ASCII bytes.
#[must_use]
pub fn quote_path(prefix: &str, path: &str) -> String {
    let needs_quoting = path
        .bytes()
        .any(|byte| byte < 0x20 || byte >= 0x7f || byte == b'"' || byte == b'\\');
    if !needs_quoting {
        return format!("{prefix}{path}");
    }

    let mut quoted = format!("\"{prefix}");
    for byte in path.bytes() {
        match byte {
            b'\x07' => quoted.push_str("\\a"),
            b'\x08' => quoted.push_str("\\b"),
            b'\t' => quoted.push_str("\\t"),
            b'\n' => quoted.push_str("\\n"),
            b'\x0b' => quoted.push_str("\\v"),
            b'\x0c' => quoted.push_str("\\f"),
            b'\r' => quoted.push_str("\\r"),
            b'"' => quoted.push_str("\\\""),
            b'\\' => quoted.push_str("\\\\"),
            0x20..=0x7e => quoted.push(char::from(byte)),
            _ => quoted.push_str(&format!("\\{byte:03o}")),
        }
    }
    quoted.push('"');
    quoted
}

/// Undo git's C-quoting of a path (the text between the quotes).
///
/// Octal escapes are raw bytes, so multi-byte UTF-8 names are reassembled
/// before decoding. Unknown escapes keep the escaped character.
fn unquote(quoted: &str) -> String {
    let mut bytes = Vec::with_capacity(quoted.len());
    let mut input = quoted.bytes().peekable();

    while let Some(byte) = input.next() {
        if byte != b'\\' {
            bytes.push(byte);
            continue;
        }
        let Some(escaped) = input.next() else {
            bytes.push(byte);
            break;
        };
        let decoded = match escaped {
            b'a' => 0x07,
            b'b' => 0x08,
            b't' => b'\t',
            b'n' => b'\n',
            b'v' => 0x0b,
            b'f' => 0x0c,
            b'r' => b'\r',
            b'0'..=b'7' => {
                let mut value = u32::from(escaped - b'0');
                for _ in 0..2 {
                    match input.peek() {
                        Some(&digit @ b'0'..=b'7') => {
                            value = value * 8 + u32::from(digit - b'0');
                            input.next();
                        }
                        _ => break,
                    }
                }
                u8::try_from(value).unwrap_or(u8::MAX)
            }
            other => other,
        };
        bytes.push(decoded);
    }

    String::from_utf8_lossy(&bytes).into_owned()
}

/// `a/<p> b/<p>` with identical halves; handles paths containing ` b/`.
fn symmetric_path(header: &str) -> Option<&str> {
    let rest = header.strip_prefix("a/")?;
    let len = rest.len().checked_sub(3)?;
    if len == 0 || len % 2 != 0 {
        return None;
    }

    let half = len / 2;
    let old = rest.get(..half)?;
    let new = rest.get(half..)?.strip_prefix(" b/")?;
    (old == new).then_some(new)
}

/// Status from the extended header lines between the boundary and the first
/// hunk.
fn classify(segment: &str) -> FileStatus {
    let header_lines = segment
        .lines()
        .skip(1)
        .take_while(|line| !line.starts_with(HUNK_MARKER));

    for line in header_lines {
        if line.starts_with("new file mode") {
            return FileStatus::Added;
        }
        if line.starts_with("deleted file mode") {
            return FileStatus::Deleted;
        }
        if line.starts_with("rename from") {
            return FileStatus::Renamed;
        }
    }

    FileStatus::Modified
}
