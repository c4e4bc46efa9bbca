//! Engine options with environment overrides.

use std::env;
use std::time::Duration;

use crate::{Cancellation, ComparisonRequest, DiffMode};

const DEFAULT_BASE_BRANCH: &str = "main";
const DEFAULT_CONTEXT_LINES: u32 = 3;
const ENV_PREFIX: &str = "GUCK_";

/// Options shared by every comparison an engine runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffConfig {
    /// Base branch used when a request does not name one.
    pub base_branch: String,
    /// Mode used when a request does not name one.
    pub mode: DiffMode,
    /// Unchanged lines of context around each hunk.
    pub context_lines: u32,
    /// Pair deletions with additions of similar content as renames.
    pub detect_renames: bool,
    /// Upper bound on a single comparison.
    pub timeout: Option<Duration>,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            base_branch: DEFAULT_BASE_BRANCH.to_owned(),
            mode: DiffMode::Branch,
            context_lines: DEFAULT_CONTEXT_LINES,
            detect_renames: true,
            timeout: None,
        }
    }
}

impl DiffConfig {
    /// Defaults overlaid with `GUCK_*` environment variables.
    ///
    /// Recognised: `GUCK_BASE_BRANCH`, `GUCK_MODE`, `GUCK_CONTEXT_LINES`,
    /// `GUCK_DETECT_RENAMES` and `GUCK_DIFF_TIMEOUT_SECS`. Values that fail
    /// to parse leave the default in place.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`DiffConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(&format!("{ENV_PREFIX}{name}"))
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        if let Some(base_branch) = var("BASE_BRANCH") {
            config.base_branch = base_branch;
        }
        if let Some(mode) = var("MODE") {
            config.mode = DiffMode::parse_or_default(&mode);
        }
        if let Some(lines) = var("CONTEXT_LINES").and_then(|value| value.parse().ok()) {
            config.context_lines = lines;
        }
        if let Some(detect) = var("DETECT_RENAMES").and_then(|value| parse_flag(&value)) {
            config.detect_renames = detect;
        }
        if let Some(secs) = var("DIFF_TIMEOUT_SECS").and_then(|value| value.parse::<u64>().ok()) {
            config.timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        config
    }

    /// Request for the configured mode and base branch.
    #[must_use]
    pub fn default_request(&self) -> ComparisonRequest {
        ComparisonRequest {
            mode: self.mode,
            base_branch: self.base_branch.clone(),
        }
    }

    /// Fresh cancellation handle honouring the configured timeout.
    #[must_use]
    pub fn cancellation(&self) -> Cancellation {
        self.timeout
            .map_or_else(Cancellation::new, Cancellation::with_timeout)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
