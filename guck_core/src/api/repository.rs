use serde::{Deserialize, Serialize};

/// Basic information about the repository a diff was computed for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    /// Absolute path to the repository working tree.
    pub root: String,
    /// Short name of the checked-out branch, or `"HEAD"` when detached.
    pub branch: String,
    /// Full object id of HEAD; absent before the first commit.
    #[serde(default)]
    pub commit: Option<String>,
    /// Fetch URL of the `origin` remote when configured.
    #[serde(default)]
    pub remote_url: Option<String>,
    /// Best-effort guess of the repository's default branch.
    pub default_branch: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_info_defaults() {
        let json = r#"{
            "root": "/tmp/guck",
            "branch": "main",
            "default_branch": "main"
        }"#;
        let info: RepositoryInfo = serde_json::from_str(json).expect("deserialize info");
        assert_eq!(info.root, "/tmp/guck");
        assert!(info.commit.is_none());
        assert!(info.remote_url.is_none());
    }
}
