use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Length of the abbreviated commit id shown on timeline nodes
pub const SHORT_SHA_LEN: usize = 7;

/// A resolved commit record as delivered by the history backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commit {
    pub sha: String,
    pub short_sha: String,
    pub message: String,
    pub author: String,
    pub timestamp_ms: i64,
    /// Branches containing this commit, current branch first
    pub branches: Vec<String>,
    pub is_head: bool,
    pub has_stash: bool,
    pub has_notes: bool,
}

impl Commit {
    /// Create a commit with no branch membership or decorations
    pub fn new(
        sha: impl Into<String>,
        message: impl Into<String>,
        author: impl Into<String>,
        timestamp_ms: i64,
    ) -> Self {
        let sha = sha.into();
        Self {
            short_sha: short_sha(&sha),
            sha,
            message: message.into(),
            author: author.into(),
            timestamp_ms,
            branches: Vec::new(),
            is_head: false,
            has_stash: false,
            has_notes: false,
        }
    }

    pub fn with_branches<I, S>(mut self, branches: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.branches = branches.into_iter().map(Into::into).collect();
        self
    }

    /// First line of the commit message
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    /// Branch used to pick the node color
    pub fn primary_branch(&self) -> Option<&str> {
        self.branches.first().map(String::as_str)
    }
}

/// Abbreviate a full hash, tolerating ids shorter than the prefix
pub fn short_sha(sha: &str) -> String {
    sha.chars().take(SHORT_SHA_LEN).collect()
}

/// One page of commit history
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitPage {
    pub commits: Vec<Commit>,
    pub total: usize,
    pub has_more: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingTreeStatus {
    pub staged: usize,
    pub modified: usize,
    pub untracked: usize,
}

impl WorkingTreeStatus {
    pub fn is_clean(&self) -> bool {
        self.staged == 0 && self.modified == 0 && self.untracked == 0
    }
}

/// Sync state of the current branch against its upstream
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteStatus {
    pub has_remote: bool,
    pub current_branch: Option<String>,
    pub remote_branch: Option<String>,
    pub remote_name: Option<String>,
    pub ahead: usize,
    pub behind: usize,
    pub synced: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchSummary {
    pub name: String,
    pub sha: String,
    pub age: String,
    pub message: String,
    pub is_current: bool,
}

/// Bucketing unit for the timeline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Day,
    Week,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Day => "day",
            Granularity::Week => "week",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown granularity '{0}', expected 'day' or 'week'")]
pub struct ParseGranularityError(pub String);

impl FromStr for Granularity {
    type Err = ParseGranularityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" | "daily" => Ok(Granularity::Day),
            "week" | "weekly" => Ok(Granularity::Week),
            _ => Err(ParseGranularityError(s.to_string())),
        }
    }
}
