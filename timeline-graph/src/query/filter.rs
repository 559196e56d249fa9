use timeline_core::Commit;

/// A single case-insensitive substring criterion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterMode {
    Author(String),
    Message(String),
}

impl FilterMode {
    fn matches(&self, commit: &Commit) -> bool {
        match self {
            FilterMode::Author(needle) => commit.author.to_lowercase().contains(needle),
            FilterMode::Message(needle) => commit.message.to_lowercase().contains(needle),
        }
    }
}

/// Narrows the loaded sequence before bucketing; all criteria must match
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitFilter {
    modes: Vec<FilterMode>,
}

impl CommitFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn author(mut self, pattern: &str) -> Self {
        self.modes.push(FilterMode::Author(pattern.to_lowercase()));
        self
    }

    pub fn message(mut self, pattern: &str) -> Self {
        self.modes.push(FilterMode::Message(pattern.to_lowercase()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }

    pub fn matches(&self, commit: &Commit) -> bool {
        self.modes.iter().all(|mode| mode.matches(commit))
    }

    /// Matching commits in their original order
    pub fn apply(&self, commits: &[Commit]) -> Vec<Commit> {
        commits.iter().filter(|c| self.matches(c)).cloned().collect()
    }
}
