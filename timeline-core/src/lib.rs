pub mod backend;
pub mod config;
pub mod error;
pub mod model;
pub mod repository;

pub use backend::{CommitHistory, RepositoryStatus};
pub use config::{LayoutConfig, TimelineConfig, REPO_CONFIG_FILE};
pub use error::{ConfigError, FetchError};
pub use model::{
    short_sha, BranchSummary, Commit, CommitPage, Granularity, ParseGranularityError,
    RemoteStatus, WorkingTreeStatus, SHORT_SHA_LEN,
};
pub use repository::{relative_age, GitBackend};
