use async_trait::async_trait;
use std::sync::Arc;

use crate::error::FetchError;
use crate::model::{BranchSummary, CommitPage, RemoteStatus, WorkingTreeStatus};

/// Paginated commit history source
#[async_trait]
pub trait CommitHistory: Send + Sync {
    /// Fetch `limit` commits starting at `offset` in display order
    async fn fetch_commit_tree(&self, limit: usize, offset: usize) -> Result<CommitPage, FetchError>;

    /// List local branches
    async fn fetch_branches(&self) -> Result<Vec<BranchSummary>, FetchError>;
}

/// Auxiliary repository state refreshed by the poller
#[async_trait]
pub trait RepositoryStatus: Send + Sync {
    async fn fetch_working_tree_status(&self) -> Result<WorkingTreeStatus, FetchError>;

    async fn fetch_remote_status(&self) -> Result<RemoteStatus, FetchError>;
}

#[async_trait]
impl<T: CommitHistory + ?Sized> CommitHistory for Arc<T> {
    async fn fetch_commit_tree(&self, limit: usize, offset: usize) -> Result<CommitPage, FetchError> {
        (**self).fetch_commit_tree(limit, offset).await
    }

    async fn fetch_branches(&self) -> Result<Vec<BranchSummary>, FetchError> {
        (**self).fetch_branches().await
    }
}

#[async_trait]
impl<T: RepositoryStatus + ?Sized> RepositoryStatus for Arc<T> {
    async fn fetch_working_tree_status(&self) -> Result<WorkingTreeStatus, FetchError> {
        (**self).fetch_working_tree_status().await
    }

    async fn fetch_remote_status(&self) -> Result<RemoteStatus, FetchError> {
        (**self).fetch_remote_status().await
    }
}
