//! Scripted collaborators for the coordinator, poller and view tests

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use timeline_core::{
    BranchSummary, Commit, CommitHistory, CommitPage, FetchError, RemoteStatus, RepositoryStatus,
    WorkingTreeStatus,
};
use tokio::sync::Notify;

/// Commits `<prefix><from>..=<prefix><to>`, an hour apart counting back from 2024-03-04 UTC
pub fn commits(prefix: &str, from: usize, to: usize) -> Vec<Commit> {
    const BASE_MS: i64 = 1_709_510_400_000;
    (from..=to)
        .map(|i| {
            Commit::new(
                format!("{}{}", prefix, i),
                format!("commit {}", i),
                "Alice",
                BASE_MS - i as i64 * 3_600_000,
            )
        })
        .collect()
}

pub fn page(commits: Vec<Commit>, total: usize) -> CommitPage {
    let has_more = commits.len() < total;
    CommitPage { commits, total, has_more }
}

struct Scripted {
    response: Result<CommitPage, FetchError>,
    gate: Option<Arc<Notify>>,
}

/// Answers page requests from a queue, in call order
///
/// A gated response is claimed when the call starts but only returned once
/// its gate is notified.
#[derive(Default)]
pub struct ScriptedHistory {
    script: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<(usize, usize)>>,
}

impl ScriptedHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, response: CommitPage) -> &Self {
        self.enqueue(Ok(response), None);
        self
    }

    pub fn push_error(&self, message: &str) -> &Self {
        self.enqueue(Err(FetchError::backend(message)), None);
        self
    }

    pub fn push_gated(&self, response: CommitPage) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.enqueue(Ok(response), Some(gate.clone()));
        gate
    }

    /// `(limit, offset)` of every fetch so far
    pub fn calls(&self) -> Vec<(usize, usize)> {
        self.calls.lock().unwrap().clone()
    }

    fn enqueue(&self, response: Result<CommitPage, FetchError>, gate: Option<Arc<Notify>>) {
        self.script.lock().unwrap().push_back(Scripted { response, gate });
    }
}

#[async_trait]
impl CommitHistory for ScriptedHistory {
    async fn fetch_commit_tree(&self, limit: usize, offset: usize) -> Result<CommitPage, FetchError> {
        self.calls.lock().unwrap().push((limit, offset));
        let next = self.script.lock().unwrap().pop_front();
        let Some(Scripted { response, gate }) = next else {
            return Err(FetchError::backend("no page scripted"));
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
        response
    }

    async fn fetch_branches(&self) -> Result<Vec<BranchSummary>, FetchError> {
        Ok(Vec::new())
    }
}

/// Status source that counts calls; the working tree fetch starts failing
/// after `fail_after` successes
pub struct CountingStatus {
    pub working_calls: AtomicUsize,
    pub remote_calls: AtomicUsize,
    fail_after: usize,
}

impl CountingStatus {
    pub fn new() -> Self {
        Self::failing_after(usize::MAX)
    }

    pub fn failing_after(fail_after: usize) -> Self {
        Self {
            working_calls: AtomicUsize::new(0),
            remote_calls: AtomicUsize::new(0),
            fail_after,
        }
    }

    pub fn working_calls(&self) -> usize {
        self.working_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RepositoryStatus for CountingStatus {
    async fn fetch_working_tree_status(&self) -> Result<WorkingTreeStatus, FetchError> {
        let call = self.working_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call > self.fail_after {
            return Err(FetchError::backend("index locked"));
        }
        Ok(WorkingTreeStatus {
            staged: 0,
            modified: call,
            untracked: 0,
        })
    }

    async fn fetch_remote_status(&self) -> Result<RemoteStatus, FetchError> {
        let call = self.remote_calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(RemoteStatus {
            has_remote: true,
            current_branch: Some("main".to_string()),
            remote_branch: Some("origin/main".to_string()),
            remote_name: Some("origin".to_string()),
            ahead: call,
            behind: 0,
            synced: false,
        })
    }
}
