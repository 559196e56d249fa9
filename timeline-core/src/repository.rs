use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use git2::{BranchType, ErrorCode, Oid, Repository, Sort, StatusOptions};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::backend::{CommitHistory, RepositoryStatus};
use crate::error::FetchError;
use crate::model::{
    short_sha, BranchSummary, Commit, CommitPage, RemoteStatus, WorkingTreeStatus,
};

/// git2-backed collaborator. The repository is reopened for every request so
/// the backend can be shared across tasks.
#[derive(Debug, Clone)]
pub struct GitBackend {
    path: PathBuf,
}

impl GitBackend {
    /// Open a repository, failing early if the path is not one
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FetchError> {
        let path = path.as_ref().to_path_buf();
        open_repo(&path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn with_repo<T, F>(&self, op: F) -> Result<T, FetchError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Repository) -> Result<T, FetchError> + Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let mut repo = open_repo(&path)?;
            op(&mut repo)
        })
        .await?
    }
}

#[async_trait]
impl CommitHistory for GitBackend {
    async fn fetch_commit_tree(&self, limit: usize, offset: usize) -> Result<CommitPage, FetchError> {
        self.with_repo(move |repo| commit_page(repo, limit, offset)).await
    }

    async fn fetch_branches(&self) -> Result<Vec<BranchSummary>, FetchError> {
        self.with_repo(|repo| list_branches(repo, Utc::now())).await
    }
}

#[async_trait]
impl RepositoryStatus for GitBackend {
    async fn fetch_working_tree_status(&self) -> Result<WorkingTreeStatus, FetchError> {
        self.with_repo(|repo| working_tree_status(repo)).await
    }

    async fn fetch_remote_status(&self) -> Result<RemoteStatus, FetchError> {
        self.with_repo(|repo| remote_status(repo)).await
    }
}

fn open_repo(path: &Path) -> Result<Repository, FetchError> {
    Repository::open(path).map_err(|err| FetchError::Repository {
        path: path.to_path_buf(),
        message: err.message().to_string(),
    })
}

/// HEAD target, or None for an unborn branch
fn head_oid(repo: &Repository) -> Result<Option<Oid>, FetchError> {
    match repo.head() {
        Ok(head) => Ok(head.target()),
        Err(err) if matches!(err.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn current_branch_name(repo: &Repository) -> Option<String> {
    let head = repo.head().ok()?;
    if !head.is_branch() {
        return None;
    }
    head.shorthand().map(str::to_string)
}

/// Local branch tips, current branch first, the rest by name
fn local_branch_tips(repo: &Repository) -> Result<Vec<(String, Oid)>, FetchError> {
    let current = current_branch_name(repo);
    let mut tips = Vec::new();

    for branch in repo.branches(Some(BranchType::Local))? {
        let (branch, _) = branch?;
        let Some(name) = branch.name()? else { continue };
        if let Some(target) = branch.get().target() {
            tips.push((name.to_string(), target));
        }
    }

    tips.sort_by(|(a, _), (b, _)| {
        let a_current = current.as_deref() == Some(a.as_str());
        let b_current = current.as_deref() == Some(b.as_str());
        b_current.cmp(&a_current).then_with(|| a.cmp(b))
    });

    Ok(tips)
}

/// Base commits of every stash entry
fn stash_bases(repo: &mut Repository) -> Result<HashSet<Oid>, FetchError> {
    let mut stash_oids = Vec::new();
    match repo.stash_foreach(|_, _, oid| {
        stash_oids.push(*oid);
        true
    }) {
        Ok(()) => {}
        Err(err) if err.code() == ErrorCode::NotFound => return Ok(HashSet::new()),
        Err(err) => return Err(err.into()),
    }

    let mut bases = HashSet::new();
    for oid in stash_oids {
        let stash = repo.find_commit(oid)?;
        if let Ok(base) = stash.parent_id(0) {
            bases.insert(base);
        }
    }
    Ok(bases)
}

fn timestamp_ms(seconds: i64) -> i64 {
    seconds.saturating_mul(1000)
}

/// Resolve one page of history in topological + time order
pub fn commit_page(repo: &mut Repository, limit: usize, offset: usize) -> Result<CommitPage, FetchError> {
    let head = head_oid(repo)?;
    let tips = local_branch_tips(repo)?;

    if head.is_none() && tips.is_empty() {
        return Ok(CommitPage::default());
    }

    let mut revwalk = repo.revwalk()?;
    revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
    if let Some(head) = head {
        revwalk.push(head)?;
    }
    for (_, tip) in &tips {
        revwalk.push(*tip)?;
    }

    let oids = revwalk.collect::<Result<Vec<Oid>, git2::Error>>()?;
    let total = oids.len();
    let page_oids: Vec<Oid> = oids.into_iter().skip(offset).take(limit).collect();

    let stash_bases = stash_bases(repo)?;

    let mut commits = Vec::with_capacity(page_oids.len());
    for oid in page_oids {
        let commit = repo.find_commit(oid)?;

        let mut branches = Vec::new();
        for (name, tip) in &tips {
            if *tip == oid || repo.graph_descendant_of(*tip, oid)? {
                branches.push(name.clone());
            }
        }

        let sha = oid.to_string();
        commits.push(Commit {
            short_sha: short_sha(&sha),
            sha,
            message: commit.message().unwrap_or("").trim_end().to_string(),
            author: commit.author().name().unwrap_or("Unknown").to_string(),
            timestamp_ms: timestamp_ms(commit.time().seconds()),
            branches,
            is_head: head == Some(oid),
            has_stash: stash_bases.contains(&oid),
            has_notes: repo.find_note(None, oid).is_ok(),
        });
    }

    let has_more = offset.saturating_add(commits.len()) < total;
    debug!(offset, limit, returned = commits.len(), total, "resolved commit page");

    Ok(CommitPage { commits, total, has_more })
}

/// Count staged, modified and untracked entries
pub fn working_tree_status(repo: &Repository) -> Result<WorkingTreeStatus, FetchError> {
    let mut options = StatusOptions::new();
    options.include_untracked(true);
    options.include_ignored(false);

    let statuses = repo.statuses(Some(&mut options))?;
    let mut result = WorkingTreeStatus::default();

    for entry in statuses.iter() {
        let status = entry.status();

        if status.is_index_new()
            || status.is_index_modified()
            || status.is_index_deleted()
            || status.is_index_renamed()
            || status.is_index_typechange()
        {
            result.staged += 1;
        }

        if status.is_wt_modified()
            || status.is_wt_deleted()
            || status.is_wt_renamed()
            || status.is_wt_typechange()
        {
            result.modified += 1;
        }

        if status.is_wt_new() {
            result.untracked += 1;
        }
    }

    Ok(result)
}

/// Ahead/behind of the current branch against its upstream
pub fn remote_status(repo: &Repository) -> Result<RemoteStatus, FetchError> {
    let has_remote = !repo.remotes()?.is_empty();
    let mut status = RemoteStatus {
        has_remote,
        current_branch: current_branch_name(repo),
        ..RemoteStatus::default()
    };

    let Some(branch_name) = status.current_branch.clone() else {
        return Ok(status);
    };

    let branch = repo.find_branch(&branch_name, BranchType::Local)?;
    let upstream = match branch.upstream() {
        Ok(upstream) => upstream,
        Err(_) => return Ok(status),
    };

    status.remote_branch = upstream.name()?.map(str::to_string);

    if let Some(refname) = branch.get().name() {
        if let Ok(remote) = repo.branch_upstream_remote(refname) {
            status.remote_name = remote.as_str().map(str::to_string);
        }
    }

    if let (Some(local), Some(remote)) = (branch.get().target(), upstream.get().target()) {
        let (ahead, behind) = repo.graph_ahead_behind(local, remote)?;
        status.ahead = ahead;
        status.behind = behind;
        status.synced = ahead == 0 && behind == 0;
    }

    Ok(status)
}

/// Local branches with their tip summary, current branch first
pub fn list_branches(repo: &Repository, now: DateTime<Utc>) -> Result<Vec<BranchSummary>, FetchError> {
    let current = current_branch_name(repo);
    let mut branches = Vec::new();

    for (name, tip) in local_branch_tips(repo)? {
        let commit = repo.find_commit(tip)?;
        let committed = Utc
            .timestamp_opt(commit.time().seconds(), 0)
            .single()
            .unwrap_or(now);

        branches.push(BranchSummary {
            is_current: current.as_deref() == Some(name.as_str()),
            sha: short_sha(&tip.to_string()),
            age: relative_age(now, committed),
            message: commit.summary().unwrap_or("").to_string(),
            name,
        });
    }

    Ok(branches)
}

/// Human readable distance between two instants, e.g. "3 days ago"
pub fn relative_age(now: DateTime<Utc>, then: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds().max(0);

    let (count, unit) = match seconds {
        s if s < 60 => return "just now".to_string(),
        s if s < 3_600 => (s / 60, "minute"),
        s if s < 86_400 => (s / 3_600, "hour"),
        s if s < 14 * 86_400 => (s / 86_400, "day"),
        s if s < 70 * 86_400 => (s / (7 * 86_400), "week"),
        s if s < 365 * 86_400 => (s / (30 * 86_400), "month"),
        s => (s / (365 * 86_400), "year"),
    };

    if count == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", count, unit)
    }
}
