use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};
use timeline_core::{Commit, CommitHistory, CommitPage, FetchError};
use tracing::{debug, info, warn};

use crate::events::{EventBus, TimelineEvent};

/// What a load call did with the collaborator's response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Merged; `added` counts commits that were not already loaded
    Loaded { added: usize },
    /// Nothing left to load, or another load is in flight
    Skipped,
    /// The generation moved on while the fetch was in flight
    Stale,
}

/// Point-in-time copy of the pagination state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaginationSnapshot {
    pub commits: Vec<Commit>,
    pub total: usize,
    pub has_more: bool,
    pub is_loading: bool,
    pub generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Merge {
    Replace,
    Append,
}

#[derive(Debug, Default)]
struct PaginationState {
    loaded: Vec<Commit>,
    seen: HashSet<String>,
    total: usize,
    has_more: bool,
    is_loading: bool,
    generation: u64,
}

impl PaginationState {
    fn clear(&mut self) {
        self.loaded.clear();
        self.seen.clear();
        self.total = 0;
        self.has_more = false;
        self.is_loading = false;
    }

    fn merge(&mut self, page: CommitPage, mode: Merge) -> usize {
        if mode == Merge::Replace {
            self.loaded.clear();
            self.seen.clear();
        }

        let before = self.loaded.len();
        let received = page.commits.len();
        for commit in page.commits {
            if self.seen.insert(commit.sha.clone()) {
                self.loaded.push(commit);
            }
        }
        let added = self.loaded.len() - before;
        if added < received {
            debug!(dropped = received - added, "dropped commits already loaded");
        }

        // loaded.len() <= total and has_more == (loaded.len() < total)
        self.total = page.total.max(self.loaded.len());
        self.has_more = self.loaded.len() < self.total;
        if page.has_more != self.has_more {
            debug!(
                reported = page.has_more,
                derived = self.has_more,
                "collaborator has_more disagrees with counts"
            );
        }

        added
    }

    fn commits_changed(&self) -> TimelineEvent {
        TimelineEvent::CommitsChanged {
            loaded: self.loaded.len(),
            total: self.total,
            has_more: self.has_more,
            generation: self.generation,
        }
    }
}

/// Clears the loading flag if a fetch future is dropped before it completes
struct InFlight<'a> {
    state: &'a Mutex<PaginationState>,
    generation: u64,
    armed: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.generation == self.generation {
            state.is_loading = false;
        }
    }
}

/// Incrementally loads commit history and merges it into one deduplicated
/// sequence
///
/// At most one fetch is in flight per generation: a `load_more` issued while
/// another load is running is dropped rather than queued. `reset` and
/// `load_initial` start a new generation, and any response belonging to an
/// older one is discarded without touching the current state.
pub struct PaginationCoordinator<H> {
    history: H,
    page_size: usize,
    state: Mutex<PaginationState>,
    events: EventBus,
}

impl<H: CommitHistory> PaginationCoordinator<H> {
    pub fn new(history: H, page_size: usize, events: EventBus) -> Self {
        Self {
            history,
            page_size: page_size.max(1),
            state: Mutex::new(PaginationState::default()),
            events,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Fetch the first page, replacing whatever is loaded
    pub async fn load_initial(&self) -> Result<LoadOutcome, FetchError> {
        let generation = {
            let mut state = self.lock();
            state.generation += 1;
            state.is_loading = true;
            state.generation
        };
        debug!(generation, "loading first page");
        self.fetch_and_merge(generation, 0, Merge::Replace).await
    }

    /// Fetch the page following the loaded commits
    pub async fn load_more(&self) -> Result<LoadOutcome, FetchError> {
        let (generation, offset) = {
            let mut state = self.lock();
            if !state.has_more || state.is_loading {
                debug!(
                    has_more = state.has_more,
                    is_loading = state.is_loading,
                    "skipping load_more"
                );
                return Ok(LoadOutcome::Skipped);
            }
            state.is_loading = true;
            (state.generation, state.loaded.len())
        };
        debug!(generation, offset, "loading next page");
        self.fetch_and_merge(generation, offset, Merge::Append).await
    }

    /// Drop all loaded state and reload from the first page
    pub async fn reset(&self) -> Result<LoadOutcome, FetchError> {
        let generation = {
            let mut state = self.lock();
            state.generation += 1;
            state.clear();
            state.generation
        };
        info!(generation, "timeline reset");
        self.events.publish(TimelineEvent::Reset { generation });
        self.load_initial().await
    }

    pub fn snapshot(&self) -> PaginationSnapshot {
        let state = self.lock();
        PaginationSnapshot {
            commits: state.loaded.clone(),
            total: state.total,
            has_more: state.has_more,
            is_loading: state.is_loading,
            generation: state.generation,
        }
    }

    pub fn loaded(&self) -> usize {
        self.lock().loaded.len()
    }

    pub fn total(&self) -> usize {
        self.lock().total
    }

    pub fn has_more(&self) -> bool {
        self.lock().has_more
    }

    pub fn is_loading(&self) -> bool {
        self.lock().is_loading
    }

    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// `(generation, loaded count)`; changes whenever the sequence does
    pub(crate) fn version(&self) -> (u64, usize) {
        let state = self.lock();
        (state.generation, state.loaded.len())
    }

    fn lock(&self) -> MutexGuard<'_, PaginationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn fetch_and_merge(
        &self,
        generation: u64,
        offset: usize,
        mode: Merge,
    ) -> Result<LoadOutcome, FetchError> {
        let mut in_flight = InFlight {
            state: &self.state,
            generation,
            armed: true,
        };
        let result = self.history.fetch_commit_tree(self.page_size, offset).await;
        in_flight.armed = false;

        let event = {
            let mut state = self.lock();
            if state.generation != generation {
                debug!(
                    generation,
                    current = state.generation,
                    "discarding stale page"
                );
                return Ok(LoadOutcome::Stale);
            }
            state.is_loading = false;

            match result {
                Ok(page) => {
                    let added = state.merge(page, mode);
                    debug!(
                        generation,
                        added,
                        loaded = state.loaded.len(),
                        total = state.total,
                        "merged page"
                    );
                    Ok((added, state.commits_changed()))
                }
                Err(err) => Err(err),
            }
        };

        match event {
            Ok((added, event)) => {
                self.events.publish(event);
                Ok(LoadOutcome::Loaded { added })
            }
            Err(err) => {
                warn!(offset, error = %err, "failed to load commits");
                self.events.publish(TimelineEvent::LoadFailed {
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }
}
