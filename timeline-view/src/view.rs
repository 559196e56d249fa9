use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use timeline_core::{
    CommitHistory, FetchError, Granularity, LayoutConfig, RepositoryStatus, TimelineConfig,
};
use timeline_graph::{bucket, layout, Bucket, CommitFilter, TimelineGraph};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, trace};

use crate::events::{EventBus, TimelineEvent};
use crate::pagination::{LoadOutcome, PaginationCoordinator};
use crate::poller::{PollerHandle, RepositorySnapshot, RepositoryStatePoller};

/// Cache key: within one generation the loaded sequence only grows by
/// appending, so its length identifies it
type BucketKey = (u64, usize, Granularity);

struct CachedBuckets {
    key: BucketKey,
    buckets: Arc<Vec<Bucket>>,
}

/// A mounted commit timeline: paginated history, bucketing and layout, plus
/// the repository status poller while mounted
pub struct TimelineView<H> {
    coordinator: PaginationCoordinator<H>,
    events: EventBus,
    granularity: Granularity,
    filter: CommitFilter,
    layout: LayoutConfig,
    poll_interval: Duration,
    cache: Mutex<Option<CachedBuckets>>,
    poller: Option<PollerHandle>,
}

impl<H: CommitHistory> TimelineView<H> {
    pub fn new(history: H, config: &TimelineConfig) -> Self {
        let events = EventBus::new();
        Self {
            coordinator: PaginationCoordinator::new(history, config.page_size, events.clone()),
            events,
            granularity: config.granularity,
            filter: CommitFilter::new(),
            layout: config.layout,
            poll_interval: config.poll_interval(),
            cache: Mutex::new(None),
            poller: None,
        }
    }

    pub fn coordinator(&self) -> &PaginationCoordinator<H> {
        &self.coordinator
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TimelineEvent> {
        self.events.subscribe()
    }

    pub async fn load_initial(&self) -> Result<LoadOutcome, FetchError> {
        self.coordinator.load_initial().await
    }

    pub async fn load_more(&self) -> Result<LoadOutcome, FetchError> {
        self.coordinator.load_more().await
    }

    pub async fn reset(&self) -> Result<LoadOutcome, FetchError> {
        self.coordinator.reset().await
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn set_granularity(&mut self, granularity: Granularity) {
        if self.granularity == granularity {
            return;
        }
        debug!(%granularity, "granularity changed");
        self.granularity = granularity;
        self.events.publish(TimelineEvent::GranularityChanged(granularity));
    }

    pub fn filter(&self) -> &CommitFilter {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: CommitFilter) {
        if self.filter == filter {
            return;
        }
        self.filter = filter;
        self.invalidate();
    }

    pub fn layout_config(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Buckets of the loaded (and filtered) commits, rebuilt only when the
    /// sequence, granularity or filter changed
    pub fn buckets(&self) -> Arc<Vec<Bucket>> {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        let (generation, loaded) = self.coordinator.version();
        let key = (generation, loaded, self.granularity);

        if let Some(cached) = cache.as_ref().filter(|cached| cached.key == key) {
            trace!(generation, loaded, "bucket cache hit");
            return cached.buckets.clone();
        }

        let snapshot = self.coordinator.snapshot();
        // may be newer than `key` if a load landed in between
        let built_for = (snapshot.generation, snapshot.commits.len(), self.granularity);
        let commits = if self.filter.is_empty() {
            snapshot.commits
        } else {
            self.filter.apply(&snapshot.commits)
        };
        let buckets = Arc::new(bucket(&commits, self.granularity));
        debug!(
            generation = snapshot.generation,
            commits = commits.len(),
            buckets = buckets.len(),
            "rebuilt buckets"
        );

        *cache = Some(CachedBuckets {
            key: built_for,
            buckets: buckets.clone(),
        });
        buckets
    }

    /// Positioned nodes for the current state
    pub fn graph(&self) -> TimelineGraph {
        layout(&self.buckets(), self.granularity, &self.layout)
    }

    /// Start polling repository status; replaces any running poller
    pub fn mount<S>(&mut self, status: S) -> watch::Receiver<RepositorySnapshot>
    where
        S: RepositoryStatus + 'static,
    {
        let handle = RepositoryStatePoller::new(status)
            .with_interval(self.poll_interval)
            .start();
        let receiver = handle.subscribe();
        if self.poller.replace(handle).is_some() {
            info!("replaced running repository poller");
        }
        receiver
    }

    /// Stop the poller and wait for it to exit
    pub async fn unmount(&mut self) {
        if let Some(handle) = self.poller.take() {
            handle.stop().await;
            info!("timeline unmounted");
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.poller.is_some()
    }

    pub fn repository_snapshot(&self) -> Option<RepositorySnapshot> {
        self.poller.as_ref().map(PollerHandle::snapshot)
    }

    fn invalidate(&self) {
        *self.cache.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
