use std::time::Duration;
use timeline_core::{RemoteStatus, RepositoryStatus, WorkingTreeStatus};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Latest repository state seen by the poller
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositorySnapshot {
    /// Last successful working tree fetch
    pub working_tree: Option<WorkingTreeStatus>,
    /// Last successful remote fetch
    pub remote: Option<RemoteStatus>,
    /// Failure from the most recent tick, if any
    pub last_error: Option<String>,
    /// Completed ticks
    pub ticks: u64,
}

/// Periodically refreshes working tree and remote status
pub struct RepositoryStatePoller<S> {
    status: S,
    interval: Duration,
}

impl<S: RepositoryStatus + 'static> RepositoryStatePoller<S> {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);

    pub fn new(status: S) -> Self {
        Self {
            status,
            interval: Self::DEFAULT_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Spawn the polling task; the first tick fires immediately
    pub fn start(self) -> PollerHandle {
        let (snapshot_tx, snapshot_rx) = watch::channel(RepositorySnapshot::default());
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        info!(interval_ms = self.interval.as_millis() as u64, "starting repository poller");
        let task = tokio::spawn(run(self.status, self.interval, snapshot_tx, shutdown_rx));

        PollerHandle {
            shutdown: Some(shutdown_tx),
            task: Some(task),
            snapshot: snapshot_rx,
        }
    }
}

async fn run<S: RepositoryStatus>(
    status: S,
    period: Duration,
    snapshot: watch::Sender<RepositorySnapshot>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {}
        }
        tokio::select! {
            _ = &mut shutdown => break,
            _ = refresh(&status, &snapshot) => {}
        }
    }

    debug!("repository poller stopped");
}

async fn refresh<S: RepositoryStatus>(status: &S, snapshot: &watch::Sender<RepositorySnapshot>) {
    let (working_tree, remote) = tokio::join!(
        status.fetch_working_tree_status(),
        status.fetch_remote_status()
    );

    snapshot.send_modify(|current| {
        current.ticks += 1;
        current.last_error = None;

        match working_tree {
            Ok(value) => current.working_tree = Some(value),
            Err(err) => {
                warn!(error = %err, "working tree refresh failed");
                current.last_error = Some(err.to_string());
            }
        }
        match remote {
            Ok(value) => current.remote = Some(value),
            Err(err) => {
                warn!(error = %err, "remote status refresh failed");
                current.last_error = Some(err.to_string());
            }
        }

        debug!(tick = current.ticks, "repository state refreshed");
    });
}

/// Owner of a running poller; dropping it aborts the task
#[derive(Debug)]
pub struct PollerHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
    snapshot: watch::Receiver<RepositorySnapshot>,
}

impl PollerHandle {
    pub fn subscribe(&self) -> watch::Receiver<RepositorySnapshot> {
        self.snapshot.clone()
    }

    pub fn snapshot(&self) -> RepositorySnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Signal the task and wait for it to exit
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                warn!(error = %err, "repository poller task failed");
            }
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::CountingStatus;
    use std::sync::Arc;

    fn poller(status: &Arc<CountingStatus>) -> RepositoryStatePoller<Arc<CountingStatus>> {
        RepositoryStatePoller::new(status.clone()).with_interval(Duration::from_secs(10))
    }

    #[tokio::test(start_paused = true)]
    async fn test_refreshes_every_interval() {
        let status = Arc::new(CountingStatus::new());
        let handle = poller(&status).start();
        let mut rx = handle.subscribe();

        rx.changed().await.unwrap();
        {
            let snapshot = rx.borrow_and_update();
            assert_eq!(snapshot.ticks, 1);
            assert_eq!(snapshot.working_tree.map(|w| w.modified), Some(1));
            assert_eq!(snapshot.remote.as_ref().map(|r| r.ahead), Some(1));
        }

        let before = tokio::time::Instant::now();
        rx.changed().await.unwrap();
        assert!(before.elapsed() >= Duration::from_secs(10));
        assert_eq!(rx.borrow().ticks, 2);
        assert_eq!(handle.snapshot().remote.map(|r| r.ahead), Some(2));

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_keeps_previous_value() {
        let status = Arc::new(CountingStatus::failing_after(1));
        let handle = poller(&status).start();
        let mut rx = handle.subscribe();

        rx.changed().await.unwrap();
        let _ = rx.borrow_and_update();
        rx.changed().await.unwrap();

        let snapshot = handle.snapshot();
        assert_eq!(snapshot.ticks, 2);
        assert_eq!(snapshot.working_tree.map(|w| w.modified), Some(1));
        assert_eq!(snapshot.remote.map(|r| r.ahead), Some(2));
        assert_eq!(snapshot.last_error.as_deref(), Some("backend error: index locked"));

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_halts_polling() {
        let status = Arc::new(CountingStatus::new());
        let handle = poller(&status).start();
        let mut rx = handle.subscribe();
        rx.changed().await.unwrap();
        assert!(handle.is_running());

        handle.stop().await;
        let calls = status.working_calls();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(status.working_calls(), calls);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_aborts_task() {
        let status = Arc::new(CountingStatus::new());
        let handle = poller(&status).start();
        let mut rx = handle.subscribe();
        rx.changed().await.unwrap();

        drop(handle);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(status.working_calls(), 1);
        assert!(rx.changed().await.is_err());
    }
}
