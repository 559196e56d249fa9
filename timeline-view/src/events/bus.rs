use tokio::sync::broadcast;

use crate::events::types::TimelineEvent;

const DEFAULT_CAPACITY: usize = 64;

/// Fan-out of timeline events to any number of subscribers
///
/// Publishing never blocks. A subscriber that falls more than the channel
/// capacity behind observes `RecvError::Lagged` and skips ahead.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<TimelineEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TimelineEvent> {
        self.sender.subscribe()
    }

    /// Deliver to current subscribers; a bus nobody listens to drops the event
    pub fn publish(&self, event: TimelineEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
