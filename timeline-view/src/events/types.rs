use timeline_core::Granularity;

/// Notifications published by the timeline as its state moves
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimelineEvent {
    /// A page was merged into the loaded sequence
    CommitsChanged {
        loaded: usize,
        total: usize,
        has_more: bool,
        generation: u64,
    },
    /// A fetch failed; prior state is intact
    LoadFailed { message: String },
    /// Pagination state was cleared and a new generation started
    Reset { generation: u64 },
    GranularityChanged(Granularity),
}
