use chrono::NaiveDate;
use serde::Serialize;
use timeline_core::{Granularity, LayoutConfig};
use tracing::trace;

use crate::core::{Bucket, Edge, PositionedNode};
use crate::decor::color_for_branches;

/// Positioned nodes and edges ready for a renderer
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimelineGraph {
    pub nodes: Vec<PositionedNode>,
    /// Always empty for the date timeline
    pub edges: Vec<Edge>,
}

impl TimelineGraph {
    pub fn commit_count(&self) -> usize {
        self.nodes.iter().filter(|n| !n.is_date_label()).count()
    }

    pub fn column_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_date_label()).count()
    }

    pub fn node(&self, id: &str) -> Option<&PositionedNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// "Mar 4" for days, "Week of Mar 3" for weeks
pub fn date_label(key: NaiveDate, granularity: Granularity) -> String {
    let day = key.format("%b %-d");
    match granularity {
        Granularity::Day => day.to_string(),
        Granularity::Week => format!("Week of {}", day),
    }
}

/// Lay buckets out as columns: label on the baseline, commits stacked above
pub fn layout(buckets: &[Bucket], granularity: Granularity, config: &LayoutConfig) -> TimelineGraph {
    let commit_total: usize = buckets.iter().map(Bucket::len).sum();
    let mut nodes = Vec::with_capacity(buckets.len() + commit_total);

    for (column, bucket) in buckets.iter().enumerate() {
        let x = config.origin_x + column as f64 * config.column_spacing;

        nodes.push(PositionedNode::date_label(
            bucket.key,
            date_label(bucket.key, granularity),
            bucket.len(),
            x,
            config.baseline_y,
        ));

        for (row, commit) in bucket.commits.iter().enumerate() {
            let y = config.baseline_y - (row + 1) as f64 * config.row_spacing;
            let color = color_for_branches(&commit.branches);
            nodes.push(PositionedNode::commit(commit.clone(), color, x, y));
        }
    }

    trace!(columns = buckets.len(), commits = commit_total, "laid out timeline");

    TimelineGraph {
        nodes,
        edges: Vec::new(),
    }
}
