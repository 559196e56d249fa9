use chrono::NaiveDate;
use serde::Serialize;
use timeline_core::Commit;

use crate::decor::BranchColor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    DateLabel,
    Commit,
}

/// Data handed to the renderer alongside the coordinates
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodePayload {
    DateLabel {
        label: String,
        key: NaiveDate,
        #[serde(rename = "commitCount")]
        commit_count: usize,
    },
    Commit {
        commit: Commit,
        color: BranchColor,
    },
}

/// A node placed on the timeline canvas
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionedNode {
    pub id: String,
    pub kind: NodeKind,
    pub x: f64,
    pub y: f64,
    pub draggable: bool,
    pub selectable: bool,
    pub payload: NodePayload,
}

impl PositionedNode {
    pub fn date_label(key: NaiveDate, label: String, commit_count: usize, x: f64, y: f64) -> Self {
        Self {
            id: format!("date-{}", key.format("%Y-%m-%d")),
            kind: NodeKind::DateLabel,
            x,
            y,
            draggable: false,
            selectable: false,
            payload: NodePayload::DateLabel { label, key, commit_count },
        }
    }

    pub fn commit(commit: Commit, color: BranchColor, x: f64, y: f64) -> Self {
        Self {
            id: format!("commit-{}", commit.sha),
            kind: NodeKind::Commit,
            x,
            y,
            draggable: false,
            selectable: true,
            payload: NodePayload::Commit { commit, color },
        }
    }

    pub fn is_date_label(&self) -> bool {
        self.kind == NodeKind::DateLabel
    }

    pub fn as_commit(&self) -> Option<&Commit> {
        match &self.payload {
            NodePayload::Commit { commit, .. } => Some(commit),
            NodePayload::DateLabel { .. } => None,
        }
    }
}
