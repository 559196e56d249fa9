//! Pure derivations for the commit timeline: date bucketing, branch colors,
//! commit filtering and the positioned column layout.

pub mod core;
pub mod decor;
pub mod layout;
pub mod query;
pub mod render;

pub use self::core::{bucket, bucket_key, Bucket, Edge, NodeKind, NodePayload, PositionedNode};
pub use decor::{color_for, BranchColor, PRIMARY_COLOR};
pub use layout::{date_label, layout, TimelineGraph};
pub use query::CommitFilter;
pub use render::TextRenderer;
