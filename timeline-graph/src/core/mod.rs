pub mod bucket;
pub mod edge;
pub mod node;

pub use bucket::{bucket, bucket_key, utc_date, week_start, Bucket};
pub use edge::Edge;
pub use node::{NodeKind, NodePayload, PositionedNode};
