pub mod timeline;

pub use timeline::{date_label, layout, TimelineGraph};
