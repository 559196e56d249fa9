pub mod filter;

pub use filter::{CommitFilter, FilterMode};
