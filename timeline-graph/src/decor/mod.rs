pub mod color;

pub use color::{color_for, color_for_branches, BranchColor, DEFAULT_COLOR, PALETTE, PRIMARY_COLOR};
