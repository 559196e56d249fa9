use serde::Serialize;
use std::fmt;

/// Display color token for a branch, as a CSS hex string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct BranchColor(pub &'static str);

impl BranchColor {
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for BranchColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Reserved for the trunk branches
pub const PRIMARY_COLOR: BranchColor = BranchColor("#2ea043");

pub const PALETTE: [BranchColor; 8] = [
    BranchColor("#58a6ff"),
    BranchColor("#f78166"),
    BranchColor("#d2a8ff"),
    BranchColor("#ffa657"),
    BranchColor("#79c0ff"),
    BranchColor("#ff7b72"),
    BranchColor("#e3b341"),
    BranchColor("#a5d6ff"),
];

/// Color used for commits that belong to no known branch
pub const DEFAULT_COLOR: BranchColor = PALETTE[0];

/// Rolling `code + ((hash << 5) - hash)` over UTF-16 units, 32-bit wrapping
fn rolling_hash(name: &str) -> i32 {
    name.encode_utf16().fold(0i32, |hash, unit| {
        i32::from(unit).wrapping_add(hash.wrapping_shl(5).wrapping_sub(hash))
    })
}

/// Stable color for a branch name
pub fn color_for(branch: &str) -> BranchColor {
    if branch == "main" || branch == "master" {
        return PRIMARY_COLOR;
    }
    let slot = rolling_hash(branch).unsigned_abs() as usize % PALETTE.len();
    PALETTE[slot]
}

/// Color of a commit's primary branch, or the default slot
pub fn color_for_branches(branches: &[String]) -> BranchColor {
    branches
        .first()
        .map(|name| color_for(name))
        .unwrap_or(DEFAULT_COLOR)
}
