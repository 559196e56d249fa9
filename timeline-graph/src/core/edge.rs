use serde::Serialize;

/// Connection between two nodes. The date timeline is purely positional, so
/// layouts never emit these; the type exists for the renderer's graph shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
}

