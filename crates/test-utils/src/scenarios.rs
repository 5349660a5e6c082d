//! Canned workflow shapes used across the integration tests.

use crate::builders::GraphBuilder;

/// A -> B -> C.
pub fn linear_chain() -> GraphBuilder {
    GraphBuilder::new().edge("B", "A").edge("C", "B")
}

/// A fans out to B and C, which join again in D.
pub fn diamond() -> GraphBuilder {
    GraphBuilder::new()
        .edge("B", "A")
        .edge("C", "A")
        .edge("D", "B")
        .edge("D", "C")
}

/// A -> B -> C plus the direct A -> C edge.
pub fn skip_edge() -> GraphBuilder {
    GraphBuilder::new()
        .node("A")
        .node("B")
        .node("C")
        .edge("C", "A")
        .edge("B", "A")
        .edge("C", "B")
}

/// Two unrelated chains: X -> Y and P -> Q -> R.
pub fn disconnected() -> GraphBuilder {
    GraphBuilder::new()
        .edge("Y", "X")
        .edge("Q", "P")
        .edge("R", "Q")
}
