#![allow(dead_code)]

pub use dagboard_test_utils::{builders, init_tracing, scenarios, with_timeout};

use dagboard::dag::Node;

/// `(node, depends_on)` pair as owned strings.
pub fn edge(node: &str, depends_on: &str) -> (String, String) {
    (node.to_string(), depends_on.to_string())
}

pub fn no_nodes() -> Vec<Node> {
    Vec::new()
}
