#![allow(dead_code)]

use std::collections::BTreeMap;

use dagboard::config::{ConfigFile, NodeConfig, RawConfigFile};
use dagboard::dag::Graph;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn with_node(mut self, name: &str, node: NodeConfig) -> Self {
        self.config.node.insert(name.to_string(), node);
        self
    }

    pub fn with_max_events(mut self, max_events: usize) -> Self {
        self.config.store.max_events = max_events;
        self
    }

    pub fn landscape(mut self) -> Self {
        self.config.layout.landscape = true;
        self
    }

    pub fn failing(mut self, name: &str) -> Self {
        self.config.simulate.fail.push(name.to_string());
        self
    }

    pub fn with_step_delay_ms(mut self, ms: u64) -> Self {
        self.config.simulate.step_delay_ms = ms;
        self
    }

    /// The unvalidated config, for tests that expect validation to fail.
    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `NodeConfig`.
pub struct NodeConfigBuilder {
    node: NodeConfig,
}

impl NodeConfigBuilder {
    pub fn new() -> Self {
        Self {
            node: NodeConfig {
                after: vec![],
                aliases: vec![],
                features: vec![],
                configuration: BTreeMap::new(),
            },
        }
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.node.after.push(dep.to_string());
        self
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.node.aliases.push(alias.to_string());
        self
    }

    pub fn feature(mut self, feature: &str) -> Self {
        self.node.features.push(feature.to_string());
        self
    }

    pub fn setting(mut self, key: &str, value: &str) -> Self {
        self.node
            .configuration
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn build(self) -> NodeConfig {
        self.node
    }
}

impl Default for NodeConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for a `Graph` from `(node, depends_on)` pairs.
///
/// Nodes are created in the order they are first mentioned.
#[derive(Default)]
pub struct GraphBuilder {
    nodes: Vec<String>,
    edges: Vec<(String, String)>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an isolated node (or fix the position of a later-mentioned one).
    pub fn node(mut self, name: &str) -> Self {
        self.nodes.push(name.to_string());
        self
    }

    /// `node` depends on `depends_on`.
    pub fn edge(mut self, node: &str, depends_on: &str) -> Self {
        self.edges.push((node.to_string(), depends_on.to_string()));
        self
    }

    pub fn edges(&self) -> Vec<(String, String)> {
        self.edges.clone()
    }

    /// Graph without levels assigned.
    pub fn build(self) -> Graph {
        let mut graph = Graph::new();
        for name in &self.nodes {
            graph.add_node(name);
        }
        for (node, depends_on) in &self.edges {
            graph
                .add_dependency(node, depends_on)
                .expect("builder edge rejected");
        }
        graph
    }

    /// Graph with levels assigned; panics on a cycle.
    pub fn leveled(self) -> Graph {
        let mut graph = self.build();
        graph.compute_levels().expect("builder graph has a cycle");
        graph
    }
}
