// src/config/model.rs

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::dag::{Graph, Node};
use crate::errors::Result;
use crate::layout::LayoutOptions;
use crate::progress::DEFAULT_MAX_EVENTS;
use crate::simulate::SimulateOptions;

/// Configuration exactly as read from TOML, before validation.
///
/// ```toml
/// [layout]
/// landscape = false
///
/// [store]
/// max_events = 100
///
/// [node.load_logs]
/// features = ["LOAD"]
///
/// [node.group_by_user]
/// after = ["load_logs"]
/// ```
///
/// All sections except `[node.<name>]` are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub layout: LayoutOptions,

    #[serde(default)]
    pub store: StoreSection,

    #[serde(default)]
    pub journal: JournalSection,

    #[serde(default)]
    pub simulate: SimulateSection,

    /// Keys are node names.
    #[serde(default)]
    pub node: BTreeMap<String, NodeConfig>,
}

/// A validated configuration. Only obtainable through
/// `ConfigFile::try_from(RawConfigFile)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub layout: LayoutOptions,
    pub store: StoreSection,
    pub journal: JournalSection,
    pub simulate: SimulateSection,
    pub node: BTreeMap<String, NodeConfig>,
}

/// `[store]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreSection {
    /// Page size for event polls.
    #[serde(default = "default_max_events")]
    pub max_events: usize,
}

fn default_max_events() -> usize {
    DEFAULT_MAX_EVENTS
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            max_events: default_max_events(),
        }
    }
}

/// `[journal]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JournalSection {
    /// JSON-lines file to append events to. No journal when absent.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// `[simulate]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SimulateSection {
    #[serde(default = "default_step_delay_ms")]
    pub step_delay_ms: u64,

    /// Nodes that report failure in a simulated run.
    #[serde(default)]
    pub fail: Vec<String>,
}

fn default_step_delay_ms() -> u64 {
    25
}

impl Default for SimulateSection {
    fn default() -> Self {
        Self {
            step_delay_ms: default_step_delay_ms(),
            fail: Vec::new(),
        }
    }
}

/// `[node.<name>]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeConfig {
    /// Nodes that must complete before this one.
    #[serde(default)]
    pub after: Vec<String>,

    #[serde(default)]
    pub aliases: Vec<String>,

    #[serde(default)]
    pub features: Vec<String>,

    #[serde(default)]
    pub configuration: BTreeMap<String, String>,
}

impl ConfigFile {
    /// Assemble a `ConfigFile` without validating it.
    pub(crate) fn new_unchecked(
        layout: LayoutOptions,
        store: StoreSection,
        journal: JournalSection,
        simulate: SimulateSection,
        node: BTreeMap<String, NodeConfig>,
    ) -> Self {
        Self {
            layout,
            store,
            journal,
            simulate,
            node,
        }
    }

    /// Node records in name order, carrying their descriptive tags.
    pub fn nodes(&self) -> Vec<Node> {
        self.node
            .iter()
            .map(|(name, cfg)| {
                let mut node = Node::new(name.as_str())
                    .with_aliases(cfg.aliases.iter().cloned())
                    .with_features(cfg.features.iter().cloned());
                node.configuration = cfg.configuration.clone();
                node
            })
            .collect()
    }

    /// Every `after` entry as a `(node, depends_on)` pair.
    pub fn edges(&self) -> Vec<(String, String)> {
        self.node
            .iter()
            .flat_map(|(name, cfg)| cfg.after.iter().map(move |dep| (name.clone(), dep.clone())))
            .collect()
    }

    /// Build an unleveled [`Graph`] from the node sections.
    pub fn to_graph(&self) -> Result<Graph> {
        let mut graph = Graph::new();
        for node in self.nodes() {
            let name = node.name.clone();
            *graph.add_node(&name) = node;
        }
        for (node, depends_on) in self.edges() {
            graph.add_dependency(&node, &depends_on)?;
        }
        Ok(graph)
    }

    pub fn simulate_options(&self) -> SimulateOptions {
        SimulateOptions {
            step_delay: Duration::from_millis(self.simulate.step_delay_ms),
            fail: self.simulate.fail.iter().cloned().collect::<HashSet<_>>(),
        }
    }
}
