// src/config/validate.rs

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::warn;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{DagboardError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = DagboardError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(
            raw.layout,
            raw.store,
            raw.journal,
            raw.simulate,
            raw.node,
        ))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_nodes(cfg)?;
    validate_store(cfg)?;
    validate_layout(cfg)?;
    validate_node_dependencies(cfg)?;
    validate_simulate(cfg)?;
    validate_dag(cfg)?;
    Ok(())
}

fn ensure_has_nodes(cfg: &RawConfigFile) -> Result<()> {
    if cfg.node.is_empty() {
        return Err(DagboardError::ConfigError(
            "config must contain at least one [node.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_store(cfg: &RawConfigFile) -> Result<()> {
    if cfg.store.max_events == 0 {
        return Err(DagboardError::ConfigError(
            "[store].max_events must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_layout(cfg: &RawConfigFile) -> Result<()> {
    let layout = &cfg.layout;
    for (key, value) in [
        ("level_height", layout.level_height),
        ("base_width", layout.base_width),
    ] {
        if !value.is_finite() || value <= 0.0 {
            return Err(DagboardError::ConfigError(format!(
                "[layout].{key} must be a positive number (got {value})"
            )));
        }
    }

    if !layout.width_per_char.is_finite() || layout.width_per_char < 0.0 {
        return Err(DagboardError::ConfigError(format!(
            "[layout].width_per_char must be >= 0 (got {})",
            layout.width_per_char
        )));
    }
    Ok(())
}

fn validate_node_dependencies(cfg: &RawConfigFile) -> Result<()> {
    for (name, node) in cfg.node.iter() {
        for dep in node.after.iter() {
            if dep == name {
                return Err(DagboardError::ConfigError(format!(
                    "node '{}' cannot depend on itself in `after`",
                    name
                )));
            }
            if !cfg.node.contains_key(dep) {
                return Err(DagboardError::ConfigError(format!(
                    "node '{}' has unknown dependency '{}' in `after`",
                    name, dep
                )));
            }
        }

        if let Some(dup) = first_duplicate(&node.after) {
            return Err(DagboardError::ConfigError(format!(
                "node '{}' lists dependency '{}' more than once in `after`",
                name, dup
            )));
        }
    }
    Ok(())
}

fn validate_simulate(cfg: &RawConfigFile) -> Result<()> {
    for name in cfg.simulate.fail.iter() {
        if !cfg.node.contains_key(name) {
            return Err(DagboardError::ConfigError(format!(
                "[simulate].fail names unknown node '{}'",
                name
            )));
        }
    }
    Ok(())
}

fn validate_dag(cfg: &RawConfigFile) -> Result<()> {
    // Edge direction: dependency -> node, so `[node.B] after = ["A"]` is A -> B.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.node.keys() {
        graph.add_node(name.as_str());
    }

    for (name, node) in cfg.node.iter() {
        for dep in node.after.iter() {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    // A cycle only disables layout for the run, so it loads with a warning.
    if let Err(cycle) = toposort(&graph, None) {
        warn!(
            node = %cycle.node_id(),
            "cycle in `after` lists; layout will be unavailable for this run"
        );
    }
    Ok(())
}

fn first_duplicate(items: &[String]) -> Option<&str> {
    items
        .iter()
        .enumerate()
        .find(|&(i, item)| items[..i].contains(item))
        .map(|(_, item)| item.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::NodeConfig;

    fn raw(nodes: &[(&str, &[&str])]) -> RawConfigFile {
        let mut cfg = RawConfigFile::default();
        for (name, after) in nodes {
            cfg.node.insert(
                name.to_string(),
                NodeConfig {
                    after: after.iter().map(|s| s.to_string()).collect(),
                    ..NodeConfig::default()
                },
            );
        }
        cfg
    }

    fn config_error(cfg: RawConfigFile) -> String {
        match ConfigFile::try_from(cfg) {
            Err(DagboardError::ConfigError(msg)) => msg,
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }

    #[test]
    fn valid_chain_passes() {
        let cfg = ConfigFile::try_from(raw(&[("A", &[]), ("B", &["A"])])).unwrap();
        assert_eq!(cfg.edges(), vec![("B".to_string(), "A".to_string())]);
    }

    #[test]
    fn empty_config_is_rejected() {
        assert!(config_error(RawConfigFile::default()).contains("at least one"));
    }

    #[test]
    fn zero_max_events_is_rejected() {
        let mut cfg = raw(&[("A", &[])]);
        cfg.store.max_events = 0;
        assert!(config_error(cfg).contains("max_events"));
    }

    #[test]
    fn non_positive_level_height_is_rejected() {
        let mut cfg = raw(&[("A", &[])]);
        cfg.layout.level_height = 0.0;
        assert!(config_error(cfg).contains("level_height"));
    }

    #[test]
    fn duplicate_after_entry_is_rejected() {
        let msg = config_error(raw(&[("A", &[]), ("B", &["A", "A"])]));
        assert!(msg.contains("more than once"));
    }

    #[test]
    fn simulate_fail_must_name_known_nodes() {
        let mut cfg = raw(&[("A", &[])]);
        cfg.simulate.fail = vec!["Z".to_string()];
        assert!(config_error(cfg).contains("'Z'"));
    }

    #[test]
    fn cycle_loads_but_cannot_be_leveled() {
        let cfg = ConfigFile::try_from(raw(&[("A", &["B"]), ("B", &["A"])])).unwrap();
        let mut graph = cfg.to_graph().unwrap();
        assert!(matches!(graph.compute_levels(), Err(DagboardError::Cycle(ref n)) if n == "A" || n == "B"));
    }
}
