// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Read and deserialize a config file without semantic validation.
///
/// Use [`load_and_validate`] to also check the node DAG and the numeric
/// settings.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;
    debug!(path = %path.display(), nodes = config.node.len(), "config parsed");

    Ok(config)
}

/// Load a config file and validate it.
///
/// Checks for:
/// - at least one node,
/// - unknown, repeated or self-referencing `after` entries,
/// - sane `[store]` and `[layout]` numbers,
/// - `[simulate].fail` naming existing nodes.
///
/// A cycle is not an error here: it is logged, and the run is served
/// without a layout.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// `Dagboard.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Dagboard.toml")
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::errors::DagboardError;

    fn write_config(text: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    #[test]
    fn full_config_is_loaded_with_defaults_filled_in() {
        let file = write_config(
            r#"
            [layout]
            landscape = true

            [simulate]
            fail = ["B"]

            [node.A]
            aliases = ["raw_logs"]

            [node.B]
            after = ["A"]
            configuration = { "mapred.reduce.tasks" = "10" }
            "#,
        );

        let cfg = load_and_validate(file.path()).unwrap();
        assert!(cfg.layout.landscape);
        assert_eq!(cfg.layout.level_height, 120.0);
        assert_eq!(cfg.store.max_events, 100);
        assert_eq!(cfg.simulate.step_delay_ms, 25);
        assert!(cfg.journal.path.is_none());

        let graph = cfg.to_graph().unwrap();
        assert_eq!(graph.dependencies_of("B"), vec!["A"]);
        assert_eq!(graph.node("A").unwrap().aliases, vec!["raw_logs"]);
        assert_eq!(
            graph.node("B").unwrap().configuration.get("mapred.reduce.tasks"),
            Some(&"10".to_string())
        );
    }

    #[test]
    fn malformed_toml_is_a_toml_error() {
        let file = write_config("[node.A\n");
        assert!(matches!(load_from_path(file.path()), Err(DagboardError::TomlError(_))));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_and_validate(dir.path().join("absent.toml"));
        assert!(matches!(result, Err(DagboardError::IoError(_))));
    }
}
