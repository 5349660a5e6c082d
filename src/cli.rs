// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `dagboard`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "dagboard",
    version,
    about = "Lay out a workflow DAG and track its progress as an event stream.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    #[arg(long, value_name = "PATH", default_value = "Dagboard.toml")]
    pub config: String,

    /// Identifier of the run to register.
    #[arg(long, value_name = "ID", default_value = "run-1")]
    pub run_id: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `DAGBOARD_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Lay levels out left-to-right instead of top-to-bottom.
    #[arg(long)]
    pub landscape: bool,

    /// Parse + validate, print the leveled DAG, then exit.
    #[arg(long)]
    pub dry_run: bool,

    /// Play the run out with simulated jobs and stream its events.
    #[arg(long)]
    pub simulate: bool,

    /// Append the run's events to this JSON-lines file.
    ///
    /// Overrides `[journal].path` from the config.
    #[arg(long, value_name = "PATH")]
    pub journal: Option<PathBuf>,

    /// Write a checkpoint of the run to this file when done.
    #[arg(long, value_name = "PATH")]
    pub checkpoint: Option<PathBuf>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_flags() {
        let args = CliArgs::try_parse_from(["dagboard"]).unwrap();
        assert_eq!(args.config, "Dagboard.toml");
        assert_eq!(args.run_id, "run-1");
        assert!(!args.simulate && !args.dry_run && !args.landscape);
        assert!(args.journal.is_none());
    }

    #[test]
    fn flags_are_parsed() {
        let args = CliArgs::try_parse_from([
            "dagboard",
            "--config",
            "flows/etl.toml",
            "--simulate",
            "--log-level",
            "debug",
            "--journal",
            "events.jsonl",
        ])
        .unwrap();

        assert_eq!(args.config, "flows/etl.toml");
        assert!(args.simulate);
        assert!(matches!(args.log_level, Some(LogLevel::Debug)));
        assert_eq!(args.journal, Some(PathBuf::from("events.jsonl")));
    }
}
