//! CLI argument parsing using clap derive API
//!
//! Purely declarative: no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// invcollect -- collect records from a REST API into an XML inventory file.
///
/// Use `invcollect <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "invcollect", version, about, long_about = None)]
pub struct Cli {
    /// Path to the invcollect.toml agent configuration file (optional).
    #[arg(short, long, default_value = "invcollect.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format for command reports.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch records from the configured API and write an inventory file.
    Collect(CollectArgs),

    /// Encode a plain `key,value#key,value` list into a run-parameter blob.
    Encode(EncodeArgs),

    /// Inspect configuration.
    Config(ConfigArgs),
}

// ---- collect ----

#[derive(Args, Debug)]
pub struct CollectArgs {
    /// Run-parameter blob (Base64) or a plain `key,value#key,value` list.
    pub params: String,

    /// External XML settings file (default: version-scoped system location).
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Request URL overriding the `apiUrl` setting.
    #[arg(long)]
    pub url: Option<String>,
}

// ---- encode ----

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Plain `key,value#key,value` list.
    pub pairs: String,
}

// ---- config ----

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective run configuration with secrets redacted.
    Show {
        /// Run-parameter blob (Base64) or a plain `key,value#key,value` list.
        params: String,

        /// External XML settings file (default: version-scoped system location).
        #[arg(long)]
        settings: Option<PathBuf>,
    },
    /// Validate the agent configuration file.
    Validate,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn collect_parses_params_and_overrides() {
        let cli = Cli::parse_from([
            "invcollect",
            "collect",
            "dataDir,/tmp/out#version,9.0.1",
            "--settings",
            "/etc/custom.xml",
            "--url",
            "https://api.test/devices",
        ]);
        match cli.command {
            Commands::Collect(args) => {
                assert_eq!(args.params, "dataDir,/tmp/out#version,9.0.1");
                assert_eq!(args.settings, Some(PathBuf::from("/etc/custom.xml")));
                assert_eq!(args.url.as_deref(), Some("https://api.test/devices"));
            }
            other => panic!("expected collect, got {other:?}"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "invcollect",
            "config",
            "validate",
            "--output",
            "json",
            "--log-level",
            "debug",
        ]);
        assert!(matches!(cli.output, OutputFormat::Json));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.config, PathBuf::from("invcollect.toml"));
    }
}
