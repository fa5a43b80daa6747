//! `invcollect` binary entry point.
//!
//! Runs every command on a single-threaded tokio runtime. Any fatal error is
//! reported as one error Notify line on stdout and the process exits with
//! status 1.

mod cli;
mod commands;
mod error;
mod logging;
mod mapper;
mod output;

use std::process::ExitCode;

use clap::Parser;

use invcollect_core::config::AgentConfig;
use invcollect_core::notify::NotifyEvent;

use crate::cli::{Cli, Commands};
use crate::error::{CliError, EXIT_FAILURE};
use crate::output::OutputWriter;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let command = command_name(&cli.command);

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            NotifyEvent::error(command, format!("failed to start async runtime: {e}")).emit();
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            e.to_notify(command).emit();
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let agent = AgentConfig::load_or_default(&cli.config);

    let general = agent
        .as_ref()
        .map(|a| a.general.clone())
        .unwrap_or_default();
    if let Err(e) = logging::init_tracing(&general, cli.log_level.as_deref()) {
        eprintln!("warning: {e}");
    }
    invcollect_core::metrics::describe_all();

    tracing::debug!(config = %cli.config.display(), "invcollect starting");
    let writer = OutputWriter::new(cli.output);

    match cli.command {
        Commands::Collect(args) => commands::collect::execute(args, &agent?).await,
        Commands::Encode(args) => commands::encode::execute(args, &writer),
        Commands::Config(args) => commands::config::execute(args, &cli.config, agent, &writer),
    }
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Collect(_) => commands::collect::EVENT_NAME,
        Commands::Encode(_) => "encode",
        Commands::Config(_) => "config",
    }
}
