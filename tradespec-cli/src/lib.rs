//! tradespec CLI -- integration suite runner for the trading demo system
//!
//! The binary (`tradespec`) is a thin wrapper around this library so that the
//! suites can be driven from integration tests against mock services.
//!
//! # Modules
//!
//! - [`cli`]: clap argument definitions
//! - [`commands`]: one handler per subcommand
//! - [`scenarios`]: the REST and event bus suites
//! - [`report`]: per-check results and the run report
//! - [`http`]: JSON `GET` probe
//! - [`output`]: text / JSON rendering
//! - [`logging`]: tracing subscriber setup

pub mod cli;
pub mod commands;
pub mod error;
pub mod http;
pub mod logging;
pub mod output;
pub mod report;
pub mod scenarios;
pub mod suite;

use cli::{Cli, Commands};
use error::CliError;
use output::OutputWriter;

/// Dispatch a parsed command line to its handler.
pub async fn dispatch(cli: Cli) -> Result<(), CliError> {
    let writer = OutputWriter::new(cli.output);
    match cli.command {
        Commands::Run(args) => commands::run::execute(args, &cli.config, &writer).await,
        Commands::List => commands::list::execute(&writer),
        Commands::Config(args) => commands::config::execute(args, &cli.config, &writer).await,
    }
}
