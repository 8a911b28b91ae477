//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::suite::SuiteId;

/// tradespec -- integration suite for the trading demo system.
///
/// Use `tradespec <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "tradespec", version, about, long_about = None)]
pub struct Cli {
    /// Path to the tradespec.toml configuration file (optional).
    #[arg(short, long, default_value = "tradespec.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
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
    /// Run suites against a live deployment.
    Run(RunArgs),

    /// List the available suites.
    List,

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- run ----

/// Run suites against a live deployment.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Suites to run (repeatable). Runs every suite when omitted.
    #[arg(short, long = "suite", value_enum)]
    pub suites: Vec<SuiteId>,

    /// Override the quote service URL.
    #[arg(long)]
    pub quote_url: Option<String>,

    /// Override the audit service URL.
    #[arg(long)]
    pub audit_url: Option<String>,

    /// Override the dashboard URL.
    #[arg(long)]
    pub dashboard_url: Option<String>,

    /// Override the event bus bridge URL (default: <dashboard>/eventbus/).
    #[arg(long)]
    pub bus_url: Option<String>,

    /// Override the maximum number of poll attempts for event suites.
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Stop after the first failing suite.
    #[arg(long)]
    pub fail_fast: bool,
}

// ---- config ----

/// Manage tradespec configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, endpoints, bus, polling, http, expectations).
        #[arg(long)]
        section: Option<String>,
    },
}
