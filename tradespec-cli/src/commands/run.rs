//! `tradespec run` command handler

use std::path::Path;

use tokio::time::Instant;
use tracing::{info, warn};

use tradespec_core::config::TradespecConfig;

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::output::OutputWriter;
use crate::report::RunReport;
use crate::scenarios::{ScenarioContext, run_suite};
use crate::suite::SuiteId;

/// Execute the `run` command.
///
/// Loads the configuration (the file is optional), applies the command-line
/// overrides, runs the selected suites in order and renders the report.
///
/// # Errors
///
/// * `CliError::Core` with a config error if the effective configuration is invalid
/// * `CliError::ChecksFailed` if any check failed
/// * `CliError::Command` if interrupted
pub async fn execute(
    args: RunArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let mut config = TradespecConfig::load_or_default(config_path).await?;
    apply_overrides(&mut config, &args);
    config.validate()?;

    let suites = SuiteId::select(&args.suites);
    let ctx = ScenarioContext::new(config)?;

    let report = tokio::select! {
        report = run_suites(&ctx, &suites, args.fail_fast) => report,
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupted, stopping event collectors");
            ctx.cancel.cancel();
            return Err(CliError::Command("interrupted".to_owned()));
        }
    };

    writer.render(&report)?;

    if !report.is_success() {
        return Err(CliError::ChecksFailed {
            failed: report.failed,
            total: report.total,
        });
    }
    Ok(())
}

/// Apply `run` flags on top of file and environment settings.
pub fn apply_overrides(config: &mut TradespecConfig, args: &RunArgs) {
    if let Some(ref url) = args.quote_url {
        config.endpoints.quote_url = url.clone();
    }
    if let Some(ref url) = args.audit_url {
        config.endpoints.audit_url = url.clone();
    }
    if let Some(ref url) = args.dashboard_url {
        config.endpoints.dashboard_url = url.clone();
    }
    if let Some(ref url) = args.bus_url {
        config.endpoints.bus_url = Some(url.clone());
    }
    if let Some(attempts) = args.max_attempts {
        config.polling.max_attempts = attempts;
    }
}

/// Run `suites` in order. With `fail_fast`, stops after the first failing suite.
pub async fn run_suites(ctx: &ScenarioContext, suites: &[SuiteId], fail_fast: bool) -> RunReport {
    let started = Instant::now();
    let mut reports = Vec::with_capacity(suites.len());

    for &suite in suites {
        let report = run_suite(ctx, suite).await;
        let passed = report.passed();
        reports.push(report);
        if !passed && fail_fast {
            info!(suite = suite.slug(), "fail-fast: skipping remaining suites");
            break;
        }
    }

    let report = RunReport::new(reports, started.elapsed());
    info!(
        passed = report.passed,
        failed = report.failed,
        skipped = report.skipped,
        duration_ms = report.duration_ms,
        "run finished"
    );
    report
}
