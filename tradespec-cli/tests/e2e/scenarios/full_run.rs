//! Whole-run behaviour: every suite, fail-fast, exit codes.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tempfile::TempDir;

use tradespec_cli::cli::Cli;
use tradespec_cli::commands::run::run_suites;
use tradespec_cli::error::CliError;
use tradespec_cli::report::CheckStatus;
use tradespec_cli::scenarios::ScenarioContext;
use tradespec_cli::suite::SuiteId;
use tradespec_eventbus::testing::{MockBridge, MockReply};

use crate::helpers::config::TestConfigBuilder;
use crate::helpers::{fixtures, services};

/// Keep publishing on both channels until the test ends.
fn feed(bridge: &Arc<MockBridge>) {
    let bridge = Arc::clone(bridge);
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_millis(20));
        for i in 0..500_usize {
            tick.tick().await;
            let (name, symbol) = fixtures::COMPANIES[i % fixtures::COMPANIES.len()];
            bridge.publish("market", fixtures::quote(name, symbol));
            bridge.publish("portfolio", fixtures::trade("BUY"));
        }
    });
}

#[tokio::test]
async fn test_e2e_every_suite_passes_against_healthy_services() {
    // Given: all HTTP services and a bridge that keeps publishing
    let quote = services::quote_service(fixtures::quote_book()).await;
    let audit = services::audit_service(fixtures::trades(2)).await;
    let dashboard = services::healthy_dashboard().await;
    let bridge = Arc::new(MockBridge::start().await.expect("mock bridge"));
    bridge.reply_to(
        "service.portfolio",
        MockReply::Body(fixtures::portfolio(1_000.0)),
    );
    feed(&bridge);

    let config = TestConfigBuilder::new()
        .quote_url(quote)
        .audit_url(audit)
        .dashboard_url(dashboard)
        .bus_url(bridge.bridge_url().to_string())
        .build();
    let ctx = ScenarioContext::new(config).expect("context");

    // When: running every suite
    let report = run_suites(&ctx, &SuiteId::ALL, false).await;

    // Then: every check of every suite passed
    assert!(report.is_success(), "failures: {:#?}", report.suites);
    assert_eq!(report.suites.len(), SuiteId::ALL.len());
    // dashboard 1, quotes 5, audit 3, operations 3, discovery 4, market 3, portfolio 4
    assert_eq!(report.total, 23);
    assert_eq!(report.passed, 23);
}

#[tokio::test]
async fn test_e2e_fail_fast_stops_after_first_failing_suite() {
    let dashboard = services::healthy_dashboard().await;
    let quote = services::closed_url().await;

    let config = TestConfigBuilder::new()
        .dashboard_url(dashboard)
        .quote_url(quote)
        .build();
    let ctx = ScenarioContext::new(config).expect("context");

    let report = run_suites(
        &ctx,
        &[SuiteId::Dashboard, SuiteId::Quotes, SuiteId::Discovery],
        true,
    )
    .await;

    let ran: Vec<_> = report.suites.iter().map(|s| s.suite).collect();
    assert_eq!(ran, vec![SuiteId::Dashboard, SuiteId::Quotes]);
    assert!(!report.is_success());
}

#[tokio::test]
async fn test_e2e_without_fail_fast_runs_every_selected_suite() {
    let dashboard = services::healthy_dashboard().await;
    let quote = services::closed_url().await;

    let config = TestConfigBuilder::new()
        .dashboard_url(dashboard)
        .quote_url(quote)
        .build();
    let ctx = ScenarioContext::new(config).expect("context");

    let report = run_suites(
        &ctx,
        &[SuiteId::Dashboard, SuiteId::Quotes, SuiteId::Discovery],
        false,
    )
    .await;

    assert_eq!(report.suites.len(), 3);
    assert_eq!(report.failed, 1);
    assert!(report.suites[2].count(CheckStatus::Passed) == 4);
}

#[tokio::test]
async fn test_e2e_failed_check_exits_with_code_1() {
    // Given: a quote service missing every company
    let quote = services::quote_service(serde_json::json!({})).await;
    let dir = TempDir::new().expect("temp dir");
    let config_path = dir.path().join("tradespec.toml");
    std::fs::write(
        &config_path,
        format!("[endpoints]\nquote_url = \"{quote}\"\n"),
    )
    .expect("write config");

    // When: dispatching `tradespec --config <path> run --suite quotes --output json`
    let cli = Cli::try_parse_from([
        "tradespec",
        "--config",
        config_path.to_str().expect("utf8 path"),
        "run",
        "--suite",
        "quotes",
        "--output",
        "json",
    ])
    .expect("valid args");
    let err = tradespec_cli::dispatch(cli).await.expect_err("checks fail");

    // Then
    assert!(matches!(err, CliError::ChecksFailed { failed: 3, .. }), "got {err:?}");
    assert_eq!(err.exit_code(), 1);
}

#[tokio::test]
async fn test_e2e_invalid_override_exits_with_code_2() {
    let dir = TempDir::new().expect("temp dir");
    let config_path = dir.path().join("missing.toml");

    let cli = Cli::try_parse_from([
        "tradespec",
        "--config",
        config_path.to_str().expect("utf8 path"),
        "run",
        "--max-attempts",
        "0",
    ])
    .expect("valid args");
    let err = tradespec_cli::dispatch(cli).await.expect_err("zero attempts");

    assert_eq!(err.exit_code(), 2, "got {err:?}");
    assert!(err.to_string().contains("polling.max_attempts"));
}
