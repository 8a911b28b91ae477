//! REST suites against mock HTTP services.

use axum::Router;
use axum::http::StatusCode;
use serde_json::json;

use tradespec_cli::report::{CheckStatus, SuiteReport};
use tradespec_cli::scenarios::{STATUS_CHECK, ScenarioContext, run_suite};
use tradespec_cli::suite::SuiteId;

use crate::helpers::config::TestConfigBuilder;
use crate::helpers::{fixtures, services};

fn statuses(report: &SuiteReport) -> Vec<(&str, CheckStatus)> {
    report
        .checks
        .iter()
        .map(|c| (c.name.as_str(), c.status))
        .collect()
}

fn detail<'a>(report: &'a SuiteReport, check: &str) -> &'a str {
    report
        .checks
        .iter()
        .find(|c| c.name == check)
        .and_then(|c| c.detail.as_deref())
        .unwrap_or_default()
}

async fn run(builder: TestConfigBuilder, suite: SuiteId) -> SuiteReport {
    let ctx = ScenarioContext::new(builder.build()).expect("context");
    run_suite(&ctx, suite).await
}

#[tokio::test]
async fn test_e2e_dashboard_returns_200() {
    // Given: a dashboard serving HTML at its root
    let dashboard = services::healthy_dashboard().await;

    // When: running the dashboard suite
    let report = run(TestConfigBuilder::new().dashboard_url(dashboard), SuiteId::Dashboard).await;

    // Then: the single status check passes (HTML body is not decoded)
    assert_eq!(statuses(&report), vec![(STATUS_CHECK, CheckStatus::Passed)]);
}

#[tokio::test]
async fn test_e2e_dashboard_error_status_fails() {
    let dashboard = services::spawn(services::status_route(
        Router::new(),
        "/",
        StatusCode::INTERNAL_SERVER_ERROR,
    ))
    .await;

    let report = run(TestConfigBuilder::new().dashboard_url(dashboard), SuiteId::Dashboard).await;

    assert!(!report.passed());
    assert!(detail(&report, STATUS_CHECK).contains("expected 200, got 500"));
}

#[tokio::test]
async fn test_e2e_quotes_contain_every_company() {
    let quote = services::quote_service(fixtures::quote_book()).await;

    let report = run(TestConfigBuilder::new().quote_url(quote), SuiteId::Quotes).await;

    assert!(report.passed(), "unexpected failures: {:?}", report.checks);
    assert_eq!(report.count(CheckStatus::Passed), 5);
    assert!(
        report
            .checks
            .iter()
            .any(|c| c.name == "returns a Black Coat quote")
    );
}

#[tokio::test]
async fn test_e2e_quotes_missing_company_fails_that_check_only() {
    // Given: a quote book without Divinator
    let mut book = fixtures::quote_book();
    book.as_object_mut()
        .expect("object")
        .remove("Divinator");
    let quote = services::quote_service(book).await;

    let report = run(TestConfigBuilder::new().quote_url(quote), SuiteId::Quotes).await;

    // Then: only the Divinator check fails
    assert_eq!(report.count(CheckStatus::Failed), 1);
    assert_eq!(report.count(CheckStatus::Passed), 4);
    assert!(detail(&report, "returns a Divinator quote").contains("property 'Divinator'"));
}

#[tokio::test]
async fn test_e2e_quote_without_ask_fails() {
    let mut book = fixtures::quote_book();
    book["MacroHard"]
        .as_object_mut()
        .expect("object")
        .remove("ask");
    let quote = services::quote_service(book).await;

    let report = run(TestConfigBuilder::new().quote_url(quote), SuiteId::Quotes).await;

    assert!(detail(&report, "returns a MacroHard quote").contains("property 'ask'"));
}

#[tokio::test]
async fn test_e2e_unreachable_quote_service_skips_dependent_checks() {
    let quote = services::closed_url().await;

    let report = run(TestConfigBuilder::new().quote_url(quote), SuiteId::Quotes).await;

    assert_eq!(report.count(CheckStatus::Failed), 1);
    assert_eq!(report.count(CheckStatus::Skipped), 4);
    assert!(detail(&report, STATUS_CHECK).contains("unreachable"));
}

#[tokio::test]
async fn test_e2e_audit_returns_bounded_trade_list() {
    let audit = services::audit_service(fixtures::trades(10)).await;

    let report = run(TestConfigBuilder::new().audit_url(audit), SuiteId::Audit).await;

    assert!(report.passed(), "unexpected failures: {:?}", report.checks);
    assert_eq!(report.checks.len(), 3);
}

#[tokio::test]
async fn test_e2e_audit_empty_list_passes() {
    let audit = services::audit_service(json!([])).await;

    let report = run(TestConfigBuilder::new().audit_url(audit), SuiteId::Audit).await;

    assert!(report.passed());
}

#[tokio::test]
async fn test_e2e_audit_too_many_trades_fails() {
    let audit = services::audit_service(fixtures::trades(11)).await;

    let report = run(TestConfigBuilder::new().audit_url(audit), SuiteId::Audit).await;

    let msg = detail(&report, "returns an array of stock trades");
    assert!(msg.contains("within 0..=10"), "got: {msg}");
    assert!(msg.contains("11"));
}

#[tokio::test]
async fn test_e2e_audit_object_body_fails() {
    let audit = services::audit_service(json!({"trades": []})).await;

    let report = run(TestConfigBuilder::new().audit_url(audit), SuiteId::Audit).await;

    assert!(detail(&report, "returns an array of stock trades").contains("an array"));
}

#[tokio::test]
async fn test_e2e_operations_via_dashboard() {
    let dashboard = services::healthy_dashboard().await;

    let report = run(
        TestConfigBuilder::new().dashboard_url(dashboard),
        SuiteId::Operations,
    )
    .await;

    assert!(report.passed(), "unexpected failures: {:?}", report.checks);
}

#[tokio::test]
async fn test_e2e_discovery_all_up() {
    let dashboard = services::healthy_dashboard().await;

    let report = run(
        TestConfigBuilder::new().dashboard_url(dashboard),
        SuiteId::Discovery,
    )
    .await;

    assert!(report.passed(), "unexpected failures: {:?}", report.checks);
    assert_eq!(report.checks.len(), 4);
}

#[tokio::test]
async fn test_e2e_discovery_down_service_fails() {
    let mut records = fixtures::discovery_records(5, "UP");
    records[3]["status"] = json!("DOWN");
    let dashboard = services::dashboard(fixtures::trades(0), records).await;

    let report = run(
        TestConfigBuilder::new().dashboard_url(dashboard),
        SuiteId::Discovery,
    )
    .await;

    let msg = detail(&report, "lists all services having a status of UP");
    assert!(msg.contains("discovery[3].status"), "got: {msg}");
    assert!(msg.contains("\"DOWN\""));
}

#[tokio::test]
async fn test_e2e_discovery_wrong_count_still_checks_status() {
    let dashboard =
        services::dashboard(fixtures::trades(0), fixtures::discovery_records(4, "UP")).await;

    let report = run(
        TestConfigBuilder::new().dashboard_url(dashboard),
        SuiteId::Discovery,
    )
    .await;

    assert_eq!(
        statuses(&report),
        vec![
            (STATUS_CHECK, CheckStatus::Passed),
            ("returns a JSON body", CheckStatus::Passed),
            (
                "returns an array of service location records",
                CheckStatus::Failed
            ),
            (
                "lists all services having a status of UP",
                CheckStatus::Passed
            ),
        ]
    );
}
