//! Event bus suites against `MockBridge`.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tokio::task::JoinHandle;

use tradespec_cli::report::{CheckStatus, SuiteReport};
use tradespec_cli::scenarios::{ScenarioContext, run_suite};
use tradespec_cli::suite::SuiteId;
use tradespec_eventbus::testing::{MockBridge, MockReply};

use crate::helpers::config::TestConfigBuilder;
use crate::helpers::{fixtures, services};

const REGISTRATION_TIMEOUT: Duration = Duration::from_secs(5);

async fn start_bridge() -> Arc<MockBridge> {
    Arc::new(MockBridge::start().await.expect("mock bridge starts"))
}

/// Publish `payloads` on `channel` once the client registered for it.
fn publish_after_register(
    bridge: &Arc<MockBridge>,
    channel: &'static str,
    payloads: Vec<Value>,
) -> JoinHandle<bool> {
    let bridge = Arc::clone(bridge);
    tokio::spawn(async move {
        if !bridge
            .wait_for_registration(channel, REGISTRATION_TIMEOUT)
            .await
        {
            return false;
        }
        for payload in payloads {
            bridge.publish(channel, payload);
        }
        true
    })
}

fn check<'a>(report: &'a SuiteReport, name: &str) -> (CheckStatus, &'a str) {
    let check = report
        .checks
        .iter()
        .find(|c| c.name == name)
        .unwrap_or_else(|| panic!("check '{name}' missing from {:?}", report.checks));
    (check.status, check.detail.as_deref().unwrap_or_default())
}

fn market_quotes(count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| {
            let (name, symbol) = fixtures::COMPANIES[i % fixtures::COMPANIES.len()];
            fixtures::quote(name, symbol)
        })
        .collect()
}

#[tokio::test]
async fn test_e2e_market_events_collects_and_validates_quotes() {
    // Given: a bridge that publishes five valid quotes after registration
    let bridge = start_bridge().await;
    let publisher = publish_after_register(&bridge, "market", market_quotes(5));
    let config = TestConfigBuilder::new()
        .bus_url(bridge.bridge_url().to_string())
        .build();

    // When: running the market events suite
    let ctx = ScenarioContext::new(config).expect("context");
    let report = run_suite(&ctx, SuiteId::MarketEvents).await;

    // Then: connect, receive and schema checks all pass
    assert!(publisher.await.expect("publisher task"), "client never registered");
    assert!(report.passed(), "unexpected failures: {:?}", report.checks);
    assert_eq!(report.count(CheckStatus::Passed), 3);
}

#[tokio::test]
async fn test_e2e_market_events_reports_invalid_quote() {
    let bridge = start_bridge().await;
    let mut quotes = market_quotes(4);
    quotes[2]["bid"] = json!("not a number");
    let _publisher = publish_after_register(&bridge, "market", quotes);
    let config = TestConfigBuilder::new()
        .bus_url(bridge.bridge_url().to_string())
        .build();

    let ctx = ScenarioContext::new(config).expect("context");
    let report = run_suite(&ctx, SuiteId::MarketEvents).await;

    let (status, detail) = check(&report, "every quote matches the quote schema");
    assert_eq!(status, CheckStatus::Failed);
    assert!(detail.contains("item 2"), "got: {detail}");
    assert!(detail.contains("bid"), "got: {detail}");
}

#[tokio::test]
async fn test_e2e_market_events_times_out_with_too_few_quotes() {
    // Given: only three quotes, and a short polling budget
    let bridge = start_bridge().await;
    let _publisher = publish_after_register(&bridge, "market", market_quotes(3));
    let config = TestConfigBuilder::new()
        .bus_url(bridge.bridge_url().to_string())
        .polling(20, 10)
        .build();

    let ctx = ScenarioContext::new(config).expect("context");
    let report = run_suite(&ctx, SuiteId::MarketEvents).await;

    // Then: the receive check fails with a timeout and validation is skipped
    let (status, detail) = check(&report, "receives market data");
    assert_eq!(status, CheckStatus::Failed);
    assert!(detail.contains("more than 3 quotes buffered"), "got: {detail}");
    assert!(detail.contains("after 10 attempts"), "got: {detail}");
    let (status, _) = check(&report, "every quote matches the quote schema");
    assert_eq!(status, CheckStatus::Skipped);
}

#[tokio::test]
async fn test_e2e_market_events_ignores_error_deliveries() {
    let bridge = start_bridge().await;
    let publisher = {
        let bridge = Arc::clone(&bridge);
        tokio::spawn(async move {
            bridge
                .wait_for_registration("market", REGISTRATION_TIMEOUT)
                .await;
            bridge.fail("market", "RECIPIENT_FAILURE", "quote generator hiccup");
            for quote in market_quotes(4) {
                bridge.publish("market", quote);
            }
        })
    };
    let config = TestConfigBuilder::new()
        .bus_url(bridge.bridge_url().to_string())
        .build();

    let ctx = ScenarioContext::new(config).expect("context");
    let report = run_suite(&ctx, SuiteId::MarketEvents).await;
    publisher.await.expect("publisher task");

    assert!(report.passed(), "unexpected failures: {:?}", report.checks);
}

#[tokio::test]
async fn test_e2e_event_suite_without_bridge_skips_everything() {
    let config = TestConfigBuilder::new()
        .bus_url(format!("{}eventbus/", services::closed_url().await))
        .build();

    let ctx = ScenarioContext::new(config).expect("context");
    let report = run_suite(&ctx, SuiteId::Portfolio).await;

    let (status, _) = check(&report, "connects to the event bus");
    assert_eq!(status, CheckStatus::Failed);
    assert_eq!(report.count(CheckStatus::Skipped), 3);
}

#[tokio::test]
async fn test_e2e_portfolio_trades_and_service() {
    // Given: trades on the portfolio channel and a funded portfolio service
    let bridge = start_bridge().await;
    bridge.reply_to(
        "service.portfolio",
        MockReply::Body(fixtures::portfolio(10_000.0)),
    );
    let publisher = publish_after_register(&bridge, "portfolio", vec![fixtures::trade("BUY")]);
    let config = TestConfigBuilder::new()
        .bus_url(bridge.bridge_url().to_string())
        .build();

    // When
    let ctx = ScenarioContext::new(config).expect("context");
    let report = run_suite(&ctx, SuiteId::Portfolio).await;

    // Then
    assert!(publisher.await.expect("publisher task"));
    assert!(report.passed(), "unexpected failures: {:?}", report.checks);
    assert_eq!(report.count(CheckStatus::Passed), 4);
}

#[tokio::test]
async fn test_e2e_portfolio_invalid_action_fails_schema() {
    let bridge = start_bridge().await;
    bridge.reply_to(
        "service.portfolio",
        MockReply::Body(fixtures::portfolio(500.0)),
    );
    let _publisher = publish_after_register(&bridge, "portfolio", vec![fixtures::trade("HOLD")]);
    let config = TestConfigBuilder::new()
        .bus_url(bridge.bridge_url().to_string())
        .build();

    let ctx = ScenarioContext::new(config).expect("context");
    let report = run_suite(&ctx, SuiteId::Portfolio).await;

    let (status, detail) = check(&report, "every trade matches the trade schema");
    assert_eq!(status, CheckStatus::Failed);
    assert!(detail.contains("action"), "got: {detail}");
    let (status, _) = check(&report, "retrieves portfolio service data");
    assert_eq!(status, CheckStatus::Passed);
}

#[tokio::test]
async fn test_e2e_portfolio_without_cash_fails_service_check() {
    let bridge = start_bridge().await;
    bridge.reply_to("service.portfolio", MockReply::Body(fixtures::portfolio(0.0)));
    let _publisher = publish_after_register(&bridge, "portfolio", vec![fixtures::trade("SELL")]);
    let config = TestConfigBuilder::new()
        .bus_url(bridge.bridge_url().to_string())
        .build();

    let ctx = ScenarioContext::new(config).expect("context");
    let report = run_suite(&ctx, SuiteId::Portfolio).await;

    let (status, detail) = check(&report, "retrieves portfolio service data");
    assert_eq!(status, CheckStatus::Failed);
    assert!(detail.contains("portfolio cash"), "got: {detail}");
    assert!(detail.contains("above 0"), "got: {detail}");
}

#[tokio::test]
async fn test_e2e_portfolio_service_failure_is_reported() {
    let bridge = start_bridge().await;
    bridge.reply_to(
        "service.portfolio",
        MockReply::Failure {
            code: 500,
            kind: "RECIPIENT_FAILURE".to_owned(),
            message: "portfolio unavailable".to_owned(),
        },
    );
    let _publisher = publish_after_register(&bridge, "portfolio", vec![fixtures::trade("BUY")]);
    let config = TestConfigBuilder::new()
        .bus_url(bridge.bridge_url().to_string())
        .build();

    let ctx = ScenarioContext::new(config).expect("context");
    let report = run_suite(&ctx, SuiteId::Portfolio).await;

    let (status, detail) = check(&report, "retrieves portfolio service data");
    assert_eq!(status, CheckStatus::Failed);
    assert!(detail.contains("portfolio unavailable"), "got: {detail}");
}
