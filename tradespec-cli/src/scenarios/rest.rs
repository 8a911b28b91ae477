//! REST endpoint suites

use serde_json::{Value, json};
use tokio::time::Instant;
use url::Url;

use tradespec_core::assert::{
    expect_all_field_eq, expect_array, expect_array_len, expect_array_len_within,
    expect_property, expect_status,
};
use tradespec_core::error::TradespecError;

use super::{STATUS_CHECK, ScenarioContext, endpoint};
use crate::http::HttpResponse;
use crate::report::SuiteReport;
use crate::suite::SuiteId;

const JSON_CHECK: &str = "returns a JSON body";

pub(super) async fn dashboard(ctx: &ScenarioContext) -> SuiteReport {
    let mut report = SuiteReport::new(SuiteId::Dashboard);
    let url = endpoint(
        "endpoints.dashboard_url",
        &ctx.config.endpoints.dashboard_url,
    );
    let started = Instant::now();
    let result = fetch_ok(ctx, SuiteId::Dashboard, url).await;
    report.record(STATUS_CHECK, started, result);
    report
}

pub(super) async fn quotes(ctx: &ScenarioContext) -> SuiteReport {
    let mut report = SuiteReport::new(SuiteId::Quotes);
    let url = endpoint("endpoints.quote_url", &ctx.config.endpoints.quote_url);
    let companies = &ctx.config.expectations.companies;

    let Some(body) = fetch_json(ctx, &mut report, url).await else {
        for company in companies {
            report.skip(&quote_check(company), "quote endpoint did not answer with JSON");
        }
        return report;
    };

    for company in companies {
        let started = Instant::now();
        let result = expect_property("quote body", &body, company)
            .and_then(|quote| expect_property(&format!("{company} quote"), quote, "ask"));
        report.record(&quote_check(company), started, result);
    }
    report
}

/// Audit and operations suites: an array of at most `max_audit_trades` trades.
pub(super) async fn trade_listing(
    ctx: &ScenarioContext,
    suite: SuiteId,
    url: Result<Url, TradespecError>,
) -> SuiteReport {
    const CHECK: &str = "returns an array of stock trades";

    let mut report = SuiteReport::new(suite);
    let Some(body) = fetch_json(ctx, &mut report, url).await else {
        report.skip(CHECK, "endpoint did not answer with JSON");
        return report;
    };

    let started = Instant::now();
    let max = ctx.config.expectations.max_audit_trades;
    let result = expect_array_len_within(&format!("{suite} body"), &body, 0..=max);
    report.record(CHECK, started, result);
    report
}

pub(super) async fn discovery(ctx: &ScenarioContext) -> SuiteReport {
    const LENGTH_CHECK: &str = "returns an array of service location records";
    const STATUS_UP_CHECK: &str = "lists all services having a status of UP";

    let mut report = SuiteReport::new(SuiteId::Discovery);
    let url = ctx
        .config
        .endpoints
        .discovery_url()
        .map_err(TradespecError::from);

    let Some(body) = fetch_json(ctx, &mut report, url).await else {
        report.skip(LENGTH_CHECK, "discovery endpoint did not answer with JSON");
        report.skip(STATUS_UP_CHECK, "discovery endpoint did not answer with JSON");
        return report;
    };

    let started = Instant::now();
    let expected = ctx.config.expectations.discovery_records;
    let result = expect_array_len("discovery body", &body, expected);
    report.record(LENGTH_CHECK, started, result);

    // statuses are checked even when the record count is off
    let started = Instant::now();
    match expect_array("discovery body", &body) {
        Ok(records) => {
            let result = expect_all_field_eq("discovery", records, "status", &json!("UP"));
            report.record(STATUS_UP_CHECK, started, result);
        }
        Err(_) => report.skip(STATUS_UP_CHECK, "discovery body is not an array"),
    }
    report
}

fn quote_check(company: &str) -> String {
    format!("returns a {company} quote")
}

/// `GET url` and require status 200.
async fn fetch_ok(
    ctx: &ScenarioContext,
    suite: SuiteId,
    url: Result<Url, TradespecError>,
) -> Result<HttpResponse, TradespecError> {
    let url = url?;
    let response = ctx.http.get(&url).await?;
    expect_status(suite.slug(), 200, response.status)?;
    Ok(response)
}

/// Record the status check and the JSON decoding check.
///
/// Returns the decoded body when both pass.
async fn fetch_json(
    ctx: &ScenarioContext,
    report: &mut SuiteReport,
    url: Result<Url, TradespecError>,
) -> Option<Value> {
    let started = Instant::now();
    let result = fetch_ok(ctx, report.suite, url).await;
    let Some(response) = report.record(STATUS_CHECK, started, result) else {
        report.skip(JSON_CHECK, "request failed");
        return None;
    };

    let started = Instant::now();
    report.record(JSON_CHECK, started, response.json())
}
