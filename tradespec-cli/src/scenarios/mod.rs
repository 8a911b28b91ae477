//! Suite implementations
//!
//! REST suites (`rest`) issue one `GET` each and assert status and body shape.
//! Event suites (`events`) subscribe to a bus channel, poll the event buffer
//! until enough payloads arrived and validate every payload against a schema.

mod events;
mod rest;

use tokio_util::sync::CancellationToken;
use url::Url;

use tradespec_core::config::TradespecConfig;
use tradespec_core::error::{ConfigError, TradespecError};

use crate::http::HttpProbe;
use crate::report::SuiteReport;
use crate::suite::SuiteId;

/// Check name shared by every REST suite.
pub const STATUS_CHECK: &str = "returns a 200 OK response";

/// Everything a suite needs to run.
#[derive(Debug, Clone)]
pub struct ScenarioContext {
    pub config: TradespecConfig,
    pub http: HttpProbe,
    /// Cancelled when the run is interrupted; stops event collectors.
    pub cancel: CancellationToken,
}

impl ScenarioContext {
    pub fn new(config: TradespecConfig) -> Result<Self, TradespecError> {
        let http = HttpProbe::new(config.http.timeout())?;
        Ok(Self {
            config,
            http,
            cancel: CancellationToken::new(),
        })
    }
}

/// Run one suite and collect its checks.
pub async fn run_suite(ctx: &ScenarioContext, suite: SuiteId) -> SuiteReport {
    tracing::info!(suite = suite.slug(), title = suite.title(), "running suite");
    match suite {
        SuiteId::Dashboard => rest::dashboard(ctx).await,
        SuiteId::Quotes => rest::quotes(ctx).await,
        SuiteId::Audit => {
            let url = endpoint("endpoints.audit_url", &ctx.config.endpoints.audit_url);
            rest::trade_listing(ctx, suite, url).await
        }
        SuiteId::Operations => {
            let url = ctx.config.endpoints.operations_url().map_err(TradespecError::from);
            rest::trade_listing(ctx, suite, url).await
        }
        SuiteId::Discovery => rest::discovery(ctx).await,
        SuiteId::MarketEvents => events::market(ctx).await,
        SuiteId::Portfolio => events::portfolio(ctx).await,
    }
}

fn endpoint(field: &str, value: &str) -> Result<Url, TradespecError> {
    Url::parse(value).map_err(|e| {
        TradespecError::Config(ConfigError::InvalidValue {
            field: field.to_owned(),
            reason: format!("invalid url '{value}': {e}"),
        })
    })
}
