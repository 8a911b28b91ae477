//! Event bus suites
//!
//! Each suite owns its bus connection and its event buffer: open, await ready,
//! subscribe, spawn a collector, poll the buffer, validate, then tear down.

use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use tradespec_core::assert::expect_number_above;
use tradespec_core::buffer::EventBuffer;
use tradespec_core::error::TradespecError;
use tradespec_core::poll::{PollDescriptor, poll_until};
use tradespec_core::schema::SchemaDescriptor;
use tradespec_core::types::{quote_schema, trade_schema};
use tradespec_eventbus::{
    BusOptions, CollectorStats, EventBus, PortfolioService, SubscriptionCollector,
};

use super::ScenarioContext;
use crate::report::SuiteReport;
use crate::suite::SuiteId;

const CONNECT_CHECK: &str = "connects to the event bus";

pub(super) async fn market(ctx: &ScenarioContext) -> SuiteReport {
    const RECEIVE_CHECK: &str = "receives market data";
    const SCHEMA_CHECK: &str = "every quote matches the quote schema";

    let mut report = SuiteReport::new(SuiteId::MarketEvents);
    let channel = ctx.config.bus.market_address.as_str();

    let started = Instant::now();
    let Some(session) = report.record(CONNECT_CHECK, started, EventSession::open(ctx, channel).await)
    else {
        report.skip(RECEIVE_CHECK, "event bus connection failed");
        report.skip(SCHEMA_CHECK, "event bus connection failed");
        return report;
    };

    let started = Instant::now();
    let min = ctx.config.expectations.min_quotes;
    let quotes = report.record(RECEIVE_CHECK, started, session.collect(ctx, "quotes", min).await);
    match quotes {
        Some(quotes) => {
            let started = Instant::now();
            report.record(SCHEMA_CHECK, started, validate(&quote_schema(), &quotes));
        }
        None => report.skip(SCHEMA_CHECK, "not enough quotes received"),
    }

    session.shutdown().await;
    report
}

pub(super) async fn portfolio(ctx: &ScenarioContext) -> SuiteReport {
    const RECEIVE_CHECK: &str = "receives portfolio trading events";
    const SCHEMA_CHECK: &str = "every trade matches the trade schema";
    const SERVICE_CHECK: &str = "retrieves portfolio service data";

    let mut report = SuiteReport::new(SuiteId::Portfolio);
    let channel = ctx.config.bus.portfolio_address.as_str();

    let started = Instant::now();
    let Some(session) = report.record(CONNECT_CHECK, started, EventSession::open(ctx, channel).await)
    else {
        for check in [RECEIVE_CHECK, SCHEMA_CHECK, SERVICE_CHECK] {
            report.skip(check, "event bus connection failed");
        }
        return report;
    };

    let started = Instant::now();
    let min = ctx.config.expectations.min_trades;
    let trades = report.record(RECEIVE_CHECK, started, session.collect(ctx, "trades", min).await);
    match trades {
        Some(trades) => {
            let started = Instant::now();
            report.record(SCHEMA_CHECK, started, validate(&trade_schema(), &trades));
        }
        None => report.skip(SCHEMA_CHECK, "not enough trades received"),
    }

    let started = Instant::now();
    let service = PortfolioService::new(session.bus.clone(), &ctx.config.bus.portfolio_service);
    let result = async {
        let portfolio = service.get_portfolio_raw().await?;
        let cash = portfolio.get("cash").cloned().unwrap_or(Value::Null);
        expect_number_above("portfolio cash", &cash, 0.0)?;
        Ok::<_, TradespecError>(())
    }
    .await;
    report.record(SERVICE_CHECK, started, result);

    session.shutdown().await;
    report
}

fn validate(schema: &SchemaDescriptor, items: &[Value]) -> Result<(), TradespecError> {
    schema.compile()?.validate_all(items)?;
    Ok(())
}

/// One bus connection with a collector feeding a fresh buffer.
struct EventSession {
    bus: EventBus,
    buffer: EventBuffer,
    cancel: CancellationToken,
    collector: JoinHandle<CollectorStats>,
}

impl EventSession {
    async fn open(ctx: &ScenarioContext, channel: &str) -> Result<Self, TradespecError> {
        let url = ctx.config.endpoints.eventbus_url()?;
        let bus = EventBus::open(&url, BusOptions::from_config(&ctx.config.bus))?;

        let subscription = async {
            bus.ready(ctx.config.bus.open_timeout()).await?;
            bus.subscribe(channel).await
        }
        .await;
        let subscription = match subscription {
            Ok(subscription) => subscription,
            Err(e) => {
                bus.close().await;
                return Err(e.into());
            }
        };

        let buffer = EventBuffer::new(channel);
        let cancel = ctx.cancel.child_token();
        let collector = SubscriptionCollector::new(subscription, buffer.clone()).spawn(cancel.clone());
        info!(endpoint = bus.endpoint(), channel, "event session opened");

        Ok(Self {
            bus,
            buffer,
            cancel,
            collector,
        })
    }

    /// Poll until at least `min` payloads are buffered, then snapshot them.
    async fn collect(
        &self,
        ctx: &ScenarioContext,
        label: &str,
        min: usize,
    ) -> Result<Vec<Value>, TradespecError> {
        let condition = format!("more than {} {label} buffered", min.saturating_sub(1));
        let descriptor = PollDescriptor::from_config(condition, &ctx.config.polling)?;
        let ready = poll_until(&descriptor, || {
            self.buffer
                .inspect(|items| (items.len() >= min).then(|| items.to_vec()))
        })
        .await?;

        debug!(
            channel = self.buffer.name(),
            count = ready.value.len(),
            attempts = ready.attempts,
            "buffer condition met"
        );
        Ok(ready.value)
    }

    async fn shutdown(self) -> CollectorStats {
        self.cancel.cancel();
        let stats = self.collector.await.unwrap_or_default();
        self.bus.close().await;
        info!(
            channel = self.buffer.name(),
            received = stats.received,
            dropped = stats.dropped,
            "event session closed"
        );
        stats
    }
}
