//! Suite catalogue

use std::fmt;

use clap::ValueEnum;
use serde::Serialize;

/// One suite of checks against the deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SuiteId {
    /// Dashboard root answers 200.
    Dashboard,
    /// Quote service REST endpoint.
    Quotes,
    /// Audit service REST endpoint.
    Audit,
    /// Audit operations exposed through the dashboard.
    Operations,
    /// Service discovery records.
    Discovery,
    /// Quotes published on the `market` channel.
    MarketEvents,
    /// Trades published on the `portfolio` channel and the portfolio service.
    Portfolio,
}

impl SuiteId {
    /// Every suite, in execution order.
    pub const ALL: [SuiteId; 7] = [
        SuiteId::Dashboard,
        SuiteId::Quotes,
        SuiteId::Audit,
        SuiteId::Operations,
        SuiteId::Discovery,
        SuiteId::MarketEvents,
        SuiteId::Portfolio,
    ];

    /// Identifier used on the command line and in JSON output.
    pub fn slug(self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Quotes => "quotes",
            Self::Audit => "audit",
            Self::Operations => "operations",
            Self::Discovery => "discovery",
            Self::MarketEvents => "market-events",
            Self::Portfolio => "portfolio",
        }
    }

    /// Human-readable title.
    pub fn title(self) -> &'static str {
        match self {
            Self::Dashboard => "Trader Dashboard Frontend",
            Self::Quotes => "Quote Service REST Endpoint",
            Self::Audit => "Audit Service REST Endpoint",
            Self::Operations => "Audit Operations Endpoint",
            Self::Discovery => "Service Discovery Endpoint",
            Self::MarketEvents => "Market Events",
            Self::Portfolio => "Portfolio Operations",
        }
    }

    /// What the suite exercises.
    pub fn target(self) -> &'static str {
        match self {
            Self::Dashboard => "GET <dashboard>",
            Self::Quotes => "GET <quote>",
            Self::Audit => "GET <audit>",
            Self::Operations => "GET <dashboard>/operations/",
            Self::Discovery => "GET <dashboard>/discovery/",
            Self::MarketEvents => "eventbus channel 'market'",
            Self::Portfolio => "eventbus channel 'portfolio' + service.portfolio",
        }
    }

    /// Whether the suite needs an event bus connection.
    pub fn uses_event_bus(self) -> bool {
        matches!(self, Self::MarketEvents | Self::Portfolio)
    }

    /// Resolve a suite filter: an empty selection means every suite.
    /// Duplicates are removed and execution order is preserved.
    pub fn select(requested: &[SuiteId]) -> Vec<SuiteId> {
        if requested.is_empty() {
            return Self::ALL.to_vec();
        }
        Self::ALL
            .into_iter()
            .filter(|s| requested.contains(s))
            .collect()
    }
}

impl fmt::Display for SuiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}
