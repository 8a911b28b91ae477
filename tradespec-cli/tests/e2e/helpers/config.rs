//! Test configuration builder.

#![allow(dead_code)]

use tradespec_core::config::TradespecConfig;

/// Builder for configs pointing at mock services with short timings.
pub struct TestConfigBuilder {
    config: TradespecConfig,
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        let mut config = TradespecConfig::default();
        config.polling.interval_ms = 50;
        config.polling.max_attempts = 100;
        config.bus.open_timeout_secs = 5;
        config.bus.request_timeout_secs = 5;
        config.http.timeout_secs = 5;
        Self { config }
    }

    pub fn quote_url(mut self, url: impl Into<String>) -> Self {
        self.config.endpoints.quote_url = url.into();
        self
    }

    pub fn audit_url(mut self, url: impl Into<String>) -> Self {
        self.config.endpoints.audit_url = url.into();
        self
    }

    pub fn dashboard_url(mut self, url: impl Into<String>) -> Self {
        self.config.endpoints.dashboard_url = url.into();
        self
    }

    pub fn bus_url(mut self, url: impl Into<String>) -> Self {
        self.config.endpoints.bus_url = Some(url.into());
        self
    }

    pub fn polling(mut self, interval_ms: u64, max_attempts: u32) -> Self {
        self.config.polling.interval_ms = interval_ms;
        self.config.polling.max_attempts = max_attempts;
        self
    }

    pub fn build(self) -> TradespecConfig {
        self.config
            .validate()
            .expect("test config should be valid");
        self.config
    }
}
