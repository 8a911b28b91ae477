//! E2E tests for the tradespec CLI.
//!
//! Suites run against mock services: axum routers stand in for the quote,
//! audit and dashboard HTTP endpoints, and `MockBridge` stands in for the
//! event bus bridge.
//!
//! # Test Structure
//!
//! - `helpers/` -- Mock services, payload fixtures, config builder
//! - `scenarios/` -- Test files organized by suite family
//!
//! # Running
//!
//! ```bash
//! cargo test -p tradespec-cli --test e2e
//! ```

mod helpers;
mod scenarios;
