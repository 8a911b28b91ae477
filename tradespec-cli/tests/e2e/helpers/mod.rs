//! Shared E2E test helpers.

pub mod config;
pub mod fixtures;
pub mod services;
