//! E2E test scenarios.

mod event_suites;
mod full_run;
mod rest_suites;
