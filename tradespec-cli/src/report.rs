//! Per-check results and the run report
//!
//! Every check outcome is logged and counted in
//! `tradespec_checks_passed_total` / `tradespec_checks_failed_total`
//! labelled with the suite slug.

use std::fmt::Display;
use std::io::Write;
use std::time::Duration;

use colored::Colorize;
use metrics::counter;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{info, warn};

use tradespec_core::metrics as m;

use crate::output::Render;
use crate::suite::SuiteId;

/// Outcome of one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Passed,
    Failed,
    /// Not evaluated because a check it depends on failed.
    Skipped,
}

/// One named check inside a suite.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    /// Failure message (expected vs actual) or skip reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub duration_ms: u64,
}

/// All checks of one suite, in evaluation order.
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub suite: SuiteId,
    pub title: &'static str,
    pub checks: Vec<CheckResult>,
}

impl SuiteReport {
    pub fn new(suite: SuiteId) -> Self {
        Self {
            suite,
            title: suite.title(),
            checks: Vec::new(),
        }
    }

    /// Record the outcome of a check started at `started`.
    ///
    /// Returns the success value so that dependent checks can use it.
    pub fn record<T, E: Display>(
        &mut self,
        name: &str,
        started: Instant,
        result: Result<T, E>,
    ) -> Option<T> {
        let duration_ms = started.elapsed().as_millis() as u64;
        match result {
            Ok(value) => {
                counter!(m::CHECKS_PASSED_TOTAL, m::LABEL_SUITE => self.suite.slug()).increment(1);
                info!(suite = self.suite.slug(), check = name, duration_ms, "check passed");
                self.push(name, CheckStatus::Passed, None, duration_ms);
                Some(value)
            }
            Err(e) => {
                let detail = e.to_string();
                counter!(m::CHECKS_FAILED_TOTAL, m::LABEL_SUITE => self.suite.slug()).increment(1);
                warn!(
                    suite = self.suite.slug(),
                    check = name,
                    duration_ms,
                    error = detail.as_str(),
                    "check failed"
                );
                self.push(name, CheckStatus::Failed, Some(detail), duration_ms);
                None
            }
        }
    }

    /// Record a check that was not evaluated.
    pub fn skip(&mut self, name: &str, reason: impl Into<String>) {
        let reason = reason.into();
        info!(suite = self.suite.slug(), check = name, reason = reason.as_str(), "check skipped");
        self.push(name, CheckStatus::Skipped, Some(reason), 0);
    }

    /// True when no check failed.
    pub fn passed(&self) -> bool {
        self.count(CheckStatus::Failed) == 0
    }

    pub fn count(&self, status: CheckStatus) -> usize {
        self.checks.iter().filter(|c| c.status == status).count()
    }

    fn push(&mut self, name: &str, status: CheckStatus, detail: Option<String>, duration_ms: u64) {
        self.checks.push(CheckResult {
            name: name.to_owned(),
            status,
            detail,
            duration_ms,
        });
    }
}

/// Result of `tradespec run`.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub suites: Vec<SuiteReport>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
}

impl RunReport {
    pub fn new(suites: Vec<SuiteReport>, elapsed: Duration) -> Self {
        let sum = |status| suites.iter().map(|s| s.count(status)).sum::<usize>();
        let passed = sum(CheckStatus::Passed);
        let failed = sum(CheckStatus::Failed);
        let skipped = sum(CheckStatus::Skipped);
        Self {
            total: passed + failed + skipped,
            passed,
            failed,
            skipped,
            duration_ms: elapsed.as_millis() as u64,
            suites,
        }
    }

    /// True when every suite passed.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

impl Render for RunReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        for suite in &self.suites {
            let marker = if suite.passed() {
                "PASS".green().bold()
            } else {
                "FAIL".red().bold()
            };
            writeln!(w, "{} {} ({})", marker, suite.title.bold(), suite.suite)?;

            for check in &suite.checks {
                match check.status {
                    CheckStatus::Passed => {
                        writeln!(w, "  {} {} ({} ms)", "✓".green(), check.name, check.duration_ms)?;
                    }
                    CheckStatus::Failed => {
                        writeln!(w, "  {} {} ({} ms)", "✗".red(), check.name, check.duration_ms)?;
                        if let Some(ref detail) = check.detail {
                            writeln!(w, "      {}", detail.red())?;
                        }
                    }
                    CheckStatus::Skipped => {
                        writeln!(w, "  {} {}", "-".yellow(), check.name.dimmed())?;
                        if let Some(ref detail) = check.detail {
                            writeln!(w, "      skipped: {}", detail)?;
                        }
                    }
                }
            }
            writeln!(w)?;
        }

        let summary = format!(
            "{} passed, {} failed, {} skipped ({} checks) in {} ms",
            self.passed, self.failed, self.skipped, self.total, self.duration_ms
        );
        if self.is_success() {
            writeln!(w, "{}", summary.green())?;
        } else {
            writeln!(w, "{}", summary.red())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tradespec_core::error::AssertionFailure;

    use super::*;

    fn sample_suite() -> SuiteReport {
        let mut suite = SuiteReport::new(SuiteId::Discovery);
        let started = Instant::now();
        let value = suite.record("returns 200 OK", started, Ok::<_, AssertionFailure>(5_usize));
        assert_eq!(value, Some(5));
        let none: Option<()> = suite.record(
            "returns 5 records",
            started,
            Err(AssertionFailure::new("discovery body length", "5", "4")),
        );
        assert!(none.is_none());
        suite.skip("every record is UP", "record count check failed");
        suite
    }

    #[test]
    fn suite_counts_each_status() {
        let suite = sample_suite();
        assert_eq!(suite.count(CheckStatus::Passed), 1);
        assert_eq!(suite.count(CheckStatus::Failed), 1);
        assert_eq!(suite.count(CheckStatus::Skipped), 1);
        assert!(!suite.passed());
        assert_eq!(
            suite.checks[1].detail.as_deref(),
            Some("discovery body length: expected 5, got 4")
        );
    }

    #[test]
    fn run_report_totals() {
        let mut ok = SuiteReport::new(SuiteId::Dashboard);
        ok.record("returns 200 OK", Instant::now(), Ok::<_, AssertionFailure>(()));
        let report = RunReport::new(vec![ok, sample_suite()], Duration::from_millis(1500));

        assert_eq!(report.total, 4);
        assert_eq!(report.passed, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.duration_ms, 1500);
        assert!(!report.is_success());
    }

    #[test]
    fn run_report_text_lists_failures() {
        colored::control::set_override(false);
        let report = RunReport::new(vec![sample_suite()], Duration::from_millis(10));
        let mut out = Vec::new();
        report.render_text(&mut out).expect("render");
        let text = String::from_utf8(out).expect("utf8");

        assert!(text.contains("FAIL Service Discovery Endpoint (discovery)"));
        assert!(text.contains("✓ returns 200 OK"));
        assert!(text.contains("✗ returns 5 records"));
        assert!(text.contains("discovery body length: expected 5, got 4"));
        assert!(text.contains("skipped: record count check failed"));
        assert!(text.contains("1 passed, 1 failed, 1 skipped (3 checks)"));
    }

    #[test]
    fn run_report_json_shape() {
        let report = RunReport::new(vec![sample_suite()], Duration::from_millis(10));
        let json = serde_json::to_value(&report).expect("serialize");
        assert_eq!(json["failed"], 1);
        assert_eq!(json["suites"][0]["suite"], "discovery");
        assert_eq!(json["suites"][0]["checks"][1]["status"], "failed");
        assert!(json["suites"][0]["checks"][0].get("detail").is_none());
    }
}
