//! `tradespec list` command handler

use std::io::Write;

use colored::Colorize;
use serde::Serialize;

use crate::error::CliError;
use crate::output::{OutputWriter, Render};
use crate::suite::SuiteId;

/// Execute the `list` command.
pub fn execute(writer: &OutputWriter) -> Result<(), CliError> {
    writer.render(&SuiteList::all())
}

/// Catalogue of runnable suites.
#[derive(Serialize)]
pub struct SuiteList {
    pub suites: Vec<SuiteEntry>,
}

#[derive(Serialize)]
pub struct SuiteEntry {
    pub suite: SuiteId,
    pub title: &'static str,
    pub target: &'static str,
    pub event_bus: bool,
}

impl SuiteList {
    pub fn all() -> Self {
        let suites = SuiteId::ALL
            .into_iter()
            .map(|suite| SuiteEntry {
                suite,
                title: suite.title(),
                target: suite.target(),
                event_bus: suite.uses_event_bus(),
            })
            .collect();
        Self { suites }
    }
}

impl Render for SuiteList {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "{:<15} {:<30} {}", "SUITE", "TITLE", "TARGET")?;
        writeln!(w, "{}", "-".repeat(90))?;
        for entry in &self.suites {
            writeln!(
                w,
                "{:<15} {:<30} {}",
                entry.suite.slug().bold(),
                entry.title,
                entry.target
            )?;
        }
        Ok(())
    }
}
