//! Output formatting and display system
//!
//! Renders a `DiagnosticReport` either as sectioned terminal text (colored or
//! plain) or as JSON. Everything here goes to stdout; logs go to stderr.

mod formatter;

pub use formatter::{FormattingOptions, ReportFormatter};

use crate::{
    error::Result,
    models::{DiagnosticReport, ProbeConfiguration},
};

/// Output format selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Text,
    Json,
}

/// Output formatting factory for creating appropriate formatters
pub struct OutputFormatterFactory;

impl OutputFormatterFactory {
    /// Formatter matching the run configuration
    pub fn create_formatter(config: &ProbeConfiguration) -> ReportFormatter {
        ReportFormatter::new(FormattingOptions {
            enable_color: config.enable_color,
            verbose_mode: config.verbose,
            show_closed_ports: config.verbose,
        })
    }
}

/// Render `report` in `mode`
pub fn render(report: &DiagnosticReport, mode: OutputMode) -> Result<String> {
    let formatter = OutputFormatterFactory::create_formatter(&report.configuration);
    match mode {
        OutputMode::Text => Ok(formatter.format_report(report)),
        OutputMode::Json => formatter.format_json(report),
    }
}
