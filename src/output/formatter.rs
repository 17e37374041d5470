//! Sectioned report rendering
//!
//! One section per stage that ran, in pipeline order. Failed checks show a
//! short "Not available" label unless verbose output was requested, in which
//! case the underlying error text is printed instead.

use crate::{
    error::{AppError, Result},
    models::{
        ConnectivityResult, DiagnosticReport, DnsResult, PortScanResult, Stage, StageReport,
        StageStatus, TraceResult, WebOutcome, WebResult,
    },
};
use colored::*;
use std::fmt::Write as _;

const NOT_AVAILABLE: &str = "Not available";

/// Configuration options for formatting
#[derive(Debug, Clone)]
pub struct FormattingOptions {
    /// Enable colored output
    pub enable_color: bool,
    /// Show error details instead of short labels
    pub verbose_mode: bool,
    /// List closed ports as well as open ones
    pub show_closed_ports: bool,
}

impl Default for FormattingOptions {
    fn default() -> Self {
        Self {
            enable_color: true,
            verbose_mode: false,
            show_closed_ports: false,
        }
    }
}

/// Human-readable and JSON renderer for a `DiagnosticReport`
pub struct ReportFormatter {
    options: FormattingOptions,
}

impl ReportFormatter {
    pub fn new(options: FormattingOptions) -> Self {
        Self { options }
    }

    /// Full sectioned report
    pub fn format_report(&self, report: &DiagnosticReport) -> String {
        let mut out = String::new();

        out.push_str(&self.format_header(report));
        out.push('\n');

        if let Some(ref stage) = report.connectivity {
            out.push_str(&self.format_stage(Stage::Connectivity, stage, |f, r, o| f.write_connectivity(r, o)));
        }
        if let Some(ref stage) = report.dns {
            out.push_str(&self.format_stage(Stage::Dns, stage, |f, r, o| f.write_dns(r, o)));
        }
        if let Some(ref stage) = report.ports {
            out.push_str(&self.format_stage(Stage::Ports, stage, |f, r, o| f.write_ports(r, o)));
        }
        if let Some(ref stage) = report.web {
            out.push_str(&self.format_stage(Stage::Web, stage, |f, r, o| f.write_web(r, o)));
        }
        if let Some(ref stage) = report.trace {
            out.push_str(&self.format_stage(Stage::Trace, stage, |f, r, o| f.write_trace(r, o)));
        }

        out.push_str(&self.format_summary(report));
        out
    }

    /// Pretty-printed JSON
    pub fn format_json(&self, report: &DiagnosticReport) -> Result<String> {
        serde_json::to_string_pretty(report)
            .map_err(|e| AppError::internal(format!("Failed to serialize report: {}", e)))
    }

    fn format_header(&self, report: &DiagnosticReport) -> String {
        let title = format!("Diagnostic report for {}", report.target);
        let run_id = report.run_id.to_string();
        let short_id = run_id.get(..8).unwrap_or(&run_id);
        format!(
            "{}\nRun {} | started {}\n",
            self.paint(&title, |s| s.bright_cyan().bold()),
            short_id,
            report.started_at.format("%Y-%m-%d %H:%M:%S UTC")
        )
    }

    fn format_stage<T, F>(&self, stage: Stage, report: &StageReport<T>, body: F) -> String
    where
        F: Fn(&Self, &T, &mut String),
    {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} {} ({} ms)",
            self.paint(&format!("[{}]", stage), |s| s.bold()),
            self.status_label(report.status),
            report.elapsed_ms
        );

        match report.result {
            Some(ref result) => body(self, result, &mut out),
            None => {
                let _ = writeln!(out, "  {}", self.error_text(report.error.as_deref()));
            }
        }

        if report.result.is_some() && report.status != StageStatus::Success && self.options.verbose_mode {
            if let Some(ref reason) = report.error {
                let _ = writeln!(out, "  {}", self.paint(&format!("Note: {}", reason), |s| s.yellow()));
            }
        }

        out.push('\n');
        out
    }

    fn write_connectivity(&self, result: &ConnectivityResult, out: &mut String) {
        let _ = writeln!(out, "  Resolved address: {}", result.resolved_address);

        let reachability = match (result.reachable, result.fallback_port) {
            (true, Some(port)) => format!("yes (TCP port {})", port),
            (true, None) => "yes (ping)".to_string(),
            (false, _) => "no".to_string(),
        };
        let reachability = if result.reachable {
            self.paint(&reachability, |s| s.green())
        } else {
            self.paint(&reachability, |s| s.red())
        };
        let _ = writeln!(out, "  Reachable: {}", reachability);

        if let Some(latency) = result.latency_ms {
            let _ = writeln!(out, "  Latency: {} ms", latency);
        }
    }

    fn write_dns(&self, result: &DnsResult, out: &mut String) {
        let _ = writeln!(out, "  Addresses:");
        for record in &result.addresses {
            match record.canonical_name {
                Some(ref cname) => {
                    let _ = writeln!(out, "    {} (canonical name {})", record.address, cname);
                }
                None => {
                    let _ = writeln!(out, "    {}", record.address);
                }
            }
        }

        let reverse = match (&result.reverse_name, &result.reverse_error) {
            (Some(name), _) => name.clone(),
            (None, error) => self.error_text(error.as_deref()),
        };
        let _ = writeln!(out, "  Reverse name: {}", reverse);
    }

    fn write_ports(&self, result: &PortScanResult, out: &mut String) {
        let _ = writeln!(out, "  {:<7}{:<16}{}", "PORT", "SERVICE", "STATE");
        for entry in &result.entries {
            if !entry.is_open() && !self.options.show_closed_ports {
                continue;
            }
            let state = if entry.is_open() {
                self.paint("open", |s| s.green())
            } else {
                self.paint("closed/filtered", |s| s.dimmed())
            };
            let _ = writeln!(out, "  {:<7}{:<16}{}", entry.port, entry.service, state);
        }

        let open = if result.open_ports.is_empty() {
            "none".to_string()
        } else {
            result
                .open_ports
                .iter()
                .map(u16::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        };
        let _ = writeln!(
            out,
            "  Open ports: {} ({} of {} scanned)",
            open,
            result.open_count,
            result.entries.len()
        );
    }

    fn write_web(&self, result: &WebResult, out: &mut String) {
        for (protocol, outcome) in &result.per_protocol {
            match outcome {
                WebOutcome::Responded(response) => {
                    let status = response.status_code.to_string();
                    let status = if response.status_code < 400 {
                        self.paint(&status, |s| s.green())
                    } else {
                        self.paint(&status, |s| s.yellow())
                    };
                    let _ = write!(
                        out,
                        "  {:<6} {} {} ({} ms)",
                        format!("{}:", protocol),
                        status,
                        response.url,
                        response.elapsed_ms
                    );
                    if response.is_redirect() {
                        out.push_str(" redirect not followed");
                    }
                    out.push('\n');
                    if let Some(ref server) = response.server {
                        let _ = writeln!(out, "         Server: {}", server);
                    }
                    if let Some(ref content_type) = response.content_type {
                        let _ = writeln!(out, "         Content-Type: {}", content_type);
                    }
                }
                WebOutcome::Unavailable { detail } => {
                    let _ = writeln!(
                        out,
                        "  {:<6} {}",
                        format!("{}:", protocol),
                        self.error_text(detail.as_deref())
                    );
                }
            }
        }
    }

    fn write_trace(&self, result: &TraceResult, out: &mut String) {
        let _ = writeln!(out, "  Command: {}", result.command);

        if result.used_fallback {
            let _ = writeln!(
                out,
                "  {}",
                self.paint(
                    &format!("Trace tool unavailable, manual TTL walk ({} attempts)", result.attempts.len()),
                    |s| s.yellow()
                )
            );
            if self.options.verbose_mode {
                if let Some(ref error) = result.error {
                    let _ = writeln!(out, "  Cause: {}", error);
                }
            }
        }

        if result.hops.is_empty() {
            let _ = writeln!(out, "  No hops recorded");
        }
        for hop in &result.hops {
            let _ = writeln!(out, "  {}", hop.trim_end());
        }

        if result.timed_out {
            let _ = writeln!(out, "  {}", self.paint("Stopped at the deadline", |s| s.yellow()));
        } else if result.completed {
            let _ = writeln!(out, "  Trace complete");
        }
    }

    fn format_summary(&self, report: &DiagnosticReport) -> String {
        let mut success = 0;
        let mut partial = 0;
        let mut failed = 0;
        for stage in report.stages_run() {
            match report.stage_status(stage) {
                Some(StageStatus::Success) => success += 1,
                Some(StageStatus::Partial) => partial += 1,
                Some(StageStatus::Failed) => failed += 1,
                None => {}
            }
        }

        format!(
            "Summary: {} succeeded, {} partial, {} failed\n",
            success, partial, failed
        )
    }

    fn status_label(&self, status: StageStatus) -> String {
        match status {
            StageStatus::Success => self.paint("OK", |s| s.green().bold()),
            StageStatus::Partial => self.paint("PARTIAL", |s| s.yellow().bold()),
            StageStatus::Failed => self.paint("FAILED", |s| s.red().bold()),
        }
    }

    /// Underlying error text in verbose mode, the short label otherwise
    fn error_text(&self, error: Option<&str>) -> String {
        match error {
            Some(error) if self.options.verbose_mode => self.paint(error, |s| s.red()),
            _ => self.paint(NOT_AVAILABLE, |s| s.dimmed()),
        }
    }

    fn paint<F>(&self, text: &str, style: F) -> String
    where
        F: FnOnce(&str) -> ColoredString,
    {
        if self.options.enable_color {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }
}
