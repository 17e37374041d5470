//! Structured logging for the probe engine
//!
//! This module provides:
//! - Leveled, structured log entries with arbitrary JSON fields
//! - Console and JSON output formats
//! - Correlation IDs that tie the log lines of one run together
//! - A probe-specific logger for stage, port and trace process events
//!
//! Every entry is written to stderr so stdout carries only the report.

use crate::error::{AppError, Result};
use crate::models::{ProbeConfiguration, Stage, StageStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Log level enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    /// Trace level - most detailed
    Trace = 0,
    /// Debug level - detailed information for debugging
    Debug = 1,
    /// Info level - general progress information
    Info = 2,
    /// Warning level - degraded but recoverable situations
    Warn = 3,
    /// Error level - a stage failed but the run continues
    Error = 4,
}

impl LogLevel {
    /// Get log level name as string
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    /// Get ANSI color code for console output
    pub fn color_code(&self) -> &'static str {
        match self {
            LogLevel::Trace => "\x1b[37m",
            LogLevel::Debug => "\x1b[36m",
            LogLevel::Info => "\x1b[32m",
            LogLevel::Warn => "\x1b[33m",
            LogLevel::Error => "\x1b[31m",
        }
    }

    /// Reset ANSI color code
    pub fn reset_code() -> &'static str {
        "\x1b[0m"
    }
}

impl std::str::FromStr for LogLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "TRACE" => Ok(LogLevel::Trace),
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            _ => Err(AppError::parse(format!("Invalid log level: {}", s))),
        }
    }
}

/// Log entry structure for structured logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    /// Logger name/component
    pub logger: String,
    /// Correlation ID for tracking related events
    pub correlation_id: Option<String>,
    /// Additional structured fields
    pub fields: HashMap<String, serde_json::Value>,
    pub location: Option<LogLocation>,
}

/// Source code location information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogLocation {
    pub file: String,
    pub line: u32,
    pub module: Option<String>,
}

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogFormat {
    /// Human-readable console format
    Console,
    /// JSON format for structured logging
    Json,
}

/// Shared logging context for correlation
#[derive(Debug, Default)]
struct LogContext {
    /// Correlation ID of the current run
    run_id: Option<String>,
    context_fields: HashMap<String, serde_json::Value>,
}

/// Logger implementation with multiple output formats
pub struct Logger {
    min_level: LogLevel,
    use_color: bool,
    include_location: bool,
    format: LogFormat,
    name: String,
    context: Arc<RwLock<LogContext>>,
}

impl Logger {
    /// Create a logger whose verbosity follows the probe configuration
    pub fn with_config(name: String, config: &ProbeConfiguration) -> Self {
        let min_level = if config.debug {
            LogLevel::Debug
        } else if config.verbose {
            LogLevel::Info
        } else {
            LogLevel::Warn
        };

        Self {
            min_level,
            use_color: config.enable_color,
            include_location: config.debug,
            format: if config.debug { LogFormat::Json } else { LogFormat::Console },
            name,
            context: Arc::new(RwLock::new(LogContext::default())),
        }
    }

    /// Attach a run ID to every subsequent entry
    pub async fn set_run_id(&self, run_id: String) {
        let mut context = self.context.write().await;
        context.run_id = Some(run_id);
    }

    /// Add context field for all subsequent log entries
    pub async fn add_context_field<T: Serialize>(&self, key: String, value: T) {
        if let Ok(json_value) = serde_json::to_value(value) {
            let mut context = self.context.write().await;
            context.context_fields.insert(key, json_value);
        }
    }

    /// Create a log entry builder
    pub fn log(&self, level: LogLevel, message: &str) -> LogEntryBuilder<'_> {
        LogEntryBuilder::new(self, level, message.to_string())
    }

    pub fn trace(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Trace, message)
    }

    pub fn debug(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Debug, message)
    }

    pub fn info(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Info, message)
    }

    pub fn warn(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Warn, message)
    }

    pub fn error(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Error, message)
    }

    /// Check if a log level would be output
    pub fn would_log(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    async fn write_entry(&self, mut entry: LogEntry) {
        if !self.would_log(entry.level) {
            return;
        }

        let context = self.context.read().await;
        if entry.correlation_id.is_none() {
            entry.correlation_id = context.run_id.clone();
        }
        for (key, value) in &context.context_fields {
            entry.fields.insert(key.clone(), value.clone());
        }
        drop(context);

        let output = self.render(&entry);
        let _ = writeln!(io::stderr(), "{}", output);
    }

    fn render(&self, entry: &LogEntry) -> String {
        match self.format {
            LogFormat::Console => self.format_console(entry),
            LogFormat::Json => self.format_json(entry),
        }
    }

    fn format_console(&self, entry: &LogEntry) -> String {
        let timestamp = entry.timestamp.format("%Y-%m-%d %H:%M:%S%.3f");
        let level_str = entry.level.as_str();

        let formatted_level = if self.use_color {
            format!("{}{:>5}{}", entry.level.color_code(), level_str, LogLevel::reset_code())
        } else {
            format!("{:>5}", level_str)
        };

        let mut output = format!("{} {} [{}] {}", timestamp, formatted_level, entry.logger, entry.message);

        if let Some(correlation_id) = &entry.correlation_id {
            let short = correlation_id.get(..8).unwrap_or(correlation_id);
            output.push_str(&format!(" [{}]", short));
        }

        if !entry.fields.is_empty() {
            let mut fields: Vec<String> = entry
                .fields
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            fields.sort();
            output.push_str(&format!(" {{{}}}", fields.join(", ")));
        }

        if self.include_location {
            if let Some(location) = &entry.location {
                output.push_str(&format!(" @ {}:{}", location.file, location.line));
            }
        }

        output
    }

    fn format_json(&self, entry: &LogEntry) -> String {
        match serde_json::to_string(entry) {
            Ok(json) => json,
            Err(_) => format!("{{\"error\": \"Failed to serialize log entry\", \"message\": \"{}\"}}", entry.message),
        }
    }
}

/// Builder pattern for creating log entries
pub struct LogEntryBuilder<'a> {
    logger: &'a Logger,
    entry: LogEntry,
}

impl<'a> LogEntryBuilder<'a> {
    fn new(logger: &'a Logger, level: LogLevel, message: String) -> Self {
        Self {
            logger,
            entry: LogEntry {
                timestamp: Utc::now(),
                level,
                message,
                logger: logger.name.clone(),
                correlation_id: None,
                fields: HashMap::new(),
                location: None,
            },
        }
    }

    pub fn correlation_id(mut self, id: &str) -> Self {
        self.entry.correlation_id = Some(id.to_string());
        self
    }

    /// Add a structured field
    pub fn field<T: Serialize>(mut self, key: &str, value: T) -> Self {
        if let Ok(json_value) = serde_json::to_value(value) {
            self.entry.fields.insert(key.to_string(), json_value);
        }
        self
    }

    pub fn location(mut self, file: &str, line: u32, module: Option<&str>) -> Self {
        self.entry.location = Some(LogLocation {
            file: file.to_string(),
            line,
            module: module.map(String::from),
        });
        self
    }

    /// Add error information
    pub fn error_info(self, error: &AppError) -> Self {
        self.field("error_category", error.category())
            .field("error_recoverable", error.is_recoverable())
    }

    /// Finalize and write the log entry
    pub async fn log(self) {
        self.logger.write_entry(self.entry).await;
    }
}

/// Logger for pipeline stage and probe events
pub struct ProbeLogger {
    logger: Logger,
}

impl ProbeLogger {
    pub fn new(config: &ProbeConfiguration) -> Self {
        Self {
            logger: Logger::with_config("PROBE".to_string(), config),
        }
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Tag every subsequent entry with the run ID
    pub async fn begin_run(&self, run_id: &str, target: &str) {
        self.logger.set_run_id(run_id.to_string()).await;
        self.logger.add_context_field("target".to_string(), target).await;
        self.logger
            .info(&format!("Starting diagnostic run for {}", target))
            .log()
            .await;
    }

    pub async fn log_stage_start(&self, stage: Stage) {
        self.logger
            .debug(&format!("Stage {} started", stage))
            .field("stage", stage.name())
            .log()
            .await;
    }

    pub async fn log_stage_end(&self, stage: Stage, status: StageStatus, elapsed_ms: u64, error: Option<&str>) {
        let level = match status {
            StageStatus::Success => LogLevel::Info,
            StageStatus::Partial => LogLevel::Warn,
            StageStatus::Failed => LogLevel::Error,
        };

        let mut builder = self
            .logger
            .log(level, &format!("Stage {} finished: {:?}", stage, status))
            .field("stage", stage.name())
            .field("elapsed_ms", elapsed_ms);
        if let Some(error) = error {
            builder = builder.field("error", error);
        }
        builder.log().await;
    }

    pub async fn log_port_result(&self, port: u16, service: &str, open: bool) {
        self.logger
            .debug(&format!("Port {} ({}) {}", port, service, if open { "open" } else { "closed/filtered" }))
            .field("port", port)
            .field("open", open)
            .log()
            .await;
    }

    pub async fn log_trace_event(&self, command: &str, event: &str) {
        self.logger
            .debug(&format!("Trace process {}: {}", event, command))
            .field("command", command)
            .field("event", event)
            .log()
            .await;
    }

    pub async fn log_error(&self, error: &AppError, context: Option<&str>) {
        let message = match context {
            Some(context) => format!("{}: {}", context, error),
            None => error.to_string(),
        };
        self.logger.error(&message).error_info(error).log().await;
    }
}

/// Correlation ID for a new run
pub fn new_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)*) => {
        $logger.debug(&format!($($arg)*))
            .location(file!(), line!(), Some(module_path!()))
            .log()
            .await
    };
}

#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($arg:tt)*) => {
        $logger.warn(&format!($($arg)*))
            .location(file!(), line!(), Some(module_path!()))
            .log()
            .await
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(LogLevel::from_str("DEBUG").unwrap(), LogLevel::Debug);
        assert_eq!(LogLevel::from_str("info").unwrap(), LogLevel::Info);
        assert_eq!(LogLevel::from_str("warning").unwrap(), LogLevel::Warn);
        assert!(LogLevel::from_str("invalid").is_err());
    }

    fn plain_logger(name: &str) -> Logger {
        let mut config = ProbeConfiguration::new("example.com");
        config.enable_color = false;
        Logger::with_config(name.to_string(), &config)
    }

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Trace < LogLevel::Debug);
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Error);
    }

    #[test]
    fn test_level_follows_configuration() {
        let mut config = ProbeConfiguration::new("example.com");
        assert_eq!(Logger::with_config("T".into(), &config).min_level, LogLevel::Warn);

        config.verbose = true;
        assert_eq!(Logger::with_config("T".into(), &config).min_level, LogLevel::Info);

        config.debug = true;
        config.enable_color = false;
        let logger = Logger::with_config("T".into(), &config);
        assert_eq!(logger.min_level, LogLevel::Debug);
        assert_eq!(logger.format, LogFormat::Json);
        assert!(logger.include_location);
        assert!(!logger.use_color);
    }

    #[test]
    fn test_would_log() {
        let logger = plain_logger("TEST");

        assert!(!logger.would_log(LogLevel::Debug));
        assert!(!logger.would_log(LogLevel::Info));
        assert!(logger.would_log(LogLevel::Warn));
        assert!(logger.would_log(LogLevel::Error));
    }

    #[test]
    fn test_console_format_contents() {
        let logger = plain_logger("PROBE");
        let entry = logger
            .info("Port 22 open")
            .correlation_id("0123456789abcdef")
            .field("port", 22)
            .entry;

        let line = logger.format_console(&entry);
        assert!(line.contains(" INFO [PROBE] Port 22 open"));
        assert!(line.contains("[01234567]"));
        assert!(line.contains("port=22"));
    }

    #[test]
    fn test_json_format_round_trips() {
        let logger = plain_logger("PROBE");
        let entry = logger.warn("fallback used").field("stage", "trace").entry;
        let parsed: LogEntry = serde_json::from_str(&logger.format_json(&entry)).unwrap();
        assert_eq!(parsed.message, "fallback used");
        assert_eq!(parsed.level, LogLevel::Warn);
    }

    #[tokio::test]
    async fn test_run_id_is_attached() {
        let logger = plain_logger("TEST");
        logger.set_run_id("run-1".to_string()).await;

        let context = logger.context.read().await;
        assert_eq!(context.run_id.as_deref(), Some("run-1"));
    }

    #[tokio::test]
    async fn test_probe_logger_events_do_not_panic() {
        let mut config = ProbeConfiguration::new("example.com");
        config.enable_color = false;
        let probe_logger = ProbeLogger::new(&config);
        probe_logger.begin_run(&new_correlation_id(), "example.com").await;
        probe_logger.log_stage_start(Stage::Ports).await;
        probe_logger.log_stage_end(Stage::Ports, StageStatus::Partial, 5, Some("x")).await;
        probe_logger.log_port_result(22, "SSH", true).await;
        probe_logger.log_trace_event("traceroute", "spawned").await;
        probe_logger.log_error(&AppError::process("missing"), Some("trace")).await;
    }
}
