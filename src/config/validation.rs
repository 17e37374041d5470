//! Configuration validation rules beyond the hard checks
//!
//! `ProbeConfiguration::validate` rejects unusable values. The rules here
//! flag values that are legal but likely to give misleading results.

use crate::{
    dns::parse_literal,
    error::Result,
    models::ProbeConfiguration,
};
use colored::*;
use std::net::IpAddr;

/// Timeout below which closed and filtered ports become hard to tell apart
const SHORT_TIMEOUT_MS: u64 = 200;
const LONG_TIMEOUT_MS: u64 = 30_000;
const LARGE_PORT_SET: usize = 1024;

/// Configuration validator with advisory rules
pub struct ConfigValidator;

impl ConfigValidator {
    /// Run the hard checks, then collect advisory warnings
    pub fn validate_comprehensive(config: &ProbeConfiguration) -> Result<Vec<ValidationWarning>> {
        config.validate()?;

        let mut warnings = Vec::new();
        warnings.extend(Self::validate_target(config));
        warnings.extend(Self::validate_timeouts(config));
        warnings.extend(Self::validate_port_set(config));
        Ok(warnings)
    }

    fn validate_target(config: &ProbeConfiguration) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if let Some(ip) = parse_literal(config.host()) {
            if is_local(&ip) {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Info,
                    format!("Target {} is a private or local address", ip),
                ));
            }
            if config.stages.web {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Info,
                    "Web checks against an IP address skip virtual hosting and certificate name checks"
                        .to_string(),
                ));
            }
        }

        warnings
    }

    fn validate_timeouts(config: &ProbeConfiguration) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if config.timeout_ms < SHORT_TIMEOUT_MS {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "Timeout of {}ms may report slow but open services as closed",
                    config.timeout_ms
                ),
            ));
        } else if config.timeout_ms > LONG_TIMEOUT_MS {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Info,
                format!("Long timeout of {}ms will slow down failure detection", config.timeout_ms),
            ));
        }

        if config.stages.trace {
            let per_hop_budget = config.trace_timeout_secs * 1000 / u64::from(config.max_hops);
            if per_hop_budget < 1000 {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Warning,
                    format!(
                        "Trace timeout of {}s for {} hops leaves under a second per hop",
                        config.trace_timeout_secs, config.max_hops
                    ),
                ));
            }
        }

        warnings
    }

    fn validate_port_set(config: &ProbeConfiguration) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();
        if !config.stages.ports {
            return warnings;
        }

        if config.ports.len() > LARGE_PORT_SET {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "Scanning {} ports may take a while and can trigger intrusion detection",
                    config.ports.len()
                ),
            ));
        }

        warnings
    }
}

fn is_local(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_private() || v4.is_loopback() || v4.is_link_local(),
        IpAddr::V6(v6) => v6.is_loopback() || (v6.segments()[0] & 0xfe00) == 0xfc00,
    }
}

/// Validation warning levels
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationLevel {
    Info,
    Warning,
}

impl ValidationLevel {
    /// Get display string for level
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
        }
    }

    /// Get color for terminal display
    pub fn color(&self) -> &'static str {
        match self {
            Self::Info => "blue",
            Self::Warning => "yellow",
        }
    }
}

/// Configuration validation warning
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub level: ValidationLevel,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(level: ValidationLevel, message: String) -> Self {
        Self { level, message }
    }

    /// Format warning for display
    pub fn format(&self, use_color: bool) -> String {
        let tag = format!("[{}]", self.level.as_str());
        if use_color {
            format!("{} {}", tag.color(self.level.color()), self.message)
        } else {
            format!("{} {}", tag, self.message)
        }
    }
}

/// Convenience function for comprehensive configuration validation
pub fn validate_config(config: &ProbeConfiguration) -> Result<Vec<ValidationWarning>> {
    ConfigValidator::validate_comprehensive(config)
}
