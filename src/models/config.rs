//! Probe configuration data model and validation

use crate::defaults;
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which diagnostic stages a run executes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSelection {
    pub connectivity: bool,
    pub dns: bool,
    pub ports: bool,
    pub web: bool,
    pub trace: bool,
}

impl Default for StageSelection {
    fn default() -> Self {
        Self::all()
    }
}

impl StageSelection {
    /// Every stage enabled
    pub fn all() -> Self {
        Self {
            connectivity: true,
            dns: true,
            ports: true,
            web: true,
            trace: true,
        }
    }

    /// Connectivity stage only
    pub fn ping_only() -> Self {
        Self {
            connectivity: true,
            dns: false,
            ports: false,
            web: false,
            trace: false,
        }
    }

    /// Whether no stage at all is enabled
    pub fn is_empty(&self) -> bool {
        !(self.connectivity || self.dns || self.ports || self.web || self.trace)
    }
}

/// Immutable input to a single diagnostic run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeConfiguration {
    /// Hostname or literal address to diagnose
    pub target: String,

    /// Per-operation timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Surface underlying error text in results and output
    #[serde(default)]
    pub verbose: bool,

    /// Enable debug logging
    #[serde(default)]
    pub debug: bool,

    /// Ports scanned by the port stage, in configured order
    #[serde(default = "default_ports")]
    pub ports: Vec<u16>,

    /// Stage toggles
    #[serde(default)]
    pub stages: StageSelection,

    /// Hop cap for the path tracer
    #[serde(default = "default_max_hops")]
    pub max_hops: u32,

    /// Overall deadline for the path tracer in seconds
    #[serde(default = "default_trace_timeout_secs")]
    pub trace_timeout_secs: u64,

    /// Enable colored terminal output
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,
}

impl Default for ProbeConfiguration {
    fn default() -> Self {
        Self {
            target: String::new(),
            timeout_ms: default_timeout_ms(),
            verbose: false,
            debug: false,
            ports: default_ports(),
            stages: StageSelection::default(),
            max_hops: default_max_hops(),
            trace_timeout_secs: default_trace_timeout_secs(),
            enable_color: default_enable_color(),
        }
    }
}

impl ProbeConfiguration {
    /// Create a configuration for `target` with default values
    pub fn new<S: Into<String>>(target: S) -> Self {
        Self {
            target: target.into(),
            ..Self::default()
        }
    }

    /// Per-operation timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Path tracer deadline as a Duration
    pub fn trace_timeout(&self) -> Duration {
        Duration::from_secs(self.trace_timeout_secs)
    }

    /// Target with surrounding whitespace removed
    pub fn host(&self) -> &str {
        self.target.trim()
    }

    /// Validate the configuration. Runs before any network I/O.
    pub fn validate(&self) -> Result<()> {
        if self.host().is_empty() {
            return Err(AppError::config("Target host is required"));
        }

        if self.host().chars().any(char::is_whitespace) {
            return Err(AppError::config(format!(
                "Invalid target host '{}': must not contain whitespace",
                self.host()
            )));
        }

        if self.timeout_ms == 0 {
            return Err(AppError::config("Timeout must be greater than 0 ms"));
        }

        if self.stages.ports && self.ports.is_empty() {
            return Err(AppError::config("Port set cannot be empty"));
        }

        if self.ports.contains(&0) {
            return Err(AppError::config("Port 0 is not a valid port"));
        }

        if self.max_hops == 0 {
            return Err(AppError::config("Max hops must be greater than 0"));
        }

        if self.trace_timeout_secs == 0 {
            return Err(AppError::config("Trace timeout must be greater than 0 seconds"));
        }

        if self.stages.is_empty() {
            return Err(AppError::config("At least one stage must be enabled"));
        }

        Ok(())
    }
}

fn default_timeout_ms() -> u64 {
    defaults::DEFAULT_TIMEOUT_MS
}

fn default_ports() -> Vec<u16> {
    defaults::DEFAULT_PORTS.to_vec()
}

fn default_max_hops() -> u32 {
    defaults::DEFAULT_MAX_HOPS
}

fn default_trace_timeout_secs() -> u64 {
    defaults::DEFAULT_TRACE_TIMEOUT.as_secs()
}

fn default_enable_color() -> bool {
    defaults::DEFAULT_ENABLE_COLOR
}
