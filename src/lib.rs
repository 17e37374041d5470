//! Host Probe
//!
//! A concurrent host diagnostic engine. Given a hostname or address it checks
//! reachability, resolves DNS, scans well-known ports, validates web endpoints
//! and traces the network path, returning a structured per-stage report.

pub mod catalog;
pub mod cli;
pub mod client;
pub mod config;
pub mod connectivity;
pub mod diagnostics;
pub mod dns;
pub mod error;
pub mod logging;
pub mod models;
pub mod output;
pub mod probe;
pub mod scanner;
pub mod trace;

// Re-export commonly used types
pub use catalog::ServiceCatalog;
pub use diagnostics::DiagnosticPipeline;
pub use error::{AppError, Result};
pub use models::{DiagnosticReport, ProbeConfiguration, StageReport, StageSelection, StageStatus};

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_TIMEOUT_MS: u64 = 3000;
    pub const DEFAULT_PORTS: &[u16] = &[
        21, 22, 23, 25, 53, 80, 110, 143, 443, 465, 587, 993, 995, 3389,
    ];
    pub const DEFAULT_MAX_HOPS: u32 = 15;
    pub const DEFAULT_TRACE_TIMEOUT: Duration = Duration::from_secs(30);

    /// Ports tried, in order, when the reachability primitive reports the host down
    pub const CONNECTIVITY_FALLBACK_PORTS: &[u16] = &[80, 443];

    /// TTL values walked by the manual trace fallback
    pub const FALLBACK_MAX_TTL: u8 = 10;
    pub const FALLBACK_PROBE_TIMEOUT: Duration = Duration::from_millis(1000);

    pub const DEFAULT_ENABLE_COLOR: bool = true;

    /// Upper bound on concurrent connection attempts during a port scan
    pub fn max_scan_workers() -> usize {
        (num_cpus::get() * 32).clamp(16, 256)
    }
}
