//! Command-line interface module with comprehensive help system

pub mod help;

pub use help::HelpSystem;

use crate::defaults;
use clap::Parser;

/// Host Probe - concurrent reachability, DNS, port, web and path diagnostics
///
/// `-h` selects the host, so help is only available as `--help`.
#[derive(Parser, Debug, Clone)]
#[command(name = "probe")]
#[command(version, about, long_about = None)]
#[command(disable_help_flag = true, disable_version_flag = true)]
pub struct Cli {
    /// Hostname or IP address to diagnose
    #[arg(short = 'h', long, value_name = "ADDRESS")]
    pub host: Option<String>,

    /// Per-operation timeout in milliseconds
    #[arg(short, long, value_name = "MS", value_parser = parse_timeout_ms, default_value_t = defaults::DEFAULT_TIMEOUT_MS)]
    pub timeout: u64,

    /// Include error details in the report
    #[arg(short, long)]
    pub verbose: bool,

    /// Ports to scan: comma-separated ports and ranges (22,80,8000-8010)
    #[arg(short, long, value_name = "LIST")]
    pub ports: Option<String>,

    /// Only check basic connectivity
    #[arg(long, conflicts_with_all = ["http_check", "dns_check", "traceroute"])]
    pub ping_only: bool,

    /// Check the HTTP and HTTPS endpoints
    #[arg(long)]
    pub http_check: bool,

    /// Resolve DNS records
    #[arg(long)]
    pub dns_check: bool,

    /// Trace the network path
    #[arg(long)]
    pub traceroute: bool,

    /// Hop limit for the path trace
    #[arg(long, value_name = "N", default_value_t = defaults::DEFAULT_MAX_HOPS, value_parser = clap::value_parser!(u32).range(1..=64))]
    pub max_hops: u32,

    /// Overall path trace deadline in seconds
    #[arg(long, value_name = "SECS", default_value_t = defaults::DEFAULT_TRACE_TIMEOUT.as_secs(), value_parser = clap::value_parser!(u64).range(1..=600))]
    pub trace_timeout: u64,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Enable debug logging on stderr
    #[arg(long)]
    pub debug: bool,

    /// Show help
    #[arg(long)]
    pub help: bool,
}

impl Cli {
    /// Trimmed host, `None` when absent or blank
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref().map(str::trim).filter(|h| !h.is_empty())
    }

    /// Whether any stage toggle was given
    pub fn has_stage_toggles(&self) -> bool {
        self.ping_only || self.http_check || self.dns_check || self.traceroute
    }

    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        if self.no_color || self.json {
            false
        } else {
            supports_color()
        }
    }

    /// Full help text
    pub fn display_help(&self) -> String {
        HelpSystem::new().display_main_help(self.use_colors())
    }
}

/// Parse a timeout in milliseconds
fn parse_timeout_ms(s: &str) -> Result<u64, String> {
    // Reject strings with leading + sign or other invalid formats
    if s.starts_with('+') || s.starts_with("0x") || s.starts_with("0X") {
        return Err(format!("Invalid timeout: {}", s));
    }

    s.parse::<u64>()
        .map_err(|_| format!("Invalid timeout: {}", s))
        .and_then(|ms| {
            if ms == 0 {
                Err("Timeout must be greater than 0".to_string())
            } else if ms > 600_000 {
                Err("Timeout cannot exceed 600000 ms".to_string())
            } else {
                Ok(ms)
            }
        })
}

/// Check if the terminal supports color output
fn supports_color() -> bool {
    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    #[cfg(target_os = "windows")]
    {
        if std::env::var("ANSICON").is_ok() || std::env::var("ConEmuANSI").is_ok() {
            return true;
        }
    }

    // Default to true on Unix-like systems, false on Windows
    #[cfg(unix)]
    {
        true
    }
    #[cfg(not(unix))]
    {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing_basic() {
        let cli = Cli::parse_from(["probe", "-h", "example.com", "-t", "1500"]);
        assert_eq!(cli.host(), Some("example.com"));
        assert_eq!(cli.timeout, 1500);
        assert!(!cli.verbose);
        assert!(!cli.has_stage_toggles());
        assert_eq!(cli.max_hops, 15);
        assert_eq!(cli.trace_timeout, 30);
    }

    #[test]
    fn test_cli_parsing_all_options() {
        let cli = Cli::parse_from([
            "probe",
            "--host", "10.0.0.1",
            "--timeout", "250",
            "--verbose",
            "--ports", "22,80,8000-8002",
            "--http-check",
            "--dns-check",
            "--traceroute",
            "--max-hops", "20",
            "--trace-timeout", "10",
            "--json",
            "--no-color",
            "--debug",
        ]);

        assert_eq!(cli.host(), Some("10.0.0.1"));
        assert_eq!(cli.timeout, 250);
        assert!(cli.verbose);
        assert_eq!(cli.ports.as_deref(), Some("22,80,8000-8002"));
        assert!(cli.http_check && cli.dns_check && cli.traceroute);
        assert!(!cli.ping_only);
        assert_eq!(cli.max_hops, 20);
        assert_eq!(cli.trace_timeout, 10);
        assert!(cli.json);
        assert!(cli.no_color);
        assert!(cli.debug);
        assert!(!cli.use_colors());
    }

    #[test]
    fn test_short_flags() {
        let cli = Cli::parse_from(["probe", "-h", "host.test", "-v", "-p", "443"]);
        assert!(cli.verbose);
        assert_eq!(cli.ports.as_deref(), Some("443"));
    }

    #[test]
    fn test_host_is_optional_at_parse_time() {
        let cli = Cli::parse_from(["probe"]);
        assert_eq!(cli.host(), None);

        let blank = Cli::parse_from(["probe", "--host", "  "]);
        assert_eq!(blank.host(), None);
    }

    #[test]
    fn test_long_help_flag_is_a_plain_switch() {
        let cli = Cli::parse_from(["probe", "--help"]);
        assert!(cli.help);
        assert!(cli.host.is_none());
    }

    #[test]
    fn test_ping_only_conflicts_with_other_toggles() {
        assert!(Cli::try_parse_from(["probe", "-h", "x", "--ping-only", "--dns-check"]).is_err());
        assert!(Cli::try_parse_from(["probe", "-h", "x", "--ping-only", "--traceroute"]).is_err());
        assert!(Cli::try_parse_from(["probe", "-h", "x", "--ping-only"]).is_ok());
    }

    #[test]
    fn test_unknown_flag_is_rejected() {
        assert!(Cli::try_parse_from(["probe", "-h", "x", "--bogus"]).is_err());
    }

    #[test]
    fn test_timeout_parsing() {
        assert_eq!(parse_timeout_ms("3000"), Ok(3000));
        assert_eq!(parse_timeout_ms("1"), Ok(1));
        assert!(parse_timeout_ms("0").is_err());
        assert!(parse_timeout_ms("+5").is_err());
        assert!(parse_timeout_ms("0x10").is_err());
        assert!(parse_timeout_ms("-1").is_err());
        assert!(parse_timeout_ms("abc").is_err());
        assert!(parse_timeout_ms("600001").is_err());
    }

    #[test]
    fn test_hop_and_trace_bounds() {
        assert!(Cli::try_parse_from(["probe", "-h", "x", "--max-hops", "0"]).is_err());
        assert!(Cli::try_parse_from(["probe", "-h", "x", "--max-hops", "65"]).is_err());
        assert!(Cli::try_parse_from(["probe", "-h", "x", "--trace-timeout", "0"]).is_err());
    }

    #[test]
    fn test_help_display() {
        let cli = Cli::parse_from(["probe", "--no-color"]);
        let help = cli.display_help();
        assert!(help.contains("USAGE:"));
        assert!(help.contains("--host"));
    }
}
