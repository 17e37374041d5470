//! Command-line help text with usage examples and stage guidance
//!
//! `-h` is taken by `--host`, so this text is only reachable through
//! `--help` and is also printed after argument errors.

use colored::*;

/// Help text renderer for the `probe` binary
pub struct HelpSystem {
    platform: String,
}

impl HelpSystem {
    pub fn new() -> Self {
        Self {
            platform: std::env::consts::OS.to_string(),
        }
    }

    /// Full help: header, usage, options, stages, examples and notes
    pub fn display_main_help(&self, use_colors: bool) -> String {
        let mut help = String::new();

        help.push_str(&self.format_header(use_colors));
        help.push('\n');
        help.push_str(&self.format_usage_section(use_colors));
        help.push('\n');
        help.push_str(&self.format_options_section(use_colors));
        help.push('\n');
        help.push_str(&self.format_stages_section(use_colors));
        help.push('\n');
        help.push_str(&self.format_examples_section(use_colors));
        help.push('\n');
        help.push_str(&self.format_footer(use_colors));

        help
    }

    /// Usage lines only, printed when the host is missing
    pub fn display_usage(&self, use_colors: bool) -> String {
        self.format_usage_section(use_colors)
    }

    fn format_header(&self, use_colors: bool) -> String {
        let title = "Host Probe";
        let subtitle = "Concurrent reachability, DNS, port, web and path diagnostics for one host";
        let version = env!("CARGO_PKG_VERSION");

        if use_colors {
            format!(
                "{}\n{}\nVersion: {} | Platform: {}\n",
                title.bright_cyan().bold(),
                subtitle.bright_blue(),
                version.green(),
                self.platform.yellow()
            )
        } else {
            format!(
                "{}\n{}\nVersion: {} | Platform: {}\n",
                title, subtitle, version, self.platform
            )
        }
    }

    fn format_usage_section(&self, use_colors: bool) -> String {
        let header = section_header("USAGE:", use_colors);

        let usage_patterns = [
            "probe -h <ADDRESS> [OPTIONS]",
            "probe --host <ADDRESS> [--ping-only | --dns-check --http-check --traceroute]",
            "probe --help",
        ];

        let mut usage = format!("{}\n", header);
        for pattern in usage_patterns {
            if use_colors {
                usage.push_str(&format!("  {}\n", pattern.bright_white()));
            } else {
                usage.push_str(&format!("  {}\n", pattern));
            }
        }

        usage
    }

    fn format_options_section(&self, use_colors: bool) -> String {
        let header = section_header("OPTIONS:", use_colors);

        let options = [
            OptionHelp {
                short: Some("h"),
                long: "host",
                value: "<ADDRESS>",
                description: "Hostname or IP address to diagnose (required)",
                example: Some("--host example.com"),
            },
            OptionHelp {
                short: Some("t"),
                long: "timeout",
                value: "<MS>",
                description: "Per-operation timeout in milliseconds (default 3000)",
                example: Some("-t 1500"),
            },
            OptionHelp {
                short: Some("p"),
                long: "ports",
                value: "<LIST>",
                description: "Ports and ranges to scan instead of the common set",
                example: Some("-p 22,80,443,8000-8010"),
            },
            OptionHelp {
                short: Some("v"),
                long: "verbose",
                value: "",
                description: "Show underlying error details",
                example: None,
            },
            OptionHelp {
                short: None,
                long: "ping-only",
                value: "",
                description: "Only check basic connectivity",
                example: None,
            },
            OptionHelp {
                short: None,
                long: "dns-check",
                value: "",
                description: "Run the DNS stage",
                example: None,
            },
            OptionHelp {
                short: None,
                long: "http-check",
                value: "",
                description: "Run the HTTP/HTTPS stage",
                example: None,
            },
            OptionHelp {
                short: None,
                long: "traceroute",
                value: "",
                description: "Run the path trace stage",
                example: None,
            },
            OptionHelp {
                short: None,
                long: "max-hops",
                value: "<N>",
                description: "Hop limit for the path trace (default 15)",
                example: None,
            },
            OptionHelp {
                short: None,
                long: "trace-timeout",
                value: "<SECS>",
                description: "Overall path trace deadline (default 30)",
                example: None,
            },
            OptionHelp {
                short: None,
                long: "json",
                value: "",
                description: "Print the report as JSON",
                example: None,
            },
            OptionHelp {
                short: None,
                long: "no-color",
                value: "",
                description: "Disable colored output",
                example: None,
            },
            OptionHelp {
                short: None,
                long: "debug",
                value: "",
                description: "Debug logging on stderr",
                example: None,
            },
            OptionHelp {
                short: None,
                long: "help",
                value: "",
                description: "Show this help",
                example: None,
            },
        ];

        let mut output = format!("{}\n", header);
        for option in &options {
            output.push_str(&option.format(use_colors));
            output.push('\n');
        }

        output
    }

    fn format_stages_section(&self, use_colors: bool) -> String {
        let header = section_header("STAGES:", use_colors);
        let trace_tool = if self.platform == "windows" { "tracert" } else { "traceroute" };

        let stages = [
            ("Connectivity", "ping, then TCP 80 and 443 if ping gets no answer".to_string()),
            ("DNS", "all A/AAAA records plus a best-effort reverse lookup".to_string()),
            ("Ports", "concurrent TCP connect scan with service names".to_string()),
            ("Web", "one GET over HTTP and HTTPS, redirects reported, not followed".to_string()),
            ("Trace", format!("{} output, or a TTL walk when it is unavailable", trace_tool)),
        ];

        let mut output = format!("{}\n", header);
        for (name, description) in stages {
            if use_colors {
                output.push_str(&format!("  {:<14}{}\n", name.bright_yellow(), description.white()));
            } else {
                output.push_str(&format!("  {:<14}{}\n", name, description));
            }
        }
        output.push_str("\n  Without stage flags every stage runs. With --dns-check, --http-check or\n");
        output.push_str("  --traceroute, connectivity plus the selected stages run; ports are\n");
        output.push_str("  scanned too when -p is given.\n");

        output
    }

    fn format_examples_section(&self, use_colors: bool) -> String {
        let header = section_header("EXAMPLES:", use_colors);

        let examples = [
            ExampleHelp {
                title: "Full diagnostic run",
                command: "probe -h example.com",
                description: "All stages with default ports and timeouts",
            },
            ExampleHelp {
                title: "Quick reachability check",
                command: "probe -h 192.168.1.1 --ping-only",
                description: "Connectivity stage only",
            },
            ExampleHelp {
                title: "Custom port scan",
                command: "probe -h example.com -p 22,80,443,8000-8010 -t 500",
                description: "Scan selected ports with a 500 ms timeout",
            },
            ExampleHelp {
                title: "Web and DNS with details",
                command: "probe -h example.com --http-check --dns-check -v",
                description: "Show the underlying error text for failed checks",
            },
            ExampleHelp {
                title: "Machine-readable output",
                command: "probe -h example.com --json",
                description: "Print the full report as JSON",
            },
        ];

        let mut output = format!("{}\n", header);
        for example in &examples {
            output.push_str(&example.format(use_colors));
            output.push('\n');
        }

        output
    }

    fn format_footer(&self, use_colors: bool) -> String {
        let header = section_header("NOTES:", use_colors);
        let mut footer = format!("{}\n", header);
        footer.push_str("  The trace stage needs traceroute (tracert on Windows) on PATH.\n");
        footer.push_str("  Logs go to stderr; the report goes to stdout.\n");
        footer.push_str("  The exit code is 0 whenever a run completes, whatever the stage outcomes.\n");
        footer
    }
}

impl Default for HelpSystem {
    fn default() -> Self {
        Self::new()
    }
}

fn section_header(title: &str, use_colors: bool) -> String {
    if use_colors {
        title.bright_green().bold().to_string()
    } else {
        title.to_string()
    }
}

/// Helper struct for formatting individual options
struct OptionHelp {
    short: Option<&'static str>,
    long: &'static str,
    value: &'static str,
    description: &'static str,
    example: Option<&'static str>,
}

impl OptionHelp {
    fn format(&self, use_colors: bool) -> String {
        let mut option_str = String::new();

        if let Some(short) = self.short {
            if use_colors {
                option_str.push_str(&format!("  {}, ", format!("-{}", short).bright_cyan()));
            } else {
                option_str.push_str(&format!("  -{}, ", short));
            }
        } else {
            option_str.push_str("      ");
        }

        let long_with_value = if self.value.is_empty() {
            format!("--{}", self.long)
        } else {
            format!("--{} {}", self.long, self.value)
        };

        if use_colors {
            option_str.push_str(&format!(
                "{:<26} {}",
                long_with_value.bright_cyan(),
                self.description.white()
            ));
        } else {
            option_str.push_str(&format!("{:<26} {}", long_with_value, self.description));
        }

        if let Some(example) = self.example {
            if use_colors {
                option_str.push_str(&format!(
                    "\n{}{}",
                    " ".repeat(32),
                    format!("Example: {}", example).bright_blue().italic()
                ));
            } else {
                option_str.push_str(&format!("\n{}Example: {}", " ".repeat(32), example));
            }
        }

        option_str
    }
}

/// Helper struct for formatting examples
struct ExampleHelp {
    title: &'static str,
    command: &'static str,
    description: &'static str,
}

impl ExampleHelp {
    fn format(&self, use_colors: bool) -> String {
        if use_colors {
            format!(
                "  {}:\n    {}\n    {}\n",
                self.title.bright_yellow().bold(),
                self.command.bright_white(),
                self.description.bright_blue().italic()
            )
        } else {
            format!("  {}:\n    {}\n    {}\n", self.title, self.command, self.description)
        }
    }
}
