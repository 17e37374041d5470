//! Configuration parsing from CLI arguments

use crate::{
    cli::Cli,
    config::ports::parse_port_list,
    defaults,
    error::Result,
    models::{ProbeConfiguration, StageSelection},
};

/// Turns parsed CLI arguments into a validated `ProbeConfiguration`
pub struct ConfigParser {
    cli: Cli,
}

impl ConfigParser {
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Parse and build the complete configuration
    pub fn parse(&self) -> Result<ProbeConfiguration> {
        let mut config = ProbeConfiguration::new(self.cli.host().unwrap_or_default());

        self.apply_cli_overrides(&mut config)?;
        config.validate()?;

        Ok(config)
    }

    fn apply_cli_overrides(&self, config: &mut ProbeConfiguration) -> Result<()> {
        config.timeout_ms = self.cli.timeout;
        config.verbose = self.cli.verbose;
        config.debug = self.cli.debug;
        config.max_hops = self.cli.max_hops;
        config.trace_timeout_secs = self.cli.trace_timeout;
        config.enable_color = self.cli.use_colors();

        config.ports = match self.cli.ports {
            Some(ref list) => parse_port_list(list)?,
            None => defaults::DEFAULT_PORTS.to_vec(),
        };

        config.stages = self.stage_selection();
        Ok(())
    }

    /// No toggle: everything. `--ping-only`: connectivity. Other toggles:
    /// connectivity plus the chosen stages, plus ports when `-p` was given.
    fn stage_selection(&self) -> StageSelection {
        let cli = &self.cli;
        if cli.ping_only {
            return StageSelection::ping_only();
        }
        if !cli.has_stage_toggles() {
            return StageSelection::all();
        }

        StageSelection {
            connectivity: true,
            dns: cli.dns_check,
            ports: cli.ports.is_some(),
            web: cli.http_check,
            trace: cli.traceroute,
        }
    }
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<ProbeConfiguration> {
    ConfigParser::new(cli).parse()
}

/// Display configuration summary for debug purposes
pub fn display_config_summary(config: &ProbeConfiguration) -> String {
    let stages = &config.stages;
    let enabled: Vec<&str> = [
        (stages.connectivity, "connectivity"),
        (stages.dns, "dns"),
        (stages.ports, "ports"),
        (stages.web, "web"),
        (stages.trace, "trace"),
    ]
    .into_iter()
    .filter_map(|(on, name)| on.then_some(name))
    .collect();

    let mut summary = Vec::new();
    summary.push(format!("Target: {}", config.host()));
    summary.push(format!("Stages: {}", enabled.join(", ")));
    summary.push(format!("Ports: {}", config.ports.len()));
    summary.push(format!("Timeout: {}ms", config.timeout_ms));
    summary.push(format!("Max hops: {}", config.max_hops));
    summary.push(format!("Trace timeout: {}s", config.trace_timeout_secs));
    summary.push(format!("Color Output: {}", config.enable_color));
    summary.push(format!("Verbose: {}", config.verbose));
    summary.push(format!("Debug: {}", config.debug));

    summary.join("\n")
}
