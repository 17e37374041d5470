//! Diagnostic pipeline
//!
//! Runs the enabled stages strictly in order (connectivity, DNS, ports, web,
//! trace) and assembles their reports. Each stage runs behind a boundary
//! that turns errors and panics into a `Failed` stage report, so one broken
//! stage never stops the ones after it. Only configuration errors abort a run.

use crate::{
    client::WebProbe,
    connectivity::{ReachabilityProbe, SystemPing},
    defaults,
    dns::{Resolve, SystemResolver},
    error::{AppError, Result},
    log_debug, log_warn,
    logging::ProbeLogger,
    models::{
        ConnectivityResult, DiagnosticReport, DnsResult, PortScanResult, ProbeConfiguration, Stage,
        StageReport, TraceResult, WebProtocol, WebResult,
    },
    probe, scanner,
    trace::{PathTracer, TraceCommand},
};
use futures::FutureExt;
use std::any::Any;
use std::collections::BTreeMap;
use std::future::Future;
use std::net::IpAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Sequential stage runner
pub struct DiagnosticPipeline {
    resolver: Option<Arc<dyn Resolve>>,
    reachability: Arc<dyn ReachabilityProbe>,
    fallback_ports: Vec<u16>,
    trace_command: Option<TraceCommand>,
}

impl Default for DiagnosticPipeline {
    fn default() -> Self {
        Self {
            resolver: None,
            reachability: Arc::new(SystemPing::new()),
            fallback_ports: defaults::CONNECTIVITY_FALLBACK_PORTS.to_vec(),
            trace_command: None,
        }
    }
}

impl DiagnosticPipeline {
    /// Pipeline using the system resolver, `ping` and the platform trace tool
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn Resolve>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn with_reachability(mut self, reachability: Arc<dyn ReachabilityProbe>) -> Self {
        self.reachability = reachability;
        self
    }

    /// Ports tried in order when the reachability primitive reports the host down
    pub fn with_fallback_ports(mut self, ports: Vec<u16>) -> Self {
        self.fallback_ports = ports;
        self
    }

    /// Run `command` in the trace stage instead of the platform tool
    pub fn with_trace_command(mut self, command: TraceCommand) -> Self {
        self.trace_command = Some(command);
        self
    }

    /// Run every enabled stage against `config.target`.
    ///
    /// Fails only when the configuration is invalid; that check happens
    /// before any network activity.
    pub async fn run(&self, config: &ProbeConfiguration) -> Result<DiagnosticReport> {
        config.validate()?;

        let logger = ProbeLogger::new(config);
        let mut report = DiagnosticReport::new(config);
        logger.begin_run(&report.run_id.to_string(), config.host()).await;

        let resolver = self.resolver_for(config);
        let host = config.host();
        let timeout = config.timeout();

        if config.stages.connectivity {
            let stage = self.check_connectivity(&logger, resolver.as_ref(), host, timeout);
            report.connectivity = Some(run_stage(&logger, Stage::Connectivity, stage).await);
        }

        // Ports and trace go to the address connectivity settled on
        let resolved: Option<IpAddr> = report
            .connectivity
            .as_ref()
            .and_then(|s| s.result.as_ref())
            .map(|r| r.resolved_address);
        let address_target = resolved
            .map(|address| address.to_string())
            .unwrap_or_else(|| host.to_string());

        if config.stages.dns {
            let stage = lookup_dns(resolver.as_ref(), host, config.verbose);
            report.dns = Some(run_stage(&logger, Stage::Dns, stage).await);
        }

        if config.stages.ports {
            let stage = scan_ports(&logger, &address_target, &config.ports, timeout);
            report.ports = Some(run_stage(&logger, Stage::Ports, stage).await);
        }

        if config.stages.web {
            // Hostname, not address: virtual hosts and TLS SNI need it
            let stage = check_web(host, timeout, config.verbose);
            report.web = Some(run_stage(&logger, Stage::Web, stage).await);
        }

        if config.stages.trace {
            let stage = self.trace_path(&logger, resolver.clone(), &address_target, config);
            report.trace = Some(run_stage(&logger, Stage::Trace, stage).await);
        }

        Ok(report.finish())
    }

    fn resolver_for(&self, config: &ProbeConfiguration) -> Arc<dyn Resolve> {
        match &self.resolver {
            Some(resolver) => resolver.clone(),
            None => Arc::new(SystemResolver::new(config.timeout())),
        }
    }

    async fn check_connectivity(
        &self,
        logger: &ProbeLogger,
        resolver: &dyn Resolve,
        host: &str,
        timeout: Duration,
    ) -> Result<StageReport<ConnectivityResult>> {
        let address = resolver.resolve_first(host).await?;

        let start = Instant::now();
        if self.reachability.is_reachable(address, None, timeout).await {
            return Ok(StageReport::success(ConnectivityResult {
                resolved_address: address,
                reachable: true,
                latency_ms: Some(start.elapsed().as_millis() as u64),
                fallback_used: false,
                fallback_port: None,
            }));
        }

        log_warn!(
            logger.logger(),
            "{} did not answer the reachability check, trying TCP ports {:?}",
            address,
            self.fallback_ports
        );

        let address_host = address.to_string();
        for &port in &self.fallback_ports {
            if let Some(latency) = probe::try_connect_timed(&address_host, port, timeout).await {
                return Ok(StageReport::success(ConnectivityResult {
                    resolved_address: address,
                    reachable: true,
                    latency_ms: Some(latency.as_millis() as u64),
                    fallback_used: true,
                    fallback_port: Some(port),
                }));
            }
        }

        Ok(StageReport::partial(
            ConnectivityResult {
                resolved_address: address,
                reachable: false,
                latency_ms: None,
                fallback_used: true,
                fallback_port: None,
            },
            format!("{} is not reachable", address),
        ))
    }

    async fn trace_path(
        &self,
        logger: &ProbeLogger,
        resolver: Arc<dyn Resolve>,
        target: &str,
        config: &ProbeConfiguration,
    ) -> Result<StageReport<TraceResult>> {
        let mut tracer = PathTracer::new(resolver, self.reachability.clone())
            .with_fallback_timeout(defaults::FALLBACK_PROBE_TIMEOUT.min(config.timeout()));
        if let Some(command) = &self.trace_command {
            tracer = tracer.with_command(command.clone());
        }

        let result = tracer.trace(target, config.max_hops, config.trace_timeout()).await;

        let event = if result.timed_out {
            "killed after deadline"
        } else if result.used_fallback {
            "unavailable, manual fallback used"
        } else {
            "exited"
        };
        logger.log_trace_event(&result.command, event).await;

        Ok(classify_trace(result, config.trace_timeout()))
    }
}

/// Stage boundary: time the body, contain errors and panics, log the outcome
async fn run_stage<T, F>(logger: &ProbeLogger, stage: Stage, body: F) -> StageReport<T>
where
    F: Future<Output = Result<StageReport<T>>>,
{
    logger.log_stage_start(stage).await;
    let start = Instant::now();

    let report = match AssertUnwindSafe(body).catch_unwind().await {
        Ok(Ok(report)) => report,
        Ok(Err(e)) => {
            logger.log_error(&e, Some(stage.name())).await;
            StageReport::failed(e.to_string())
        }
        Err(panic) => {
            let error = AppError::internal(format!("{} stage panicked: {}", stage, panic_message(panic.as_ref())));
            logger.log_error(&error, None).await;
            StageReport::failed(error.to_string())
        }
    };

    let elapsed_ms = start.elapsed().as_millis() as u64;
    logger
        .log_stage_end(stage, report.status, elapsed_ms, report.error.as_deref())
        .await;
    report.with_elapsed_ms(elapsed_ms)
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

async fn lookup_dns(resolver: &dyn Resolve, host: &str, verbose: bool) -> Result<StageReport<DnsResult>> {
    let addresses = resolver.resolve(host).await?;
    if addresses.is_empty() {
        return Err(AppError::dns_resolution(format!("No addresses found for {}", host)));
    }

    let mut result = DnsResult {
        addresses,
        reverse_name: None,
        reverse_error: None,
    };

    // Reverse lookup is best effort
    let first = result.addresses[0].address;
    match resolver.reverse(first).await {
        Ok(name) => result.reverse_name = Some(name),
        Err(e) if verbose => result.reverse_error = Some(e.to_string()),
        Err(_) => {}
    }

    Ok(StageReport::success(result))
}

async fn scan_ports(
    logger: &ProbeLogger,
    target: &str,
    ports: &[u16],
    timeout: Duration,
) -> Result<StageReport<PortScanResult>> {
    log_debug!(
        logger.logger(),
        "Scanning {} ports on {} with up to {} workers",
        ports.len(),
        target,
        defaults::max_scan_workers()
    );

    let result = scanner::scan(target, ports, timeout).await;
    for entry in &result.entries {
        logger.log_port_result(entry.port, &entry.service, entry.is_open()).await;
    }

    Ok(StageReport::success(result))
}

async fn check_web(host: &str, timeout: Duration, verbose: bool) -> Result<StageReport<WebResult>> {
    let probe = WebProbe::new(timeout, verbose)?;

    let mut per_protocol = BTreeMap::new();
    for protocol in [WebProtocol::Http, WebProtocol::Https] {
        per_protocol.insert(protocol, probe.check_protocol(host, protocol).await);
    }
    let result = WebResult { per_protocol };

    Ok(match result.responded_count() {
        0 => StageReport::failed_with(result, "No web service answered over HTTP or HTTPS"),
        n if n == result.per_protocol.len() => StageReport::success(result),
        _ => StageReport::partial(result, "Only some web endpoints answered"),
    })
}

fn classify_trace(result: TraceResult, overall: Duration) -> StageReport<TraceResult> {
    if result.timed_out {
        let reason = format!("Trace did not finish within {}s", overall.as_secs());
        StageReport::partial(result, reason)
    } else if result.used_fallback {
        let reason = result
            .error
            .clone()
            .unwrap_or_else(|| "Trace tool unavailable".to_string());
        if result.hops.is_empty() {
            StageReport::failed_with(result, format!("{}; manual fallback reached nothing", reason))
        } else {
            StageReport::partial(result, format!("{}; manual fallback used", reason))
        }
    } else if result.completed {
        StageReport::success(result)
    } else {
        let reason = result
            .error
            .clone()
            .unwrap_or_else(|| "Trace ended early".to_string());
        StageReport::partial(result, reason)
    }
}
