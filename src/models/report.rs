//! Stage results and the aggregated diagnostic report

use crate::models::config::ProbeConfiguration;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;
use uuid::Uuid;

/// The five diagnostic stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stage {
    Connectivity,
    Dns,
    Ports,
    Web,
    Trace,
}

impl Stage {
    /// All stages in pipeline order
    pub const ALL: [Stage; 5] = [
        Stage::Connectivity,
        Stage::Dns,
        Stage::Ports,
        Stage::Web,
        Stage::Trace,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Connectivity => "connectivity",
            Stage::Dns => "dns",
            Stage::Ports => "ports",
            Stage::Web => "web",
            Stage::Trace => "trace",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome classification of a single stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageStatus {
    /// Stage completed and produced a full result
    Success,
    /// Stage produced a degraded result (fallback used, target unreachable, ...)
    Partial,
    /// Stage produced no usable result
    Failed,
}

/// Per-stage result envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageReport<T> {
    pub status: StageStatus,
    pub result: Option<T>,
    /// Underlying error or degradation reason
    pub error: Option<String>,
    pub elapsed_ms: u64,
}

impl<T> StageReport<T> {
    pub fn success(result: T) -> Self {
        Self {
            status: StageStatus::Success,
            result: Some(result),
            error: None,
            elapsed_ms: 0,
        }
    }

    pub fn partial<S: Into<String>>(result: T, reason: S) -> Self {
        Self {
            status: StageStatus::Partial,
            result: Some(result),
            error: Some(reason.into()),
            elapsed_ms: 0,
        }
    }

    pub fn failed<S: Into<String>>(error: S) -> Self {
        Self {
            status: StageStatus::Failed,
            result: None,
            error: Some(error.into()),
            elapsed_ms: 0,
        }
    }

    /// Failed stage that still carries whatever it collected
    pub fn failed_with<S: Into<String>>(result: T, error: S) -> Self {
        Self {
            status: StageStatus::Failed,
            result: Some(result),
            error: Some(error.into()),
            elapsed_ms: 0,
        }
    }

    pub fn with_elapsed_ms(mut self, elapsed_ms: u64) -> Self {
        self.elapsed_ms = elapsed_ms;
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == StageStatus::Success
    }

    pub fn is_failed(&self) -> bool {
        self.status == StageStatus::Failed
    }
}

/// Connectivity stage result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectivityResult {
    pub resolved_address: IpAddr,
    pub reachable: bool,
    pub latency_ms: Option<u64>,
    /// The TCP fallback decided reachability
    pub fallback_used: bool,
    /// Port that answered the TCP fallback
    pub fallback_port: Option<u16>,
}

/// One resolved address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRecord {
    pub address: IpAddr,
    /// Canonical name when it differs from the queried name
    pub canonical_name: Option<String>,
}

impl AddressRecord {
    pub fn new(address: IpAddr) -> Self {
        Self {
            address,
            canonical_name: None,
        }
    }
}

/// DNS stage result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DnsResult {
    pub addresses: Vec<AddressRecord>,
    pub reverse_name: Option<String>,
    /// Reverse lookup failure, only kept in verbose mode
    pub reverse_error: Option<String>,
}

impl DnsResult {
    pub fn ip_addresses(&self) -> Vec<IpAddr> {
        self.addresses.iter().map(|r| r.address).collect()
    }
}

/// State of a single scanned port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortState {
    Open,
    ClosedOrFiltered,
}

/// Result for one configured port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortResult {
    pub port: u16,
    pub service: String,
    pub state: PortState,
}

impl PortResult {
    pub fn is_open(&self) -> bool {
        self.state == PortState::Open
    }
}

/// Port scan stage result
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PortScanResult {
    /// One entry per configured port, ordered by port number
    pub entries: Vec<PortResult>,
    /// Open ports, ascending
    pub open_ports: Vec<u16>,
    pub open_count: usize,
}

/// Protocol checked by the web stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WebProtocol {
    Http,
    Https,
}

impl WebProtocol {
    pub fn scheme(&self) -> &'static str {
        match self {
            WebProtocol::Http => "http",
            WebProtocol::Https => "https",
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            WebProtocol::Http => 80,
            WebProtocol::Https => 443,
        }
    }

    pub fn uses_tls(&self) -> bool {
        matches!(self, WebProtocol::Https)
    }

    pub fn from_tls(use_tls: bool) -> Self {
        if use_tls {
            WebProtocol::Https
        } else {
            WebProtocol::Http
        }
    }
}

impl fmt::Display for WebProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebProtocol::Http => f.write_str("HTTP"),
            WebProtocol::Https => f.write_str("HTTPS"),
        }
    }
}

/// A web endpoint that answered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebResponse {
    pub url: String,
    pub status_code: u16,
    pub elapsed_ms: u64,
    pub server: Option<String>,
    pub content_type: Option<String>,
}

impl WebResponse {
    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status_code)
    }
}

/// Outcome of probing one web endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WebOutcome {
    Responded(WebResponse),
    /// Transport failure; `detail` is only set in verbose mode
    Unavailable { detail: Option<String> },
}

impl WebOutcome {
    pub fn response(&self) -> Option<&WebResponse> {
        match self {
            WebOutcome::Responded(response) => Some(response),
            WebOutcome::Unavailable { .. } => None,
        }
    }
}

/// Web stage result
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WebResult {
    pub per_protocol: BTreeMap<WebProtocol, WebOutcome>,
}

impl WebResult {
    pub fn responded_count(&self) -> usize {
        self.per_protocol
            .values()
            .filter(|o| o.response().is_some())
            .count()
    }
}

/// One TTL step of the manual trace fallback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackAttempt {
    pub ttl: u8,
    pub address: Option<IpAddr>,
    pub reached: bool,
    pub elapsed_ms: u64,
}

/// Path trace stage result
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TraceResult {
    /// Command line that was attempted
    pub command: String,
    /// Raw hop lines, in output order
    pub hops: Vec<String>,
    pub completed: bool,
    pub timed_out: bool,
    pub used_fallback: bool,
    pub exit_code: Option<i32>,
    /// Manual fallback attempts, empty when the external tool ran
    pub attempts: Vec<FallbackAttempt>,
    /// Spawn or command failure description
    pub error: Option<String>,
}

/// Aggregated result of one diagnostic run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticReport {
    pub run_id: Uuid,
    pub target: String,
    pub configuration: ProbeConfiguration,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub connectivity: Option<StageReport<ConnectivityResult>>,
    pub dns: Option<StageReport<DnsResult>>,
    pub ports: Option<StageReport<PortScanResult>>,
    pub web: Option<StageReport<WebResult>>,
    pub trace: Option<StageReport<TraceResult>>,
}

impl DiagnosticReport {
    /// Empty report for a run that is about to start
    pub fn new(configuration: &ProbeConfiguration) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            target: configuration.host().to_string(),
            configuration: configuration.clone(),
            started_at: Utc::now(),
            finished_at: None,
            connectivity: None,
            dns: None,
            ports: None,
            web: None,
            trace: None,
        }
    }

    /// Stamp the finish time
    pub fn finish(mut self) -> Self {
        self.finished_at = Some(Utc::now());
        self
    }

    /// Status of `stage`, or `None` when it was not run
    pub fn stage_status(&self, stage: Stage) -> Option<StageStatus> {
        match stage {
            Stage::Connectivity => self.connectivity.as_ref().map(|s| s.status),
            Stage::Dns => self.dns.as_ref().map(|s| s.status),
            Stage::Ports => self.ports.as_ref().map(|s| s.status),
            Stage::Web => self.web.as_ref().map(|s| s.status),
            Stage::Trace => self.trace.as_ref().map(|s| s.status),
        }
    }

    /// Stages that ran, in pipeline order
    pub fn stages_run(&self) -> Vec<Stage> {
        Stage::ALL
            .into_iter()
            .filter(|&stage| self.stage_status(stage).is_some())
            .collect()
    }

    /// Open ports found by the scan stage
    pub fn open_ports(&self) -> Vec<u16> {
        self.ports
            .as_ref()
            .and_then(|s| s.result.as_ref())
            .map(|r| r.open_ports.clone())
            .unwrap_or_default()
    }

    /// Addresses found by the DNS stage
    pub fn dns_addresses(&self) -> Vec<IpAddr> {
        self.dns
            .as_ref()
            .and_then(|s| s.result.as_ref())
            .map(|r| r.ip_addresses())
            .unwrap_or_default()
    }
}
