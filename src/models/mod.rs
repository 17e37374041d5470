//! Data models for probe configuration and diagnostic reports

pub mod config;
pub mod report;

pub use config::{ProbeConfiguration, StageSelection};
pub use report::{
    AddressRecord, ConnectivityResult, DiagnosticReport, DnsResult, FallbackAttempt,
    PortResult, PortScanResult, PortState, Stage, StageReport, StageStatus, TraceResult,
    WebOutcome, WebProtocol, WebResponse, WebResult,
};
