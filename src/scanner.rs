//! Concurrent port scan coordinator
//!
//! Fans one socket probe per port out over a semaphore-bounded `JoinSet`,
//! collects open ports in a mutex-guarded accumulator, and waits for every
//! probe before building the result.

use crate::{
    catalog::ServiceCatalog,
    defaults,
    models::{PortResult, PortScanResult, PortState},
    probe,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;

/// Scan `ports` on `host` with the default worker cap
pub async fn scan(host: &str, ports: &[u16], timeout: Duration) -> PortScanResult {
    scan_with_workers(host, ports, timeout, defaults::max_scan_workers()).await
}

/// Scan `ports` on `host` with at most `max_workers` concurrent connection attempts.
///
/// Every probe gets its own `timeout`; a slow port never delays the others
/// beyond its own bound. Duplicate ports are probed once.
pub async fn scan_with_workers(
    host: &str,
    ports: &[u16],
    timeout: Duration,
    max_workers: usize,
) -> PortScanResult {
    let unique: BTreeSet<u16> = ports.iter().copied().collect();
    if unique.is_empty() {
        return PortScanResult::default();
    }

    let workers = max_workers.clamp(1, unique.len());
    let sem = Arc::new(Semaphore::new(workers));
    let open = Arc::new(Mutex::new(Vec::with_capacity(unique.len())));
    let host: Arc<str> = Arc::from(host);
    let mut set = JoinSet::new();

    for &port in &unique {
        let sem = sem.clone();
        let open = open.clone();
        let host = host.clone();

        set.spawn(async move {
            // The semaphore is never closed
            let Ok(_permit) = sem.acquire_owned().await else {
                return;
            };

            if probe::try_connect(&host, port, timeout).await {
                open.lock().await.push(port);
            }
        });
    }

    // Full barrier: results are only assembled after every probe finished
    while let Some(_res) = set.join_next().await {}

    let mut open_ports = std::mem::take(&mut *open.lock().await);
    open_ports.sort_unstable();

    build_result(&unique, open_ports)
}

fn build_result(ports: &BTreeSet<u16>, open_ports: Vec<u16>) -> PortScanResult {
    let entries = ports
        .iter()
        .map(|&port| PortResult {
            port,
            service: ServiceCatalog::label(port).to_string(),
            state: if open_ports.binary_search(&port).is_ok() {
                PortState::Open
            } else {
                PortState::ClosedOrFiltered
            },
        })
        .collect();

    PortScanResult {
        entries,
        open_count: open_ports.len(),
        open_ports,
    }
}
