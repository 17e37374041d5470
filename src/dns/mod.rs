//! Name resolution for the probe stages
//!
//! `SystemResolver` follows the platform resolver configuration (resolv.conf,
//! hosts file) through trust-dns and falls back to the operating system's
//! `getaddrinfo` path when that configuration cannot be read.

use crate::{
    error::{AppError, Result},
    models::AddressRecord,
};
use async_trait::async_trait;
use std::{
    collections::HashMap,
    net::IpAddr,
    time::Duration,
};
use tokio::time::timeout;
use trust_dns_resolver::{
    config::{LookupIpStrategy, ResolverConfig, ResolverOpts},
    proto::rr::RecordType,
    system_conf,
    TokioAsyncResolver,
};

/// Resolver abstraction used by the pipeline and the trace fallback
#[async_trait]
pub trait Resolve: Send + Sync {
    /// Every address `name` resolves to, in resolver order
    async fn resolve(&self, name: &str) -> Result<Vec<AddressRecord>>;

    /// PTR name for `address`
    async fn reverse(&self, address: IpAddr) -> Result<String>;

    /// First address for `name`
    async fn resolve_first(&self, name: &str) -> Result<IpAddr> {
        self.resolve(name)
            .await?
            .first()
            .map(|record| record.address)
            .ok_or_else(|| AppError::dns_resolution(format!("No addresses found for {}", name)))
    }
}

enum Backend {
    TrustDns(TokioAsyncResolver),
    Os,
}

/// Resolver backed by the system configuration
pub struct SystemResolver {
    backend: Backend,
    timeout: Duration,
}

impl SystemResolver {
    /// Create a resolver; per-query time is bounded by `timeout`
    pub fn new(timeout: Duration) -> Self {
        match system_conf::read_system_conf() {
            Ok((config, opts)) => Self::from_parts(config, opts, timeout),
            Err(_) => Self::os_only(timeout),
        }
    }

    /// trust-dns resolver over `config`; both address families are always queried
    pub(crate) fn from_parts(config: ResolverConfig, opts: ResolverOpts, timeout: Duration) -> Self {
        let backend = Backend::TrustDns(TokioAsyncResolver::tokio(config, lookup_opts(opts, timeout)));
        Self { backend, timeout }
    }

    /// Resolver that always uses the operating system lookup path
    pub fn os_only(timeout: Duration) -> Self {
        Self {
            backend: Backend::Os,
            timeout,
        }
    }

    // Overall bound: the resolver may retry across several name servers
    fn deadline(&self) -> Duration {
        self.timeout * 3
    }

    async fn resolve_trust_dns(&self, resolver: &TokioAsyncResolver, name: &str) -> Result<Vec<AddressRecord>> {
        let lookup = timeout(self.deadline(), resolver.lookup_ip(name))
            .await
            .map_err(|_| AppError::dns_resolution(format!("Resolution of {} timed out", name)))??;

        let canonical = lookup
            .as_lookup()
            .records()
            .iter()
            .find(|record| matches!(record.record_type(), RecordType::A | RecordType::AAAA))
            .map(|record| trim_root(&record.name().to_utf8()))
            .filter(|owner| !owner.eq_ignore_ascii_case(trim_root(name).as_str()));

        let records = lookup
            .iter()
            .map(|address| AddressRecord {
                address,
                canonical_name: canonical.clone(),
            })
            .collect();

        Ok(dedup_records(records))
    }

    async fn resolve_os(&self, name: &str) -> Result<Vec<AddressRecord>> {
        let addrs = timeout(self.deadline(), tokio::net::lookup_host((name, 0)))
            .await
            .map_err(|_| AppError::dns_resolution(format!("Resolution of {} timed out", name)))?
            .map_err(|e| AppError::dns_resolution(format!("Failed to resolve {}: {}", name, e)))?;

        Ok(dedup_records(addrs.map(|addr| AddressRecord::new(addr.ip())).collect()))
    }
}

#[async_trait]
impl Resolve for SystemResolver {
    async fn resolve(&self, name: &str) -> Result<Vec<AddressRecord>> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::dns_resolution("Cannot resolve an empty name"));
        }

        // Literal addresses need no lookup
        if let Some(ip) = parse_literal(name) {
            return Ok(vec![AddressRecord::new(ip)]);
        }

        let records = match &self.backend {
            Backend::TrustDns(resolver) => self.resolve_trust_dns(resolver, name).await?,
            Backend::Os => self.resolve_os(name).await?,
        };

        if records.is_empty() {
            return Err(AppError::dns_resolution(format!("No addresses found for {}", name)));
        }
        Ok(records)
    }

    async fn reverse(&self, address: IpAddr) -> Result<String> {
        match &self.backend {
            Backend::TrustDns(resolver) => {
                let lookup = timeout(self.deadline(), resolver.reverse_lookup(address))
                    .await
                    .map_err(|_| AppError::dns_resolution(format!("Reverse lookup of {} timed out", address)))??;

                lookup
                    .iter()
                    .next()
                    .map(|ptr| trim_root(&ptr.to_string()))
                    .ok_or_else(|| AppError::dns_resolution(format!("No PTR record for {}", address)))
            }
            Backend::Os => Err(AppError::dns_resolution(
                "Reverse lookup requires a readable system resolver configuration",
            )),
        }
    }
}

/// Fixed name table, used for hosts overrides and tests
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    forward: HashMap<String, Vec<AddressRecord>>,
    reverse: HashMap<IpAddr, String>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `name` to `addresses`
    pub fn with_host(mut self, name: &str, addresses: Vec<IpAddr>) -> Self {
        let records = addresses.into_iter().map(AddressRecord::new).collect();
        self.forward.insert(name.to_ascii_lowercase(), records);
        self
    }

    /// Map `address` back to `name`
    pub fn with_reverse(mut self, address: IpAddr, name: &str) -> Self {
        self.reverse.insert(address, name.to_string());
        self
    }
}

#[async_trait]
impl Resolve for StaticResolver {
    async fn resolve(&self, name: &str) -> Result<Vec<AddressRecord>> {
        let name = name.trim();
        if let Some(ip) = parse_literal(name) {
            return Ok(vec![AddressRecord::new(ip)]);
        }

        self.forward
            .get(&name.to_ascii_lowercase())
            .filter(|records| !records.is_empty())
            .cloned()
            .ok_or_else(|| AppError::dns_resolution(format!("Unknown host {}", name)))
    }

    async fn reverse(&self, address: IpAddr) -> Result<String> {
        self.reverse
            .get(&address)
            .cloned()
            .ok_or_else(|| AppError::dns_resolution(format!("No PTR record for {}", address)))
    }
}

/// Parse a literal address, accepting bracketed IPv6
pub fn parse_literal(name: &str) -> Option<IpAddr> {
    let trimmed = name.trim_start_matches('[').trim_end_matches(']');
    trimmed.parse::<IpAddr>().ok()
}

fn lookup_opts(mut opts: ResolverOpts, timeout: Duration) -> ResolverOpts {
    opts.timeout = timeout;
    opts.ip_strategy = LookupIpStrategy::Ipv4AndIpv6;
    opts
}

fn trim_root(name: &str) -> String {
    name.trim_end_matches('.').to_string()
}

fn dedup_records(records: Vec<AddressRecord>) -> Vec<AddressRecord> {
    let mut seen = std::collections::HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(record.address))
        .collect()
}
