//! Network-layer reachability checks
//!
//! The platform reachability primitive is a single echo request through the
//! system `ping` tool, bounded by a deadline and killed if it overruns.

use async_trait::async_trait;
use std::net::IpAddr;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time;

/// Reachability primitive used by the connectivity stage and the trace fallback
#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
    /// Whether `address` answers within `timeout`, optionally limited to `ttl` hops
    async fn is_reachable(&self, address: IpAddr, ttl: Option<u8>, timeout: Duration) -> bool;
}

/// Reachability through the system `ping` executable
#[derive(Debug, Clone)]
pub struct SystemPing {
    program: String,
}

impl Default for SystemPing {
    fn default() -> Self {
        Self {
            program: "ping".to_string(),
        }
    }
}

impl SystemPing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different ping executable
    pub fn with_program<S: Into<String>>(program: S) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Arguments for one echo request on the current platform
    pub fn args(address: IpAddr, ttl: Option<u8>, timeout: Duration) -> Vec<String> {
        let mut args = Vec::new();

        #[cfg(target_os = "windows")]
        {
            args.extend(["-n".to_string(), "1".to_string()]);
            args.extend(["-w".to_string(), timeout.as_millis().max(1).to_string()]);
            if let Some(ttl) = ttl {
                args.extend(["-i".to_string(), ttl.to_string()]);
            }
        }

        #[cfg(target_os = "macos")]
        {
            args.extend(["-c".to_string(), "1".to_string()]);
            args.extend(["-W".to_string(), timeout.as_millis().max(1).to_string()]);
            if let Some(ttl) = ttl {
                args.extend(["-m".to_string(), ttl.to_string()]);
            }
        }

        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        {
            args.extend(["-c".to_string(), "1".to_string()]);
            args.extend(["-W".to_string(), whole_seconds(timeout).to_string()]);
            if let Some(ttl) = ttl {
                args.extend(["-t".to_string(), ttl.to_string()]);
            }
        }

        args.push(address.to_string());
        args
    }
}

#[async_trait]
impl ReachabilityProbe for SystemPing {
    async fn is_reachable(&self, address: IpAddr, ttl: Option<u8>, timeout: Duration) -> bool {
        let child = Command::new(&self.program)
            .args(Self::args(address, ttl, timeout))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn();

        let mut child = match child {
            Ok(child) => child,
            Err(_) => return false,
        };

        // ping rounds its own timeout; allow a little slack before killing it
        let deadline = timeout + Duration::from_millis(500);
        match time::timeout(deadline, child.wait()).await {
            Ok(Ok(status)) => status.success(),
            Ok(Err(_)) => false,
            Err(_) => {
                let _ = child.kill().await;
                false
            }
        }
    }
}

/// Fixed answer, for hosts known to drop echo requests and for tests
#[derive(Debug, Clone, Copy)]
pub struct FixedReachability(pub bool);

#[async_trait]
impl ReachabilityProbe for FixedReachability {
    async fn is_reachable(&self, _address: IpAddr, _ttl: Option<u8>, _timeout: Duration) -> bool {
        self.0
    }
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn whole_seconds(timeout: Duration) -> u64 {
    let secs = timeout.as_secs();
    if timeout.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_args_end_with_address() {
        let address: IpAddr = "192.0.2.1".parse().unwrap();
        let args = SystemPing::args(address, Some(3), Duration::from_millis(1500));
        assert_eq!(args.last().map(String::as_str), Some("192.0.2.1"));
        assert!(args.contains(&"3".to_string()));
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    #[test]
    fn test_linux_timeout_rounds_up_to_seconds() {
        assert_eq!(whole_seconds(Duration::from_millis(1500)), 2);
        assert_eq!(whole_seconds(Duration::from_millis(200)), 1);
        assert_eq!(whole_seconds(Duration::from_secs(3)), 3);
    }

    #[tokio::test]
    async fn test_missing_ping_binary_is_unreachable() {
        let ping = SystemPing::with_program("definitely-not-a-ping-binary");
        let reachable = ping
            .is_reachable("127.0.0.1".parse().unwrap(), None, Duration::from_millis(200))
            .await;
        assert!(!reachable);
    }

    #[tokio::test]
    async fn test_ping_is_bounded_by_deadline() {
        let timeout = Duration::from_millis(300);
        let start = Instant::now();
        let _ = SystemPing::new()
            .is_reachable("10.255.255.1".parse().unwrap(), None, timeout)
            .await;
        assert!(start.elapsed() < timeout + Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_fixed_reachability() {
        let address: IpAddr = "127.0.0.1".parse().unwrap();
        assert!(FixedReachability(true).is_reachable(address, None, Duration::ZERO).await);
        assert!(!FixedReachability(false).is_reachable(address, Some(1), Duration::ZERO).await);
    }
}
