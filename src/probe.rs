//! Single bounded-timeout TCP connection attempts

use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::time;

/// Attempt one TCP connection to `host:port` within `timeout`.
///
/// Refusal, timeout, unreachable networks and resolution failures all
/// collapse to `false`. The stream is dropped on every path.
pub async fn try_connect(host: &str, port: u16, timeout: Duration) -> bool {
    try_connect_timed(host, port, timeout).await.is_some()
}

/// Like [`try_connect`], returning the connect latency on success
pub async fn try_connect_timed(host: &str, port: u16, timeout: Duration) -> Option<Duration> {
    let host = host.trim_start_matches('[').trim_end_matches(']');
    let start = Instant::now();
    match time::timeout(timeout, TcpStream::connect((host, port))).await {
        Ok(Ok(stream)) => {
            let elapsed = start.elapsed();
            drop(stream);
            Some(elapsed)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    async fn closed_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        port
    }

    #[tokio::test]
    async fn test_open_port_connects() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        assert!(try_connect("127.0.0.1", port, Duration::from_secs(2)).await);
        assert!(try_connect_timed("127.0.0.1", port, Duration::from_secs(2)).await.is_some());
    }

    #[tokio::test]
    async fn test_closed_port_is_false() {
        let port = closed_port().await;
        assert!(!try_connect("127.0.0.1", port, Duration::from_secs(2)).await);
    }

    #[tokio::test]
    async fn test_unresolvable_host_is_false() {
        assert!(!try_connect("no-such-host.invalid", 80, Duration::from_millis(500)).await);
    }

    #[tokio::test]
    async fn test_black_hole_address_respects_timeout() {
        // 10.255.255.1 is normally unrouted; either it times out or fails fast
        let timeout = Duration::from_millis(300);
        let start = Instant::now();
        let open = try_connect("10.255.255.1", 81, timeout).await;
        assert!(!open);
        assert!(start.elapsed() < timeout + Duration::from_millis(700));
    }
}
