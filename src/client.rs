//! Web endpoint validation over HTTP and HTTPS
//!
//! One GET per endpoint, with separate connect and read timeouts and
//! redirect following disabled: a 3xx is reported as-is.

use crate::{
    error::{AppError, Result},
    models::{WebOutcome, WebProtocol, WebResponse},
};
use reqwest::{header, redirect, Client, Url};
use std::time::{Duration, Instant};
use tokio::time::timeout;

const USER_AGENT: &str = concat!("host-probe/", env!("CARGO_PKG_VERSION"));

/// Single-request HTTP(S) prober
pub struct WebProbe {
    client: Client,
    timeout: Duration,
    verbose: bool,
}

impl WebProbe {
    /// Create a prober; `timeout` applies to connecting and to reading separately
    pub fn new(timeout: Duration, verbose: bool) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .redirect(redirect::Policy::none())
            .pool_max_idle_per_host(0)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            timeout,
            verbose,
        })
    }

    /// Probe `host:port` over HTTP or HTTPS
    pub async fn check(&self, host: &str, port: u16, use_tls: bool) -> WebOutcome {
        match self.request(host, port, use_tls).await {
            Ok(response) => WebOutcome::Responded(response),
            Err(e) => WebOutcome::Unavailable {
                detail: self.verbose.then(|| e.to_string()),
            },
        }
    }

    /// Probe the default port of `protocol`
    pub async fn check_protocol(&self, host: &str, protocol: WebProtocol) -> WebOutcome {
        self.check(host, protocol.default_port(), protocol.uses_tls()).await
    }

    async fn request(&self, host: &str, port: u16, use_tls: bool) -> Result<WebResponse> {
        let url = build_url(host, port, use_tls)?;

        let start = Instant::now();
        // connect + read bounds, plus slack for TLS and header parsing
        let overall = self.timeout * 2 + Duration::from_millis(500);
        let response = timeout(overall, self.client.get(url.clone()).send())
            .await
            .map_err(|_| AppError::timeout(format!("GET {} timed out", url)))??;
        let elapsed = start.elapsed();

        let result = WebResponse {
            url: url.to_string(),
            status_code: response.status().as_u16(),
            elapsed_ms: elapsed.as_millis() as u64,
            server: header_value(response.headers(), header::SERVER),
            content_type: header_value(response.headers(), header::CONTENT_TYPE),
        };

        // Dropping the response without reading the body releases the connection
        drop(response);
        Ok(result)
    }
}

/// Build the probe URL, omitting the port only when it is the scheme default
pub fn build_url(host: &str, port: u16, use_tls: bool) -> Result<Url> {
    let protocol = WebProtocol::from_tls(use_tls);
    let bare = host.trim().trim_start_matches('[').trim_end_matches(']');
    if bare.is_empty() {
        return Err(AppError::parse("Cannot build a URL for an empty host"));
    }

    let authority = if bare.contains(':') {
        format!("[{}]", bare)
    } else {
        bare.to_string()
    };

    let raw = if port == protocol.default_port() {
        format!("{}://{}/", protocol.scheme(), authority)
    } else {
        format!("{}://{}:{}/", protocol.scheme(), authority, port)
    };

    Ok(Url::parse(&raw)?)
}

fn header_value(headers: &header::HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_default_ports_are_omitted() {
        assert_eq!(build_url("example.com", 80, false).unwrap().as_str(), "http://example.com/");
        assert_eq!(build_url("example.com", 443, true).unwrap().as_str(), "https://example.com/");
    }

    #[test]
    fn test_non_default_ports_are_kept() {
        assert_eq!(build_url("example.com", 443, false).unwrap().as_str(), "http://example.com:443/");
        assert_eq!(build_url("example.com", 80, true).unwrap().as_str(), "https://example.com:80/");
        assert_eq!(build_url("example.com", 8080, false).unwrap().as_str(), "http://example.com:8080/");
    }

    #[test]
    fn test_ipv6_hosts_are_bracketed() {
        assert_eq!(build_url("::1", 8080, false).unwrap().as_str(), "http://[::1]:8080/");
        assert_eq!(build_url("[::1]", 443, true).unwrap().as_str(), "https://[::1]/");
    }

    #[test]
    fn test_empty_host_rejected() {
        assert!(matches!(build_url(" ", 80, false), Err(AppError::Parse(_))));
    }

    #[tokio::test]
    async fn test_reports_status_and_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Server", "mock-server/1.0")
                    .insert_header("Content-Type", "text/html; charset=utf-8")
                    .set_body_string("<html></html>"),
            )
            .mount(&server)
            .await;

        let probe = WebProbe::new(Duration::from_secs(2), false).unwrap();
        let port = server.address().port();
        let outcome = probe.check("127.0.0.1", port, false).await;

        let response = outcome.response().expect("endpoint should respond");
        assert_eq!(response.status_code, 200);
        assert_eq!(response.server.as_deref(), Some("mock-server/1.0"));
        assert_eq!(response.content_type.as_deref(), Some("text/html; charset=utf-8"));
        assert_eq!(response.url, format!("http://127.0.0.1:{}/", port));
    }

    #[tokio::test]
    async fn test_redirect_is_reported_not_followed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(301).insert_header("Location", "/moved"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/moved"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let probe = WebProbe::new(Duration::from_secs(2), false).unwrap();
        let outcome = probe.check("127.0.0.1", server.address().port(), false).await;

        let response = outcome.response().expect("redirect is still a response");
        assert_eq!(response.status_code, 301);
        assert!(response.is_redirect());
        server.verify().await;
    }

    #[tokio::test]
    async fn test_closed_port_is_unavailable_with_detail_only_when_verbose() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let quiet = WebProbe::new(Duration::from_millis(500), false).unwrap();
        assert_eq!(
            quiet.check("127.0.0.1", port, false).await,
            WebOutcome::Unavailable { detail: None }
        );

        let verbose = WebProbe::new(Duration::from_millis(500), true).unwrap();
        match verbose.check("127.0.0.1", port, false).await {
            WebOutcome::Unavailable { detail } => assert!(detail.is_some()),
            other => panic!("expected unavailable, got {:?}", other),
        }
    }
}
