//! Injected HTTP client capability.
//!
//! Resolver and Prober never touch `reqwest` directly; they describe a GET as an
//! [`OutboundRequest`] and hand it to an [`HttpTransport`]. Production code uses
//! [`ReqwestTransport`], tests substitute a scripted transport.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, redirect::Policy};
use thiserror::Error;
use url::{Host, Url};

/// Transport-level failure of a single GET.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Failed to read response body: {0}")]
    Body(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// A GET request as seen by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// Virtual host to present instead of the URL authority.
    ///
    /// When set, the URL host must be an IP literal: the connection goes to that
    /// IP while TLS SNI and the `Host` header carry this name.
    pub host_override: Option<String>,
    pub follow_redirects: bool,
    /// Keep at most this many body bytes; the full length is still counted.
    pub body_limit: Option<usize>,
}

impl OutboundRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            host_override: None,
            follow_redirects: true,
            body_limit: None,
        }
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn host_override(mut self, host: impl Into<String>) -> Self {
        self.host_override = Some(host.into());
        self
    }

    #[must_use]
    pub fn no_redirects(mut self) -> Self {
        self.follow_redirects = false;
        self
    }

    #[must_use]
    pub fn body_limit(mut self, limit: usize) -> Self {
        self.body_limit = Some(limit);
        self
    }
}

/// Completed HTTP exchange: final observed status and the retained body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    /// Body bytes, truncated to the request's `body_limit`.
    pub body: Vec<u8>,
    /// Full body length in bytes.
    pub body_len: usize,
}

impl TransportResponse {
    /// Build a response from a fully available body, applying `body_limit`.
    pub fn new(status: u16, mut body: Vec<u8>, body_limit: Option<usize>) -> Self {
        let body_len = body.len();
        if let Some(limit) = body_limit {
            body.truncate(limit);
        }
        Self {
            status,
            body,
            body_len,
        }
    }
}

/// "Perform GET, return status + body or fail."
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: OutboundRequest) -> TransportResult<TransportResponse>;
}

/// [`HttpTransport`] backed by `reqwest`.
pub struct ReqwestTransport {
    client: Client,
    no_redirect_client: Client,
    timeout: Option<Duration>,
}

impl ReqwestTransport {
    /// Build the transport. `timeout` bounds each request end to end; `None`
    /// leaves requests unbounded.
    pub fn new(timeout: Option<Duration>) -> TransportResult<Self> {
        Ok(Self {
            client: Self::builder(timeout)
                .build()
                .map_err(|e| TransportError::InvalidRequest(e.to_string()))?,
            no_redirect_client: Self::builder(timeout)
                .redirect(Policy::none())
                .build()
                .map_err(|e| TransportError::InvalidRequest(e.to_string()))?,
            timeout,
        })
    }

    fn builder(timeout: Option<Duration>) -> reqwest::ClientBuilder {
        let builder = Client::builder();
        match timeout {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        }
    }

    /// Rewrite `https://<ip>/` into `https://<host>/` and build a one-off client
    /// whose resolver pins `<host>` to `<ip>`.
    fn pinned(&self, request: &OutboundRequest, host: &str) -> TransportResult<(Client, Url)> {
        let mut url = Url::parse(&request.url)
            .map_err(|e| TransportError::InvalidRequest(format!("{}: {e}", request.url)))?;
        let ip: IpAddr = match url.host() {
            Some(Host::Ipv4(v4)) => v4.into(),
            Some(Host::Ipv6(v6)) => v6.into(),
            _ => {
                return Err(TransportError::InvalidRequest(format!(
                    "host override requires an IP literal URL, got {}",
                    request.url
                )));
            }
        };
        let port = url.port_or_known_default().unwrap_or(443);
        url.set_host(Some(host))
            .map_err(|e| TransportError::InvalidRequest(format!("{host}: {e}")))?;
        // set_host IDNA-normalises; the resolver override must use the same key
        // reqwest will look up.
        let pinned_host = url
            .host_str()
            .ok_or_else(|| TransportError::InvalidRequest(format!("{host}: empty host")))?
            .to_string();

        let mut builder =
            Self::builder(self.timeout).resolve(&pinned_host, SocketAddr::new(ip, port));
        if !request.follow_redirects {
            builder = builder.redirect(Policy::none());
        }
        let client = builder
            .build()
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
        Ok((client, url))
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: OutboundRequest) -> TransportResult<TransportResponse> {
        let (client, url) = if let Some(host) = request.host_override.as_deref() {
            self.pinned(&request, host)?
        } else {
            let url = Url::parse(&request.url)
                .map_err(|e| TransportError::InvalidRequest(format!("{}: {e}", request.url)))?;
            let client = if request.follow_redirects {
                self.client.clone()
            } else {
                self.no_redirect_client.clone()
            };
            (client, url)
        };

        let mut builder = client.get(url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let mut response = builder.send().await.map_err(classify)?;
        let status = response.status().as_u16();

        let limit = request.body_limit.unwrap_or(usize::MAX);
        let mut body = Vec::new();
        let mut body_len = 0;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?
        {
            body_len += chunk.len();
            let room = limit.saturating_sub(body.len());
            body.extend_from_slice(&chunk[..chunk.len().min(room)]);
        }

        Ok(TransportResponse {
            status,
            body,
            body_len,
        })
    }
}

fn classify(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout(error.to_string())
    } else if error.is_connect() {
        TransportError::Connect(error.to_string())
    } else {
        TransportError::Request(error.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    use tokio::net::TcpListener;

    fn transport() -> ReqwestTransport {
        ReqwestTransport::new(Some(Duration::from_secs(5))).unwrap()
    }

    #[test]
    fn test_outbound_request_builder() {
        let request = OutboundRequest::get("https://203.0.113.5/")
            .header("User-Agent", "ua")
            .host_override("example.com")
            .no_redirects();
        assert_eq!(request.url, "https://203.0.113.5/");
        assert_eq!(
            request.headers,
            vec![("User-Agent".to_string(), "ua".to_string())]
        );
        assert_eq!(request.host_override.as_deref(), Some("example.com"));
        assert!(!request.follow_redirects);
    }

    #[test]
    fn test_pinned_rewrites_ipv4_url() {
        let request = OutboundRequest::get("https://203.0.113.5/").host_override("example.com");
        let (_client, url) = transport().pinned(&request, "example.com").unwrap();
        assert_eq!(url.as_str(), "https://example.com/");
    }

    #[test]
    fn test_pinned_rewrites_ipv6_url() {
        let request = OutboundRequest::get("https://[2001:db8::1]/").host_override("example.com");
        let (_client, url) = transport().pinned(&request, "example.com").unwrap();
        assert_eq!(url.as_str(), "https://example.com/");
    }

    #[test]
    fn test_pinned_normalises_idn_host() {
        let request = OutboundRequest::get("https://203.0.113.5/").host_override("bücher.example");
        let (_client, url) = transport().pinned(&request, "bücher.example").unwrap();
        assert_eq!(url.as_str(), "https://xn--bcher-kva.example/");
    }

    #[test]
    fn test_response_new_applies_body_limit() {
        let response = TransportResponse::new(200, b"hello world".to_vec(), Some(5));
        assert_eq!(response.body, b"hello");
        assert_eq!(response.body_len, 11);

        let response = TransportResponse::new(200, b"hi".to_vec(), Some(5));
        assert_eq!(response.body, b"hi");
        assert_eq!(response.body_len, 2);

        let response = TransportResponse::new(204, Vec::new(), None);
        assert!(response.body.is_empty());
        assert_eq!(response.body_len, 0);
    }

    /// Accept one connection on a loopback listener while `host` is pinned to it.
    async fn dials_pinned_address(host: &str) -> bool {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let accepted = tokio::spawn(async move {
            tokio::time::timeout(Duration::from_secs(3), listener.accept())
                .await
                .is_ok_and(|r| r.is_ok())
        });

        let request =
            OutboundRequest::get(format!("https://127.0.0.1:{port}/")).host_override(host);
        // The handshake fails against a bare TCP listener; only the dial matters.
        let _ = ReqwestTransport::new(Some(Duration::from_secs(2)))
            .unwrap()
            .send(request)
            .await;

        accepted.await.unwrap()
    }

    #[tokio::test]
    async fn test_send_pins_ascii_host_to_address() {
        assert!(dials_pinned_address("buecher.invalid").await);
    }

    #[tokio::test]
    async fn test_send_pins_idn_host_to_address() {
        assert!(dials_pinned_address("bücher.invalid").await);
    }

    #[test]
    fn test_pinned_requires_ip_literal() {
        let request = OutboundRequest::get("https://example.org/").host_override("example.com");
        let result = transport().pinned(&request, "example.com");
        assert!(matches!(result, Err(TransportError::InvalidRequest(_))));
    }

    #[test]
    fn test_pinned_rejects_bad_host() {
        let request = OutboundRequest::get("https://203.0.113.5/").host_override("bad host");
        let result = transport().pinned(&request, "bad host");
        assert!(matches!(result, Err(TransportError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_send_invalid_url() {
        let result = transport()
            .send(OutboundRequest::get("not a valid url at all !!!"))
            .await;
        assert!(matches!(result, Err(TransportError::InvalidRequest(_))));
    }

    #[tokio::test]
    #[ignore = "requires network access"]
    async fn test_send_doh_real() {
        let request = OutboundRequest::get("https://1.1.1.1/dns-query?name=example.com&type=A")
            .header("Accept", "application/dns-json");
        let response = transport()
            .send(request)
            .await
            .unwrap_or_else(|e| panic!("DoH request failed (network issue?): {e}"));
        assert_eq!(response.status, 200);
        assert!(!response.body.is_empty());
    }
}
