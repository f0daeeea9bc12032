//! 测试辅助模块
//!
//! Scripted [`HttpTransport`] keyed by request URL, plus helpers that build the
//! DoH answers the resolver expects.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Mutex;

use crate::services::doh_query_url;
use crate::transport::{
    HttpTransport, OutboundRequest, TransportError, TransportResponse, TransportResult,
};

/// Canned outcome for one URL.
#[derive(Debug, Clone)]
pub enum MockReply {
    Response {
        status: u16,
        body: Vec<u8>,
        delay: Duration,
    },
    Failure {
        error: TransportError,
        delay: Duration,
    },
}

/// In-memory transport that answers from a URL → reply table and records
/// every request it receives.
#[derive(Default)]
pub struct MockTransport {
    routes: HashMap<String, MockReply>,
    calls: Mutex<Vec<OutboundRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_reply(mut self, url: impl Into<String>, reply: MockReply) -> Self {
        self.routes.insert(url.into(), reply);
        self
    }

    #[must_use]
    pub fn with_response(
        self,
        url: impl Into<String>,
        status: u16,
        body: impl Into<Vec<u8>>,
    ) -> Self {
        self.with_delayed_response(url, status, body, Duration::ZERO)
    }

    #[must_use]
    pub fn with_delayed_response(
        self,
        url: impl Into<String>,
        status: u16,
        body: impl Into<Vec<u8>>,
        delay: Duration,
    ) -> Self {
        self.with_reply(
            url,
            MockReply::Response {
                status,
                body: body.into(),
                delay,
            },
        )
    }

    #[must_use]
    pub fn with_failure(self, url: impl Into<String>, error: TransportError) -> Self {
        self.with_reply(
            url,
            MockReply::Failure {
                error,
                delay: Duration::ZERO,
            },
        )
    }

    /// Script both DoH queries for `domain` against `endpoint`.
    #[must_use]
    pub fn with_doh(self, endpoint: &str, domain: &str, ipv4: &[&str], ipv6: &[&str]) -> Self {
        self.with_response(
            doh_query_url(endpoint, domain, "A").unwrap_or_default(),
            200,
            doh_body(1, ipv4),
        )
        .with_response(
            doh_query_url(endpoint, domain, "AAAA").unwrap_or_default(),
            200,
            doh_body(28, ipv6),
        )
    }

    /// Requests received so far, in arrival order.
    pub async fn calls(&self) -> Vec<OutboundRequest> {
        self.calls.lock().await.clone()
    }
}

/// DNS JSON body with one answer of `record_type` per entry; no `Answer` key
/// when `data` is empty.
pub fn doh_body(record_type: u16, data: &[&str]) -> Vec<u8> {
    let body = if data.is_empty() {
        json!({ "Status": 0 })
    } else {
        let answers: Vec<_> = data
            .iter()
            .map(|d| json!({ "name": "example.com", "type": record_type, "TTL": 300, "data": d }))
            .collect();
        json!({ "Status": 0, "Answer": answers })
    };
    body.to_string().into_bytes()
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: OutboundRequest) -> TransportResult<TransportResponse> {
        let url = request.url.clone();
        let body_limit = request.body_limit;
        self.calls.lock().await.push(request);

        match self.routes.get(&url).cloned() {
            Some(MockReply::Response {
                status,
                body,
                delay,
            }) => {
                tokio::time::sleep(delay).await;
                Ok(TransportResponse::new(status, body, body_limit))
            }
            Some(MockReply::Failure { error, delay }) => {
                tokio::time::sleep(delay).await;
                Err(error)
            }
            None => Err(TransportError::Connect(format!("no route to {url}"))),
        }
    }
}
