//! Single-address HTTPS probe.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use log::debug;

use crate::transport::{HttpTransport, OutboundRequest};
use crate::types::{Address, PROBE_PORT, ProbeResult, RESPONSE_PREFIX_LIMIT};

/// Bytes needed to hold [`RESPONSE_PREFIX_LIMIT`] characters of UTF-8.
const RESPONSE_PREFIX_BYTES: usize = RESPONSE_PREFIX_LIMIT * 4;

pub(crate) struct Prober {
    transport: Arc<dyn HttpTransport>,
    user_agent: String,
}

impl Prober {
    pub(crate) fn new(transport: Arc<dyn HttpTransport>, user_agent: impl Into<String>) -> Self {
        Self {
            transport,
            user_agent: user_agent.into(),
        }
    }

    /// GET `https://<address>/` presenting `domain` as the virtual host.
    ///
    /// Never fails: transport errors yield `success = false` with no status.
    /// Redirects are not followed, so a 3xx is the recorded status.
    pub(crate) async fn probe(&self, address: Address, domain: &str) -> ProbeResult {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let request = OutboundRequest::get(address.url())
            .header("Host", domain)
            .header("User-Agent", self.user_agent.as_str())
            .host_override(domain)
            .no_redirects()
            .body_limit(RESPONSE_PREFIX_BYTES);

        match self.transport.send(request).await {
            Ok(response) => {
                let response_size = response.body_len;
                let response_data = body_prefix(&response.body);
                debug!(
                    "[Probe] {address} as {domain}: status={}, size={response_size}",
                    response.status
                );
                ProbeResult {
                    success: (200..300).contains(&response.status),
                    proxy_ip: address,
                    port_remote: PROBE_PORT,
                    status_code: Some(response.status),
                    response_size,
                    response_data,
                    timestamp,
                }
            }
            Err(e) => {
                debug!("[Probe] {address} as {domain} failed: {e}");
                ProbeResult {
                    success: false,
                    proxy_ip: address,
                    port_remote: PROBE_PORT,
                    status_code: None,
                    response_size: 0,
                    response_data: String::new(),
                    timestamp,
                }
            }
        }
    }
}

/// First [`RESPONSE_PREFIX_LIMIT`] characters of the retained body bytes
/// (invalid UTF-8 is replaced, not rejected).
///
/// The retained bytes always cover those characters in full, so a sequence
/// split at the byte cut can only affect characters past the limit.
fn body_prefix(body: &[u8]) -> String {
    String::from_utf8_lossy(body)
        .chars()
        .take(RESPONSE_PREFIX_LIMIT)
        .collect()
}
