//! DNS-over-HTTPS resolution of A and AAAA records.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

use futures::future::try_join;
use log::debug;
use url::Url;

use crate::error::{CheckerError, CheckerResult};
use crate::transport::{HttpTransport, OutboundRequest};
use crate::types::{Address, DohResponse, RECORD_TYPE_A, RECORD_TYPE_AAAA};

const DNS_JSON_CONTENT_TYPE: &str = "application/dns-json";

/// Address record family queried over DoH.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QueryType {
    A,
    Aaaa,
}

impl QueryType {
    fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::Aaaa => "AAAA",
        }
    }

    fn record_type(self) -> u16 {
        match self {
            Self::A => RECORD_TYPE_A,
            Self::Aaaa => RECORD_TYPE_AAAA,
        }
    }

    fn parse(self, data: &str) -> Option<IpAddr> {
        match self {
            Self::A => data.parse::<Ipv4Addr>().ok().map(IpAddr::from),
            Self::Aaaa => data.parse::<Ipv6Addr>().ok().map(IpAddr::from),
        }
    }
}

/// Build `<endpoint>?name=<domain>&type=<record_type>` with proper encoding.
pub(crate) fn doh_query_url(
    endpoint: &str,
    domain: &str,
    record_type: &str,
) -> CheckerResult<String> {
    Url::parse_with_params(endpoint, &[("name", domain), ("type", record_type)])
        .map(String::from)
        .map_err(|e| CheckerError::ResolutionError(format!("Invalid DoH endpoint {endpoint}: {e}")))
}

pub(crate) struct Resolver {
    transport: Arc<dyn HttpTransport>,
    endpoint: String,
}

impl Resolver {
    pub(crate) fn new(transport: Arc<dyn HttpTransport>, endpoint: impl Into<String>) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
        }
    }

    /// Resolve `domain` to its IPv4 addresses followed by its IPv6 addresses.
    ///
    /// Both queries run concurrently. Either one failing fails the whole
    /// resolution; an empty answer section is not a failure.
    pub(crate) async fn resolve(&self, domain: &str) -> CheckerResult<Vec<Address>> {
        let (ipv4, ipv6) = try_join(
            self.query(domain, QueryType::A),
            self.query(domain, QueryType::Aaaa),
        )
        .await?;

        let mut addresses = ipv4;
        addresses.extend(ipv6);
        debug!("[DoH] {domain} resolved to {} address(es)", addresses.len());
        Ok(addresses)
    }

    async fn query(&self, domain: &str, query_type: QueryType) -> CheckerResult<Vec<Address>> {
        let url = doh_query_url(&self.endpoint, domain, query_type.as_str())?;
        debug!("[DoH] GET {url}");

        let request = OutboundRequest::get(url).header("Accept", DNS_JSON_CONTENT_TYPE);
        let response = self.transport.send(request).await.map_err(|e| {
            CheckerError::ResolutionError(format!(
                "DoH {} query for {domain} failed: {e}",
                query_type.as_str()
            ))
        })?;

        if !(200..300).contains(&response.status) {
            return Err(CheckerError::ResolutionError(format!(
                "DoH {} query for {domain} returned HTTP {}",
                query_type.as_str(),
                response.status
            )));
        }

        let parsed: DohResponse = serde_json::from_slice(&response.body).map_err(|e| {
            CheckerError::ResolutionError(format!(
                "Malformed DoH {} response for {domain}: {e}",
                query_type.as_str()
            ))
        })?;

        if let Some(status) = parsed.status.filter(|&s| s != 0) {
            debug!(
                "[DoH] {} query for {domain} answered with RCODE {status}",
                query_type.as_str()
            );
        }
        extract_addresses(&parsed, query_type)
    }
}

/// Collect the answers of `query_type`, in answer order. Records of other
/// types (CNAME chains and the like) are skipped.
fn extract_addresses(response: &DohResponse, query_type: QueryType) -> CheckerResult<Vec<Address>> {
    let Some(answers) = &response.answer else {
        return Ok(Vec::new());
    };

    answers
        .iter()
        .filter(|record| record.record_type == query_type.record_type())
        .map(|record| {
            query_type.parse(&record.data).map(Address::new).ok_or_else(|| {
                CheckerError::ResolutionError(format!(
                    "Invalid {} record data: {}",
                    query_type.as_str(),
                    record.data
                ))
            })
        })
        .collect()
}
