//! Public types produced by the checker and the DoH wire schema.

use std::fmt;
use std::net::IpAddr;

use serde::{Deserialize, Serialize, Serializer};

/// Remote port reported for every probe. Only HTTPS on 443 is supported.
pub const PROBE_PORT: u16 = 443;

/// Maximum number of characters of the response body kept in a [`ProbeResult`].
pub const RESPONSE_PREFIX_LIMIT: usize = 512;

/// Public DNS-over-HTTPS JSON endpoint queried by default.
pub const DEFAULT_DOH_ENDPOINT: &str = "https://1.1.1.1/dns-query";

/// User agent sent with every probe.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (checkproxy)";

/// DNS record type for IPv4 address records.
pub(crate) const RECORD_TYPE_A: u16 = 1;
/// DNS record type for IPv6 address records.
pub(crate) const RECORD_TYPE_AAAA: u16 = 28;

/// A resolved candidate address.
///
/// Displays as the bare IPv4 literal or the bracket-wrapped IPv6 literal, the
/// form used in a URL authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address(IpAddr);

impl Address {
    pub fn new(ip: IpAddr) -> Self {
        Self(ip)
    }

    /// Probe URL for this address: `https://<address>/`.
    pub fn url(&self) -> String {
        format!("https://{self}/")
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            IpAddr::V4(v4) => write!(f, "{v4}"),
            IpAddr::V6(v6) => write!(f, "[{v6}]"),
        }
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// Outcome of probing one address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeResult {
    /// `true` iff an HTTP exchange completed with a 2xx status.
    pub success: bool,
    /// The probed address.
    #[serde(rename = "proxyIP")]
    pub proxy_ip: Address,
    /// Always [`PROBE_PORT`].
    pub port_remote: u16,
    /// HTTP status code; `None` when the transport failed.
    pub status_code: Option<u16>,
    /// Full response body length in bytes.
    pub response_size: usize,
    /// First [`RESPONSE_PREFIX_LIMIT`] characters of the body.
    pub response_data: String,
    /// ISO-8601 UTC timestamp taken just before dispatch.
    pub timestamp: String,
}

/// Ordered probe results, one per resolved address, in resolution order.
pub type Report = Vec<ProbeResult>;

/// DNS JSON response (`application/dns-json`).
///
/// Only the fields the checker reads are modelled; unknown fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct DohResponse {
    /// DNS RCODE (0 = `NOERROR`, 3 = `NXDOMAIN`).
    #[serde(rename = "Status", default)]
    pub status: Option<u32>,
    /// Answer section; absent when there are no answers.
    #[serde(rename = "Answer", default)]
    pub answer: Option<Vec<DohAnswer>>,
}

/// One record of the DNS JSON answer section.
#[derive(Debug, Clone, Deserialize)]
pub struct DohAnswer {
    /// Numeric record type (1 = A, 28 = AAAA, 5 = CNAME, ...).
    #[serde(rename = "type")]
    pub record_type: u16,
    /// Record data; the address literal for A/AAAA records.
    pub data: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_address_display_v4() {
        let addr = Address::new("203.0.113.5".parse().unwrap());
        assert_eq!(addr.to_string(), "203.0.113.5");
        assert_eq!(addr.url(), "https://203.0.113.5/");
    }

    #[test]
    fn test_address_display_v6_bracketed() {
        let addr = Address::new("2001:db8::1".parse().unwrap());
        assert_eq!(addr.to_string(), "[2001:db8::1]");
        assert_eq!(addr.url(), "https://[2001:db8::1]/");
    }

    #[test]
    fn test_probe_result_wire_names() {
        let result = ProbeResult {
            success: false,
            proxy_ip: Address::new("2001:db8::1".parse().unwrap()),
            port_remote: PROBE_PORT,
            status_code: None,
            response_size: 0,
            response_data: String::new(),
            timestamp: "2024-01-01T00:00:00.000Z".to_string(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "success": false,
                "proxyIP": "[2001:db8::1]",
                "portRemote": 443,
                "statusCode": null,
                "responseSize": 0,
                "responseData": "",
                "timestamp": "2024-01-01T00:00:00.000Z",
            })
        );
    }

    #[test]
    fn test_doh_response_without_answer() {
        let parsed: DohResponse = serde_json::from_str(r#"{"Status":3,"TC":false}"#).unwrap();
        assert_eq!(parsed.status, Some(3));
        assert!(parsed.answer.is_none());
    }

    #[test]
    fn test_doh_response_with_answers() {
        let body = r#"{
            "Status": 0,
            "Answer": [
                {"name": "www.example.com", "type": 5, "TTL": 60, "data": "example.com."},
                {"name": "example.com", "type": 1, "TTL": 300, "data": "93.184.216.34"}
            ]
        }"#;
        let parsed: DohResponse = serde_json::from_str(body).unwrap();
        let answer = parsed.answer.unwrap();
        assert_eq!(answer.len(), 2);
        assert_eq!(answer[1].record_type, RECORD_TYPE_A);
        assert_eq!(answer[1].data, "93.184.216.34");
        assert_eq!(answer[0].record_type, 5);
    }

    #[test]
    fn test_doh_response_rejects_untyped_answer() {
        let body = r#"{"Answer": [{"data": "1.2.3.4"}]}"#;
        assert!(serde_json::from_str::<DohResponse>(body).is_err());
    }
}
