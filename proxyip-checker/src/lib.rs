//! Proxy IP checker
//!
//! Resolves a domain to its A/AAAA addresses over DNS-over-HTTPS, then probes
//! every address with an HTTPS GET that presents the domain as the virtual host.
//! Each request is independent; nothing is cached between calls.

mod error;
mod services;
mod transport;
mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use error::{CheckerError, CheckerResult};
pub use services::{CheckerSettings, ProxyCheckService};
pub use transport::{
    HttpTransport, OutboundRequest, ReqwestTransport, TransportError, TransportResponse,
    TransportResult,
};
pub use types::{
    Address, DEFAULT_DOH_ENDPOINT, DEFAULT_USER_AGENT, DohAnswer, DohResponse, PROBE_PORT,
    ProbeResult, RESPONSE_PREFIX_LIMIT, Report,
};
