//! Service façade running resolution and the probe fan-out for one domain.

mod aggregator;
mod prober;
mod resolver;

use std::sync::Arc;

use log::debug;

use crate::error::{CheckerError, CheckerResult};
use crate::transport::HttpTransport;
use crate::types::{Address, DEFAULT_DOH_ENDPOINT, DEFAULT_USER_AGENT, Report};

use prober::Prober;
use resolver::Resolver;

#[cfg(any(test, feature = "test-utils"))]
pub(crate) use resolver::doh_query_url;

/// Tunables of the checker pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckerSettings {
    /// DNS JSON endpoint queried for A/AAAA records.
    pub doh_endpoint: String,
    /// `User-Agent` sent with every probe.
    pub user_agent: String,
}

impl Default for CheckerSettings {
    fn default() -> Self {
        Self {
            doh_endpoint: DEFAULT_DOH_ENDPOINT.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Reject empty input; anything else is left to fail at the DNS or HTTPS layer.
fn validate_domain(domain: &str) -> CheckerResult<&str> {
    let domain = domain.trim();
    if domain.is_empty() {
        return Err(CheckerError::ValidationError(
            "Domain name is required".to_string(),
        ));
    }
    Ok(domain)
}

/// Entry point for proxy checks.
///
/// Holds no per-request state; one instance can serve any number of
/// concurrent checks.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use proxyip_checker::{CheckerSettings, ProxyCheckService, ReqwestTransport};
/// # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = Arc::new(ReqwestTransport::new(None)?);
/// let service = ProxyCheckService::new(transport, CheckerSettings::default());
/// let report = service.check("example.com").await?;
/// # Ok(())
/// # }
/// ```
pub struct ProxyCheckService {
    resolver: Resolver,
    prober: Prober,
}

impl ProxyCheckService {
    pub fn new(transport: Arc<dyn HttpTransport>, settings: CheckerSettings) -> Self {
        Self {
            resolver: Resolver::new(Arc::clone(&transport), settings.doh_endpoint),
            prober: Prober::new(transport, settings.user_agent),
        }
    }

    /// Resolve `domain` to its A addresses followed by its AAAA addresses.
    pub async fn resolve(&self, domain: &str) -> CheckerResult<Vec<Address>> {
        let domain = validate_domain(domain)?;
        self.resolver.resolve(domain).await
    }

    /// Probe every address concurrently; `report[i]` belongs to `addresses[i]`.
    pub async fn probe_all(&self, addresses: &[Address], domain: &str) -> Report {
        debug!("[Check] Probing {} address(es) for {domain}", addresses.len());
        aggregator::aggregate(&self.prober, addresses, domain).await
    }

    /// Resolve `domain` and probe every address concurrently.
    ///
    /// The report has exactly one entry per resolved address, in resolution
    /// order. Zero resolved addresses give an empty report.
    pub async fn check(&self, domain: &str) -> CheckerResult<Report> {
        let domain = validate_domain(domain)?;
        let addresses = self.resolver.resolve(domain).await?;
        Ok(self.probe_all(&addresses, domain).await)
    }
}
