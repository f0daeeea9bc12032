//! Concurrent fan-out of the prober over every resolved address.

use futures::future::join_all;

use crate::types::{Address, Report};

use super::prober::Prober;

/// Probe every address at once and return the results in input order.
///
/// `join_all` yields outputs positionally aligned with its inputs, so
/// `report[i]` always belongs to `addresses[i]` whatever the completion order.
/// Probes are infallible, so one address failing cannot affect another.
pub(crate) async fn aggregate(prober: &Prober, addresses: &[Address], domain: &str) -> Report {
    let probes = addresses
        .iter()
        .map(|&address| prober.probe(address, domain));
    join_all(probes).await
}
