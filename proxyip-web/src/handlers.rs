//! Request handler: `?proxyip=<domain>` → resolve → probe → JSON report.

use actix_web::http::header::ContentType;
use actix_web::middleware::{Condition, DefaultHeaders};
use actix_web::{HttpRequest, HttpResponse, web};
use proxyip_checker::ProxyCheckService;
use serde::Deserialize;

use crate::error::ApiError;

/// Shared application state.
pub struct AppState {
    pub checker: ProxyCheckService,
}

#[derive(Debug, Deserialize)]
struct CheckQuery {
    proxyip: Option<String>,
}

/// Every path answers the check; only `proxyip` is recognised.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(check_proxy_ip))
        .default_service(web::to(check_proxy_ip));
}

/// `Access-Control-Allow-Origin: *` on every response when enabled.
pub fn cors(allow_any_origin: bool) -> Condition<DefaultHeaders> {
    Condition::new(
        allow_any_origin,
        DefaultHeaders::new().add(("Access-Control-Allow-Origin", "*")),
    )
}

/// Extract a non-empty `proxyip`. A malformed query string counts as missing.
fn extract_domain(query_string: &str) -> Result<String, ApiError> {
    web::Query::<CheckQuery>::from_query(query_string)
        .ok()
        .and_then(|query| query.into_inner().proxyip)
        .map(|domain| domain.trim().to_string())
        .filter(|domain| !domain.is_empty())
        .ok_or(ApiError::MissingParameter)
}

async fn check_proxy_ip(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let domain = extract_domain(req.query_string()).inspect_err(|_| {
        tracing::debug!(path = req.path(), "rejected request without proxyip");
    })?;

    tracing::debug!(%domain, "resolving");
    let addresses = state.checker.resolve(&domain).await.inspect_err(|e| {
        tracing::warn!(%domain, error = %e, "resolution failed");
    })?;

    tracing::debug!(%domain, count = addresses.len(), "probing");
    let report = state.checker.probe_all(&addresses, &domain).await;

    let reachable = report.iter().filter(|r| r.success).count();
    tracing::info!(%domain, total = report.len(), reachable, "check completed");

    let body = serde_json::to_string_pretty(&report)?;
    Ok(HttpResponse::Ok()
        .content_type(ContentType::json())
        .body(body))
}
