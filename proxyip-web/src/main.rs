//! Proxy IP checker HTTP entry point.
//!
//! Serves `GET /?proxyip=<domain>`: resolves the domain over DNS-over-HTTPS and
//! reports, per address, whether it answers HTTPS for that domain.

mod config;
mod error;
mod handlers;
mod logging;

use std::sync::Arc;

use actix_web::{App, HttpServer, middleware, web};
use anyhow::Result;
use proxyip_checker::{ProxyCheckService, ReqwestTransport};

use config::AppConfig;
use handlers::AppState;

#[actix_web::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;
    logging::init(&config.logging)?;

    let transport = Arc::new(ReqwestTransport::new(config.checker.request_timeout())?);
    let state = web::Data::new(AppState {
        checker: ProxyCheckService::new(transport, config.checker.settings()),
    });

    let allow_any_origin = config.cors.allow_any_origin;
    let workers = config.server.workers();
    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        workers,
        doh_endpoint = %config.checker.doh_endpoint,
        allow_any_origin,
        "Starting proxy IP checker"
    );

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(handlers::cors(allow_any_origin))
            .wrap(middleware::Logger::default())
            .configure(handlers::routes)
    })
    .workers(workers)
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}
