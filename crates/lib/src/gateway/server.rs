//! Gateway HTTP server and daemon startup.

use crate::config::{self, Config};
use crate::driver::{DriverSettings, ModemDriver};
use crate::modem::HilinkClient;
use crate::platform::PlaySmsClient;
use crate::poller::InboxPoller;
use anyhow::{Context, Result};
use axum::{
    extract::{RawQuery, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Shared state for the HTTP handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub driver: ModemDriver,
    /// Modem base URL, reported by the health probe.
    pub modem_url: Arc<str>,
}

/// Routes: `GET /` health, `GET /api/send_sms`; anything else is 401.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(health_http))
        .route("/api/send_sms", get(send_sms_http))
        .fallback(unknown_api)
        .with_state(state)
}

/// Run the daemon: modem worker, inbox poller (when playSMS is configured) and the HTTP server,
/// until SIGINT/SIGTERM.
pub async fn run_gateway(config: Config) -> Result<()> {
    let bind = config.gateway.bind.trim().to_string();
    if !config::is_loopback_bind(&bind) {
        log::warn!(
            "gateway bound to {}: /api/send_sms has no authentication, keep it behind a firewall",
            bind
        );
    }

    let client = HilinkClient::new(&config.modem).context("building modem HTTP client")?;
    let modem_url: Arc<str> = Arc::from(client.base_url());
    let (driver, worker) = ModemDriver::spawn(client, DriverSettings::from_config(&config));
    let poller = start_poller(&config, &driver)?;

    let app = router(GatewayState {
        driver: driver.clone(),
        modem_url,
    });
    let bind_addr = format!("{}:{}", bind, config.gateway.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("gateway listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway server exited")?;

    if let Some(p) = poller {
        p.abort();
    }
    if let Err(e) = driver.stop().await {
        log::debug!("modem worker stop: {}", e);
    }
    let _ = worker.await;
    log::info!("gateway stopped");
    Ok(())
}

fn start_poller(config: &Config, driver: &ModemDriver) -> Result<Option<JoinHandle<()>>> {
    let Some(url) = config
        .playsms
        .callback_url
        .as_ref()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
    else {
        log::warn!("playsms.callbackUrl not set; received SMS will stay on the modem");
        return Ok(None);
    };
    let authcode = config::resolve_playsms_authcode(config);
    if authcode.is_none() {
        log::warn!("no playSMS authcode configured (playsms.authcode or PLAYSMS_AUTHCODE)");
    }
    let sink = PlaySmsClient::new(&config.playsms, url, authcode)
        .context("building playSMS HTTP client")?;
    let poller = InboxPoller::new(driver.clone(), Arc::new(sink), &config.poller);
    Ok(Some(poller.start()))
}

/// Completes on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                log::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, stopping gateway");
}

/// GET / returns a simple health JSON (for probes).
async fn health_http(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    Json(json!({
        "runtime": "running",
        "modem": &*state.modem_url,
    }))
}

/// GET /api/send_sms?msisdn=..&msisdn=..&message=..; msisdn repeats once per recipient.
async fn send_sms_http(
    State(state): State<GatewayState>,
    RawQuery(query): RawQuery,
) -> (StatusCode, Json<serde_json::Value>) {
    let query = query.unwrap_or_default();
    let mut numbers = Vec::new();
    let mut message: Option<String> = None;
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            "msisdn" => {
                let n = value.trim();
                if !n.is_empty() {
                    numbers.push(n.to_string());
                }
            }
            "message" if message.is_none() => message = Some(value.into_owned()),
            _ => {}
        }
    }
    let Some(text) = message else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "missing message" })),
        );
    };
    if numbers.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "missing msisdn" })),
        );
    }
    match state.driver.send_sms(numbers, text).await {
        Ok(Some(index)) => {
            log::debug!("send_sms resolved to modem index {}", index);
            (StatusCode::OK, Json(json!("OK")))
        }
        // accepted by the modem, only the index is unknown
        Ok(None) => (StatusCode::OK, Json(json!("OK"))),
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(json!({ "error": e.to_string() })),
        ),
    }
}

async fn unknown_api() -> (StatusCode, &'static str) {
    (StatusCode::UNAUTHORIZED, "Unknown API call\n")
}
