use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderName, Method, header},
    middleware::Next,
    response::Response,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

use super::state::AppState;

/// CORS as expected by web clients: GET from any origin
pub fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_origin(Any)
        .allow_headers([
            header::ACCEPT,
            header::ACCEPT_LANGUAGE,
            header::CONTENT_TYPE,
            header::ORIGIN,
            header::ACCEPT_ENCODING,
            header::CONTENT_LANGUAGE,
            HeaderName::from_static("x-requested-with"),
        ])
}

/// Log every handled request with its duration
///
/// Client IPs and user agents are only logged when enabled in
/// `[logging]`. Each request runs in a span carrying a UUIDv7 request id.
pub async fn log_requests(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let logging = &state.config.logging;
    let request_id = Uuid::now_v7();
    let method = request.method().clone();
    let url = request.uri().to_string();

    let ip = logging.log_ips.then(|| {
        let peer = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_default();
        let forwarded_for = request
            .headers()
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        (peer, forwarded_for)
    });
    let user_agent = logging.log_user_agent.then(|| {
        request
            .headers()
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    });

    let span = info_span!("request", request_id = %request_id);
    let start = Instant::now();
    let response = next.run(request).instrument(span.clone()).await;
    let duration_ms = start.elapsed().as_millis() as u64;

    let _guard = span.enter();
    let status = response.status().as_u16();
    match (ip, user_agent) {
        (Some((ip, forwarded_for)), Some(user_agent)) => info!(
            %method, url = %url, status, duration_ms, ip = %ip,
            forwarded_for = %forwarded_for, user_agent = %user_agent,
            "Handled request"
        ),
        (Some((ip, forwarded_for)), None) => info!(
            %method, url = %url, status, duration_ms, ip = %ip,
            forwarded_for = %forwarded_for,
            "Handled request"
        ),
        (None, Some(user_agent)) => info!(
            %method, url = %url, status, duration_ms, user_agent = %user_agent,
            "Handled request"
        ),
        (None, None) => info!(%method, url = %url, status, duration_ms, "Handled request"),
    }

    response
}
