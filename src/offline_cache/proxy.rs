//! HTTP front for the offline gateway.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    Router,
    body::Body,
    extract::{Request, State},
    http::{HeaderValue, StatusCode, Uri},
    middleware::from_fn,
    response::Response,
};
use tower_http::trace::TraceLayer;
use url::Url;

use super::gateway::{GatewayOutcome, GatewayRequest, OfflineGateway};
use super::network::HttpNetwork;
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::server::shutdown_signal;
use crate::telemetry::trace_id_middleware;

const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;
const CACHE_STATUS_HEADER: &str = "x-offline-cache";

/// Router that sends every request through the gateway
pub fn gateway_router(gateway: Arc<OfflineGateway>) -> Router {
    Router::new()
        .fallback(forward)
        .with_state(gateway)
        .layer(TraceLayer::new_for_http())
        .layer(from_fn(trace_id_middleware))
}

async fn forward(
    State(gateway): State<Arc<OfflineGateway>>,
    request: Request,
) -> Result<Response, ApiError> {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|err| {
            ApiError::new(
                StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
                format!("Request body could not be read: {err}"),
            )
        })?;

    let url = target_url(gateway.origin(), &parts.uri).map_err(|err| {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_FAILED",
            format!("Invalid request target: {err}"),
        )
    })?;
    if url.origin() != gateway.origin().origin() {
        tracing::warn!(url = %url, "Rejected request for a foreign origin");
        return Err(ApiError::new(
            StatusCode::MISDIRECTED_REQUEST,
            "MISDIRECTED_REQUEST",
            "Gateway only forwards to its configured upstream",
        ));
    }

    let request = GatewayRequest {
        method: parts.method,
        url,
        headers: parts.headers,
        body,
    };

    let outcome = gateway.handle(&request).await;
    let source = outcome.label();
    let cached = match outcome {
        GatewayOutcome::Network(response) | GatewayOutcome::Cache(response) => response,
        GatewayOutcome::Miss(err) => {
            tracing::warn!(url = %request.url, error = %err, "Gateway could not answer request");
            return Err(ApiError::new(
                StatusCode::BAD_GATEWAY,
                "BAD_GATEWAY",
                "Upstream unavailable and no cached response",
            ));
        }
    };

    let mut response = Response::new(Body::from(cached.body));
    *response.status_mut() = cached.status;
    *response.headers_mut() = cached.headers;
    response
        .headers_mut()
        .insert(CACHE_STATUS_HEADER, HeaderValue::from_static(source));
    Ok(response)
}

/// Absolute-form targets keep their own origin so the caller can reject them;
/// everything else is resolved against the upstream.
fn target_url(origin: &Url, uri: &Uri) -> Result<Url, url::ParseError> {
    if uri.authority().is_some() {
        return Url::parse(&uri.to_string());
    }
    let path = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    origin.join(path)
}

/// Install and activate the gateway, then serve until shutdown
pub async fn run_gateway(config: AppConfig) -> anyhow::Result<()> {
    let offline = config.offline_cache;
    let addr = offline
        .gateway_bind_addr()
        .context("Invalid gateway address")?;
    let origin = Url::parse(&offline.upstream_url).context("Invalid upstream URL")?;

    let network = HttpNetwork::new(origin, Duration::from_millis(offline.upstream_timeout_ms))?;
    let gateway = Arc::new(OfflineGateway::new(offline, Arc::new(network))?);

    gateway
        .install()
        .await
        .context("Offline cache install failed")?;
    let deleted = gateway.activate().await;
    tracing::info!(deleted = deleted.len(), "Offline cache activated");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(%addr, upstream = %gateway.origin(), "Offline gateway listening");

    axum::serve(listener, gateway_router(gateway))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Gateway terminated unexpectedly")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_targets_resolve_against_upstream() {
        let origin = Url::parse("http://127.0.0.1:8080").unwrap();
        let uri: Uri = "/api/v1/colleges?search=iit".parse().unwrap();

        let url = target_url(&origin, &uri).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/api/v1/colleges?search=iit");
    }

    #[test]
    fn absolute_targets_keep_their_origin() {
        let origin = Url::parse("http://127.0.0.1:8080").unwrap();
        let uri: Uri = "https://fonts.example.com/css?family=Inter".parse().unwrap();

        let url = target_url(&origin, &uri).unwrap();
        assert_eq!(url.host_str(), Some("fonts.example.com"));
    }
}
