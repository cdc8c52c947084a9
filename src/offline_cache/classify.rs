//! Request classification for the gateway.

use axum::http::{HeaderMap, Method, header::ACCEPT};
use serde::Serialize;
use url::Url;

use crate::config::OfflineCacheConfig;

const SEC_FETCH_MODE: &str = "sec-fetch-mode";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestClass {
    Navigation,
    Api,
    Static,
}

impl RequestClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestClass::Navigation => "navigation",
            RequestClass::Api => "api",
            RequestClass::Static => "static",
        }
    }
}

/// Decide which caching strategy applies. Navigation wins over the API rules.
pub fn classify(
    method: &Method,
    url: &Url,
    headers: &HeaderMap,
    config: &OfflineCacheConfig,
) -> RequestClass {
    if is_navigation(method, headers) {
        return RequestClass::Navigation;
    }

    let host = url.host_str().unwrap_or_default();
    let backend_host = config
        .backend_host_markers
        .iter()
        .filter(|marker| !marker.is_empty())
        .any(|marker| host.contains(marker.as_str()));

    if url.path().starts_with(&config.api_prefix) || backend_host {
        RequestClass::Api
    } else {
        RequestClass::Static
    }
}

fn is_navigation(method: &Method, headers: &HeaderMap) -> bool {
    if method != Method::GET {
        return false;
    }

    if let Some(mode) = headers.get(SEC_FETCH_MODE) {
        return mode.as_bytes().eq_ignore_ascii_case(b"navigate");
    }

    headers
        .get(ACCEPT)
        .and_then(|value| value.to_str().ok())
        .and_then(|accept| accept.split(',').next())
        .map(|first| first.trim().starts_with("text/html"))
        .unwrap_or(false)
}
