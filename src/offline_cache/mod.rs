//! # Offline cache gateway
//!
//! A caching proxy that sits in front of the CRM origin and keeps the app
//! usable while the network is flaky. Requests are classified as page
//! navigations, API calls or static assets, and each class follows its own
//! strategy:
//!
//! - navigations go to the network first, cache whatever comes back, and fall
//!   back to the cached application shell;
//! - API calls go to the network first and only successful `GET`s are cached;
//! - static assets are served from cache when present.
//!
//! The gateway also has an install/activate lifecycle: `install` pre-caches the
//! shell URLs, `activate` drops caches left behind by older versions.

use thiserror::Error;

pub mod classify;
pub mod gateway;
pub mod network;
pub mod proxy;
pub mod storage;

pub use classify::{RequestClass, classify};
pub use gateway::{GatewayOutcome, GatewayRequest, OfflineGateway};
pub use network::{HttpNetwork, Network};
pub use proxy::{gateway_router, run_gateway};
pub use storage::{Cache, CacheKey, CacheStorage, CachedResponse};

/// Errors raised by the gateway
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("network request to {url} failed: {details}")]
    Network { url: String, details: String },

    #[error("install failed: {url} returned status {status}")]
    Install { url: String, status: u16 },

    #[error("refusing to forward to foreign origin {url}")]
    ForeignOrigin { url: String },

    #[error("invalid gateway url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("http client error: {0}")]
    Client(String),
}

impl GatewayError {
    pub fn network<S: Into<String>>(url: &url::Url, details: S) -> Self {
        Self::Network {
            url: url.to_string(),
            details: details.into(),
        }
    }
}
