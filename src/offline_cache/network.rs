//! Outbound fetches for the gateway.

use std::time::Duration;

use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderName, header};
use reqwest::Client;
use url::Url;

use super::GatewayError;
use super::gateway::GatewayRequest;
use super::storage::CachedResponse;

/// Something that can answer a request over the network
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &GatewayRequest) -> Result<CachedResponse, GatewayError>;
}

/// `reqwest`-backed network bound to the origin the gateway fronts
#[derive(Debug, Clone)]
pub struct HttpNetwork {
    client: Client,
    origin: Url,
}

impl HttpNetwork {
    pub fn new(origin: Url, timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| GatewayError::Client(err.to_string()))?;

        Ok(Self { client, origin })
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &GatewayRequest) -> Result<CachedResponse, GatewayError> {
        let mut headers = request.headers.clone();
        strip_hop_by_hop(&mut headers);
        headers.remove(header::HOST);

        let response = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(headers)
            .body(request.body.clone())
            .send()
            .await
            .map_err(|err| GatewayError::network(&request.url, err.to_string()))?;

        let status = response.status();
        let basic = response.url().origin() == self.origin.origin();
        let mut headers = response.headers().clone();
        strip_hop_by_hop(&mut headers);
        headers.remove(header::CONTENT_LENGTH);

        let body = response
            .bytes()
            .await
            .map_err(|err| GatewayError::network(&request.url, err.to_string()))?;

        tracing::debug!(
            method = %request.method,
            url = %request.url,
            status = status.as_u16(),
            bytes = body.len(),
            "Upstream fetch completed"
        );

        Ok(CachedResponse {
            status,
            headers,
            body,
            basic,
        })
    }
}

/// Drop connection-scoped headers that must not be forwarded
pub(crate) fn strip_hop_by_hop(headers: &mut HeaderMap) {
    const HOP_BY_HOP: [HeaderName; 6] = [
        header::CONNECTION,
        header::PROXY_AUTHENTICATE,
        header::PROXY_AUTHORIZATION,
        header::TE,
        header::TRAILER,
        header::TRANSFER_ENCODING,
    ];

    for name in HOP_BY_HOP {
        headers.remove(name);
    }
    headers.remove(header::UPGRADE);
    headers.remove("keep-alive");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn hop_by_hop_headers_are_removed() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/html"));

        strip_hop_by_hop(&mut headers);

        assert_eq!(headers.len(), 1);
        assert!(headers.contains_key(header::CONTENT_TYPE));
    }
}
