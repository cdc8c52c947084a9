//! Cache strategies and the install/activate lifecycle.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode, header};
use metrics::counter;
use sha2::{Digest, Sha256};
use url::Url;

use super::GatewayError;
use super::classify::{RequestClass, classify};
use super::network::Network;
use super::storage::{CacheKey, CacheStorage, CachedResponse};
use crate::config::OfflineCacheConfig;

/// A request as seen by the gateway
#[derive(Debug, Clone)]
pub struct GatewayRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl GatewayRequest {
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    fn cache_key(&self) -> CacheKey {
        CacheKey::new(self.method.clone(), &self.url)
    }

    /// Key partitioned by `Authorization` and `Cookie`, so one caller's
    /// responses are never replayed to another
    fn private_key(&self) -> CacheKey {
        self.cache_key().for_credentials(self.credentials_digest())
    }

    fn credentials_digest(&self) -> Option<String> {
        let mut hasher = Sha256::new();
        let mut present = false;
        for name in [header::AUTHORIZATION, header::COOKIE] {
            for value in self.headers.get_all(&name) {
                hasher.update(name.as_str().as_bytes());
                hasher.update(b":");
                hasher.update(value.as_bytes());
                hasher.update(b"\n");
                present = true;
            }
        }
        present.then(|| hex::encode(hasher.finalize()))
    }
}

/// Where an answer came from
#[derive(Debug)]
pub enum GatewayOutcome {
    /// Fresh from the network
    Network(CachedResponse),
    /// Served from a cache
    Cache(CachedResponse),
    /// Neither the network nor any cache could answer
    Miss(GatewayError),
}

impl GatewayOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            GatewayOutcome::Network(_) => "network",
            GatewayOutcome::Cache(_) => "cache",
            GatewayOutcome::Miss(_) => "miss",
        }
    }
}

pub struct OfflineGateway {
    config: OfflineCacheConfig,
    origin: Url,
    network: Arc<dyn Network>,
    storage: CacheStorage,
    claimed: AtomicBool,
}

impl OfflineGateway {
    pub fn new(config: OfflineCacheConfig, network: Arc<dyn Network>) -> Result<Self, GatewayError> {
        let origin = Url::parse(&config.upstream_url)?;
        Ok(Self {
            config,
            origin,
            network,
            storage: CacheStorage::new(),
            claimed: AtomicBool::new(false),
        })
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn storage(&self) -> &CacheStorage {
        &self.storage
    }

    /// Whether `activate` has taken control of clients
    pub fn is_claimed(&self) -> bool {
        self.claimed.load(Ordering::SeqCst)
    }

    /// Pre-cache the application shell. Nothing is stored unless every URL succeeds.
    pub async fn install(&self) -> Result<usize, GatewayError> {
        let mut fetched = Vec::with_capacity(self.config.shell_urls.len());

        for path in &self.config.shell_urls {
            let url = self.origin.join(path)?;
            let response = self.network.fetch(&GatewayRequest::get(url.clone())).await?;
            if !response.is_success() {
                return Err(GatewayError::Install {
                    url: url.to_string(),
                    status: response.status.as_u16(),
                });
            }
            fetched.push((CacheKey::get(&url), response));
        }

        let cache = self.storage.open(&self.config.static_cache_name).await;
        let count = fetched.len();
        for (key, response) in fetched {
            cache.put(key, response).await;
        }

        tracing::info!(
            cache = %self.config.static_cache_name,
            entries = count,
            "Application shell cached"
        );
        Ok(count)
    }

    /// Drop caches from older versions and claim clients. Returns the deleted names.
    pub async fn activate(&self) -> Vec<String> {
        let mut deleted = Vec::new();
        for name in self.storage.keys().await {
            let current =
                name == self.config.static_cache_name || name == self.config.dynamic_cache_name;
            if !current && self.storage.delete(&name).await {
                tracing::info!(cache = %name, "Deleted stale cache");
                deleted.push(name);
            }
        }

        self.claimed.store(true, Ordering::SeqCst);
        deleted
    }

    /// Answer a request using the strategy for its class
    pub async fn handle(&self, request: &GatewayRequest) -> GatewayOutcome {
        if request.url.origin() != self.origin.origin() {
            counter!("offline_cache_rejected_total").increment(1);
            tracing::warn!(url = %request.url, "Refusing request for a foreign origin");
            return GatewayOutcome::Miss(GatewayError::ForeignOrigin {
                url: request.url.to_string(),
            });
        }

        let class = classify(&request.method, &request.url, &request.headers, &self.config);
        let outcome = match class {
            RequestClass::Navigation => self.navigation(request).await,
            RequestClass::Api => self.api(request).await,
            RequestClass::Static => self.static_asset(request).await,
        };

        counter!(
            "offline_cache_requests_total",
            "class" => class.as_str(),
            "outcome" => outcome.label()
        )
        .increment(1);
        tracing::debug!(
            method = %request.method,
            url = %request.url,
            class = class.as_str(),
            outcome = outcome.label(),
            "Gateway request handled"
        );

        outcome
    }

    async fn navigation(&self, request: &GatewayRequest) -> GatewayOutcome {
        match self.network.fetch(request).await {
            Ok(response) => {
                self.store_dynamic(request.private_key(), &response).await;
                GatewayOutcome::Network(response)
            }
            Err(err) => {
                tracing::warn!(url = %request.url, error = %err, "Navigation offline, serving shell");
                let root = match self.origin.join("/") {
                    Ok(root) => self.storage.match_any(&CacheKey::get(&root)).await,
                    Err(_) => None,
                };
                let cached = match root {
                    Some(shell) => Some(shell),
                    None => self.storage.match_any(&request.private_key()).await,
                };
                match cached {
                    Some(response) => GatewayOutcome::Cache(response),
                    None => GatewayOutcome::Miss(err),
                }
            }
        }
    }

    async fn api(&self, request: &GatewayRequest) -> GatewayOutcome {
        match self.network.fetch(request).await {
            Ok(response) => {
                if response.is_success() && request.method == Method::GET {
                    self.store_dynamic(request.private_key(), &response).await;
                }
                GatewayOutcome::Network(response)
            }
            Err(err) => match self.storage.match_any(&request.private_key()).await {
                Some(response) => GatewayOutcome::Cache(response),
                None => GatewayOutcome::Miss(err),
            },
        }
    }

    async fn static_asset(&self, request: &GatewayRequest) -> GatewayOutcome {
        if let Some(response) = self.storage.match_any(&request.cache_key()).await {
            return GatewayOutcome::Cache(response);
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                if response.status == StatusCode::OK
                    && response.basic
                    && request.method == Method::GET
                {
                    self.store_dynamic(request.cache_key(), &response).await;
                }
                GatewayOutcome::Network(response)
            }
            Err(err) => GatewayOutcome::Miss(err),
        }
    }

    async fn store_dynamic(&self, key: CacheKey, response: &CachedResponse) {
        self.storage
            .open(&self.config.dynamic_cache_name)
            .await
            .put(key, response.clone())
            .await;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;
    use axum::http::HeaderValue;

    use super::*;

    const ORIGIN: &str = "http://crm.test";

    #[derive(Default)]
    struct FakeNetwork {
        responses: Mutex<HashMap<String, (StatusCode, &'static str)>>,
        offline: AtomicBool,
        calls: AtomicUsize,
    }

    impl FakeNetwork {
        fn serve(&self, path: &str, status: StatusCode, body: &'static str) {
            self.responses
                .lock()
                .unwrap()
                .insert(format!("{ORIGIN}{path}"), (status, body));
        }

        fn go_offline(&self) {
            self.offline.store(true, Ordering::SeqCst);
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Network for FakeNetwork {
        async fn fetch(&self, request: &GatewayRequest) -> Result<CachedResponse, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.offline.load(Ordering::SeqCst) {
                return Err(GatewayError::network(&request.url, "offline"));
            }
            let (status, body) = self
                .responses
                .lock()
                .unwrap()
                .get(request.url.as_str())
                .copied()
                .unwrap_or((StatusCode::NOT_FOUND, "not found"));
            Ok(CachedResponse {
                status,
                headers: HeaderMap::new(),
                body: Bytes::from_static(body.as_bytes()),
                basic: request.url.origin() == Url::parse(ORIGIN).unwrap().origin(),
            })
        }
    }

    fn gateway() -> (OfflineGateway, Arc<FakeNetwork>) {
        let network = Arc::new(FakeNetwork::default());
        for path in ["/", "/manifest.json", "/favicon.ico", "/placeholder.svg"] {
            network.serve(path, StatusCode::OK, "shell");
        }
        let config = OfflineCacheConfig {
            upstream_url: ORIGIN.to_string(),
            ..OfflineCacheConfig::default()
        };
        let gateway = OfflineGateway::new(config, network.clone()).unwrap();
        (gateway, network)
    }

    fn request(method: Method, path: &str) -> GatewayRequest {
        GatewayRequest {
            method,
            url: Url::parse(ORIGIN).unwrap().join(path).unwrap(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    fn navigate(path: &str) -> GatewayRequest {
        let mut headers = HeaderMap::new();
        headers.insert("sec-fetch-mode", HeaderValue::from_static("navigate"));
        request(Method::GET, path).with_headers(headers)
    }

    #[tokio::test]
    async fn install_is_idempotent() {
        let (gateway, _) = gateway();

        assert_eq!(gateway.install().await.unwrap(), 4);
        assert_eq!(gateway.install().await.unwrap(), 4);

        let cache = gateway.storage().open("static-v2").await;
        assert_eq!(cache.len().await, 4);
        assert_eq!(gateway.storage().keys().await, vec!["static-v2".to_string()]);
    }

    #[tokio::test]
    async fn install_fails_when_a_shell_url_fails() {
        let (gateway, network) = gateway();
        network.serve("/favicon.ico", StatusCode::NOT_FOUND, "missing");

        let err = gateway.install().await.unwrap_err();
        assert!(matches!(err, GatewayError::Install { status: 404, .. }));
        assert!(!gateway.storage().has("static-v2").await);
    }

    #[tokio::test]
    async fn activate_keeps_only_current_caches() {
        let (gateway, _) = gateway();
        gateway.storage().open("static-v1").await;
        gateway.storage().open("dynamic-v1").await;
        gateway.install().await.unwrap();
        gateway.storage().open("dynamic-v2").await;

        let mut deleted = gateway.activate().await;
        deleted.sort();

        assert_eq!(deleted, vec!["dynamic-v1".to_string(), "static-v1".to_string()]);
        assert_eq!(
            gateway.storage().keys().await,
            vec!["static-v2".to_string(), "dynamic-v2".to_string()]
        );
        assert!(gateway.is_claimed());
    }

    #[tokio::test]
    async fn navigation_refreshes_cache_and_falls_back_to_shell() {
        let (gateway, network) = gateway();
        network.serve("/colleges", StatusCode::OK, "colleges page");
        gateway.install().await.unwrap();

        let outcome = gateway.handle(&navigate("/colleges")).await;
        assert!(matches!(outcome, GatewayOutcome::Network(_)));
        let dynamic = gateway.storage().open("dynamic-v2").await;
        let key = request(Method::GET, "/colleges").cache_key();
        assert_eq!(dynamic.get(&key).await.unwrap().body, Bytes::from_static(b"colleges page"));

        network.go_offline();
        match gateway.handle(&navigate("/colleges")).await {
            GatewayOutcome::Cache(response) => {
                assert_eq!(response.body, Bytes::from_static(b"shell"))
            }
            other => panic!("expected cached shell, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn navigation_without_shell_uses_cached_page() {
        let (gateway, network) = gateway();
        network.serve("/tasks", StatusCode::OK, "tasks page");

        gateway.handle(&navigate("/tasks")).await;
        network.go_offline();

        match gateway.handle(&navigate("/tasks")).await {
            GatewayOutcome::Cache(response) => {
                assert_eq!(response.body, Bytes::from_static(b"tasks page"))
            }
            other => panic!("expected cached page, got {other:?}"),
        }
        assert!(matches!(
            gateway.handle(&navigate("/team")).await,
            GatewayOutcome::Miss(_)
        ));
    }

    #[tokio::test]
    async fn failed_api_get_serves_last_success() {
        let (gateway, network) = gateway();
        network.serve("/api/v1/colleges", StatusCode::OK, "[1]");

        let outcome = gateway.handle(&request(Method::GET, "/api/v1/colleges")).await;
        assert!(matches!(outcome, GatewayOutcome::Network(_)));

        network.go_offline();
        match gateway.handle(&request(Method::GET, "/api/v1/colleges")).await {
            GatewayOutcome::Cache(response) => assert_eq!(response.body, Bytes::from_static(b"[1]")),
            other => panic!("expected cached api response, got {other:?}"),
        }
        assert!(matches!(
            gateway.handle(&request(Method::GET, "/api/v1/tasks")).await,
            GatewayOutcome::Miss(GatewayError::Network { .. })
        ));
    }

    #[tokio::test]
    async fn api_errors_and_writes_are_not_cached() {
        let (gateway, network) = gateway();
        network.serve("/api/v1/tasks", StatusCode::INTERNAL_SERVER_ERROR, "boom");

        gateway.handle(&request(Method::GET, "/api/v1/tasks")).await;
        gateway.handle(&request(Method::POST, "/api/v1/tasks")).await;

        let dynamic = gateway.storage().open("dynamic-v2").await;
        assert!(dynamic.is_empty().await);
    }

    #[tokio::test]
    async fn static_hit_skips_network() {
        let (gateway, network) = gateway();
        gateway.install().await.unwrap();
        let before = network.calls();

        let outcome = gateway.handle(&request(Method::GET, "/favicon.ico")).await;

        assert!(matches!(outcome, GatewayOutcome::Cache(_)));
        assert_eq!(network.calls(), before);
    }

    #[tokio::test]
    async fn static_miss_caches_only_ok_responses() {
        let (gateway, network) = gateway();
        network.serve("/assets/app.js", StatusCode::OK, "js");

        gateway.handle(&request(Method::GET, "/assets/app.js")).await;
        gateway.handle(&request(Method::GET, "/assets/missing.js")).await;

        let dynamic = gateway.storage().open("dynamic-v2").await;
        let keys: Vec<String> = dynamic.keys().await.into_iter().map(|key| key.url).collect();
        assert_eq!(keys, vec![format!("{ORIGIN}/assets/app.js")]);
    }

    #[tokio::test]
    async fn foreign_origins_are_never_fetched() {
        let (gateway, network) = gateway();
        let external =
            GatewayRequest::get(Url::parse("http://169.254.169.254/latest/meta-data").unwrap());

        let outcome = gateway.handle(&external).await;

        assert!(matches!(
            outcome,
            GatewayOutcome::Miss(GatewayError::ForeignOrigin { .. })
        ));
        assert_eq!(network.calls(), 0);
        assert!(gateway.storage().keys().await.is_empty());
    }

    fn with_auth(path: &str, value: &'static str) -> GatewayRequest {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static(value));
        request(Method::GET, path).with_headers(headers)
    }

    #[tokio::test]
    async fn cached_api_responses_stay_with_their_credentials() {
        let (gateway, network) = gateway();
        network.serve("/api/v1/auth/me", StatusCode::OK, "alice");

        gateway
            .handle(&with_auth("/api/v1/auth/me", "Bearer alice-token"))
            .await;
        network.go_offline();

        assert!(matches!(
            gateway.handle(&request(Method::GET, "/api/v1/auth/me")).await,
            GatewayOutcome::Miss(_)
        ));
        assert!(matches!(
            gateway
                .handle(&with_auth("/api/v1/auth/me", "Bearer mallory-token"))
                .await,
            GatewayOutcome::Miss(_)
        ));
        match gateway
            .handle(&with_auth("/api/v1/auth/me", "Bearer alice-token"))
            .await
        {
            GatewayOutcome::Cache(response) => {
                assert_eq!(response.body, Bytes::from_static(b"alice"))
            }
            other => panic!("expected alice's cached response, got {other:?}"),
        }
    }
}
