//! Gateway tests against a mocked upstream

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use outreach_crm::config::OfflineCacheConfig;
use outreach_crm::offline_cache::{
    GatewayError, GatewayOutcome, GatewayRequest, HttpNetwork, Network, OfflineGateway,
    gateway_router,
};
use tower::ServiceExt;
use url::Url;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

const TIMEOUT: Duration = Duration::from_millis(500);

async fn mount_shell(server: &MockServer) {
    for shell in ["/", "/manifest.json", "/favicon.ico", "/placeholder.svg"] {
        Mock::given(method("GET"))
            .and(path(shell))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!("shell:{shell}")))
            .up_to_n_times(1)
            .mount(server)
            .await;
    }
}

/// Anything not matched earlier hangs past the client timeout.
async fn mount_outage(server: &MockServer) {
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(server)
        .await;
}

fn gateway_for(server: &MockServer) -> OfflineGateway {
    let config = OfflineCacheConfig {
        upstream_url: server.uri(),
        ..OfflineCacheConfig::default()
    };
    let origin = Url::parse(&server.uri()).unwrap();
    let network = HttpNetwork::new(origin, TIMEOUT).unwrap();
    OfflineGateway::new(config, Arc::new(network)).unwrap()
}

#[tokio::test]
async fn http_network_forwards_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/colleges"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/json")
                .set_body_string("[]"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let origin = Url::parse(&server.uri()).unwrap();
    let network = HttpNetwork::new(origin.clone(), Duration::from_secs(2)).unwrap();
    let response = network
        .fetch(&GatewayRequest::get(origin.join("/api/v1/colleges").unwrap()))
        .await
        .unwrap();

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.basic);
    assert_eq!(response.body.as_ref(), b"[]");
    assert_eq!(response.headers["content-type"], "application/json");
}

#[tokio::test]
async fn http_network_reports_connection_failures() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let origin = Url::parse(&format!("http://{}", listener.local_addr().unwrap())).unwrap();
    drop(listener);

    let network = HttpNetwork::new(origin.clone(), TIMEOUT).unwrap();
    let err = network
        .fetch(&GatewayRequest::get(origin.join("/").unwrap()))
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::Network { .. }));
}

#[tokio::test]
async fn install_caches_shell_from_upstream() {
    let server = MockServer::start().await;
    mount_shell(&server).await;
    let gateway = gateway_for(&server);

    assert_eq!(gateway.install().await.unwrap(), 4);
    gateway.activate().await;

    let outcome = gateway
        .handle(&GatewayRequest::get(
            gateway.origin().join("/manifest.json").unwrap(),
        ))
        .await;
    match outcome {
        GatewayOutcome::Cache(response) => {
            assert_eq!(response.body.as_ref(), b"shell:/manifest.json")
        }
        other => panic!("expected cache hit, got {other:?}"),
    }
}

#[tokio::test]
async fn install_fails_on_missing_shell_asset() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    let gateway = gateway_for(&server);

    let err = gateway.install().await.unwrap_err();
    assert!(matches!(err, GatewayError::Install { status: 404, .. }));
}

#[tokio::test]
async fn proxy_serves_cached_api_response_when_upstream_errors() {
    let server = MockServer::start().await;
    mount_shell(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[\"cached\"]"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_outage(&server).await;

    let gateway = Arc::new(gateway_for(&server));
    gateway.install().await.unwrap();
    gateway.activate().await;
    let router = gateway_router(gateway.clone());

    let first = router
        .clone()
        .oneshot(Request::get("/api/v1/tasks").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(first.headers()["x-offline-cache"], "network");

    let second = router
        .clone()
        .oneshot(Request::get("/api/v1/tasks").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(second.headers()["x-offline-cache"], "cache");
    let body = to_bytes(second.into_body(), usize::MAX).await.unwrap();
    assert_eq!(body.as_ref(), b"[\"cached\"]");

    let miss = router
        .oneshot(Request::get("/api/v1/colleges").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(miss.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn proxy_navigation_falls_back_to_shell() {
    let server = MockServer::start().await;
    mount_shell(&server).await;

    let gateway = Arc::new(gateway_for(&server));
    gateway.install().await.unwrap();
    gateway.activate().await;
    let router = gateway_router(gateway);
    mount_outage(&server).await;

    let response = router
        .oneshot(
            Request::get("/colleges/42")
                .header("sec-fetch-mode", "navigate")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(body.as_ref(), b"shell:/");
}

#[tokio::test]
async fn proxy_never_caches_writes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/tasks"))
        .respond_with(ResponseTemplate::new(201).set_body_string("{}"))
        .mount(&server)
        .await;

    let gateway = Arc::new(gateway_for(&server));
    let router = gateway_router(gateway.clone());

    let response = router
        .oneshot(
            Request::post("/api/v1/tasks")
                .header("content-type", "application/json")
                .body(Body::from("{\"title\":\"x\"}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let dynamic = gateway.storage().open("dynamic-v2").await;
    assert!(dynamic.is_empty().await);
}

#[tokio::test]
async fn proxy_refuses_foreign_origins() {
    let upstream = MockServer::start().await;
    let internal = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/latest/meta-data"))
        .respond_with(ResponseTemplate::new(200).set_body_string("internal-secret"))
        .mount(&internal)
        .await;

    let router = gateway_router(Arc::new(gateway_for(&upstream)));
    let response = router
        .oneshot(
            Request::get(format!("{}/latest/meta-data", internal.uri()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::MISDIRECTED_REQUEST);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(!String::from_utf8_lossy(&body).contains("internal-secret"));
    assert!(internal.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn proxy_does_not_share_authenticated_responses() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"email\":\"alice@example.com\"}"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_outage(&server).await;

    let router = gateway_router(Arc::new(gateway_for(&server)));
    let me = |token: Option<&str>| {
        let mut builder = Request::get("/api/v1/auth/me");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    };

    let first = router.clone().oneshot(me(Some("alice-token"))).await.unwrap();
    assert_eq!(first.headers()["x-offline-cache"], "network");

    let anonymous = router.clone().oneshot(me(None)).await.unwrap();
    assert_eq!(anonymous.status(), StatusCode::BAD_GATEWAY);

    let other = router.clone().oneshot(me(Some("mallory-token"))).await.unwrap();
    assert_eq!(other.status(), StatusCode::BAD_GATEWAY);

    let again = router.oneshot(me(Some("alice-token"))).await.unwrap();
    assert_eq!(again.status(), StatusCode::OK);
    assert_eq!(again.headers()["x-offline-cache"], "cache");
}
