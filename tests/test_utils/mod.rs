//! Test utilities for database and router testing.
//!
//! Sets up in-memory SQLite databases with migrations applied and drives the
//! axum router without binding a socket.

#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use migration::{Migrator, MigratorTrait};
use outreach_crm::{
    config::AppConfig,
    server::{AppState, create_app},
};
use sea_orm::{Database, DatabaseConnection};
use serde_json::{Value, json};
use tower::ServiceExt;

/// Sets up an in-memory SQLite database with all migrations applied.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

/// Configuration tuned for tests: cheap password hashing.
pub fn test_config() -> AppConfig {
    AppConfig {
        password_hash_iterations: 1_000,
        ..AppConfig::default()
    }
}

pub struct TestApp {
    pub router: Router,
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(config: AppConfig) -> Self {
        let db = setup_test_db().await.expect("test database");
        let config = Arc::new(config);
        let router = create_app(AppState {
            config: config.clone(),
            db: db.clone(),
        });
        Self { router, db, config }
    }

    /// Send a request and decode the JSON body (`Value::Null` when empty).
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PATCH, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, Some(token), None).await
    }

    /// Register an account and return its bearer token.
    pub async fn sign_up(&self, email: &str) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/v1/auth/sign-up",
                None,
                Some(json!({
                    "email": email,
                    "password": "secret123",
                    "confirm_password": "secret123",
                    "full_name": "Test Executive",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "sign-up failed: {body}");
        body["data"]["access_token"]
            .as_str()
            .expect("access token")
            .to_string()
    }

    /// Create a college and return its id.
    pub async fn create_college(&self, token: &str, body: Value) -> String {
        let (status, body) = self.post("/api/v1/colleges", token, body).await;
        assert_eq!(status, StatusCode::CREATED, "college create failed: {body}");
        body["data"]["id"].as_str().expect("college id").to_string()
    }
}
