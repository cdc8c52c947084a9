//! # Authentication
//!
//! Session bearer authentication for the protected API. A session token is
//! issued on sign-in or sign-up; only its SHA-256 digest is persisted, and
//! the middleware resolves the digest back to a user on every request.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::{ApiError, unauthorized};
use crate::models::user::Model as UserModel;
use crate::password::{generate_session_token, hash_session_token};
use crate::repositories::{SessionRepository, UserRepository};
use crate::server::AppState;

/// Signed-in user, inserted into request extensions by [`auth_middleware`]
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    /// Digest of the token that authenticated this request
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

/// Freshly issued session token; the plaintext is only ever returned here
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Authentication middleware that resolves the bearer token to a session
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(request.headers())?;
    let user = authenticate(&state.db, token, Utc::now()).await?;

    tracing::debug!(user_id = %user.id, "Authenticated request");

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| unauthorized(Some("Missing Authorization header")))?
        .to_str()
        .map_err(|_| unauthorized(Some("Invalid Authorization header")))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| unauthorized(Some("Authorization header must use Bearer scheme")))?
        .trim();

    if token.is_empty() {
        return Err(unauthorized(Some("Missing bearer token")));
    }

    Ok(token)
}

/// Resolve a bearer token to its user. Expired sessions are deleted.
pub async fn authenticate(
    db: &DatabaseConnection,
    token: &str,
    now: DateTime<Utc>,
) -> Result<CurrentUser, ApiError> {
    let token_hash = hash_session_token(token);
    let sessions = SessionRepository::new(db);

    let session = sessions
        .find_by_token_hash(&token_hash)
        .await?
        .ok_or_else(|| unauthorized(Some("Invalid or expired session")))?;

    let expires_at = session.expires_at.with_timezone(&Utc);
    if expires_at <= now {
        sessions.delete_by_token_hash(&token_hash).await?;
        tracing::info!(user_id = %session.user_id, "Rejected expired session");
        return Err(unauthorized(Some("Invalid or expired session")));
    }

    let user = UserRepository::new(db)
        .find_by_id(session.user_id)
        .await?
        .ok_or_else(|| unauthorized(Some("Invalid or expired session")))?;

    Ok(CurrentUser {
        id: user.id,
        email: user.email,
        full_name: user.full_name,
        token_hash,
        expires_at,
    })
}

/// Create a session for `user` lasting the configured TTL.
pub async fn issue_session(
    db: &DatabaseConnection,
    config: &AppConfig,
    user: &UserModel,
) -> Result<IssuedSession, ApiError> {
    let token = generate_session_token();
    let expires_at = Utc::now() + config.session_ttl();

    SessionRepository::new(db)
        .create(user.id, hash_session_token(&token), expires_at)
        .await?;

    Ok(IssuedSession { token, expires_at })
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| unauthorized(Some("Authentication required")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::password::hash_password;
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode},
        routing::get,
    };
    use migration::{Migrator, MigratorTrait};
    use sea_orm::Database;
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn test_state() -> AppState {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();

        AppState {
            config: Arc::new(AppConfig::default()),
            db,
        }
    }

    async fn seeded_user(state: &AppState) -> UserModel {
        UserRepository::new(&state.db)
            .create(
                "asha@example.com",
                "Asha Rao",
                hash_password("password123", 1_000).unwrap(),
            )
            .await
            .unwrap()
    }

    async fn whoami(user: CurrentUser) -> String {
        user.email
    }

    async fn run_middleware(state: AppState, request: Request<Body>) -> Response {
        Router::new()
            .route("/test", get(whoami))
            .layer(axum::middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            ))
            .with_state(state)
            .oneshot(request)
            .await
            .unwrap()
    }

    fn request_with(auth: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/test");
        if let Some(value) = auth {
            builder = builder.header("Authorization", value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn missing_auth_header_returns_401() {
        let state = test_state().await;
        let response = run_middleware(state, request_with(None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn invalid_auth_scheme_returns_401() {
        let state = test_state().await;
        let response = run_middleware(state, request_with(Some("Basic dGVzdDoxMjM="))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_token_returns_401() {
        let state = test_state().await;
        let response = run_middleware(state, request_with(Some("Bearer not-a-session"))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn issued_session_passes_through() {
        let state = test_state().await;
        let user = seeded_user(&state).await;
        let session = issue_session(&state.db, &state.config, &user).await.unwrap();

        let response = run_middleware(
            state,
            request_with(Some(&format!("Bearer {}", session.token))),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"asha@example.com");
    }

    #[tokio::test]
    async fn expired_session_is_rejected_and_deleted() {
        let state = test_state().await;
        let user = seeded_user(&state).await;
        let session = issue_session(&state.db, &state.config, &user).await.unwrap();

        let later = session.expires_at + chrono::Duration::seconds(1);
        let result = authenticate(&state.db, &session.token, later).await;
        assert_eq!(result.unwrap_err().status, StatusCode::UNAUTHORIZED);

        let remaining = SessionRepository::new(&state.db)
            .find_by_token_hash(&hash_session_token(&session.token))
            .await
            .unwrap();
        assert!(remaining.is_none());
    }

    #[test]
    fn bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer abc123".parse().unwrap());
        assert_eq!(extract_bearer_token(&headers).unwrap(), "abc123");

        headers.insert(AUTHORIZATION, "Bearer    ".parse().unwrap());
        assert!(extract_bearer_token(&headers).is_err());
    }
}
