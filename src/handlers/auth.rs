//! # Authentication API Handlers
//!
//! Sign-up, sign-in, sign-out and the current-user lookup.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::types::{ApiResponse, field_error, json_body, require_email, require_text};
use crate::auth::{CurrentUser, IssuedSession, issue_session};
use crate::error::{ApiError, unauthorized};
use crate::models::user::Model as UserModel;
use crate::password::{dummy_hash, hash_password_async, verify_password_async};
use crate::repositories::{SessionRepository, UserRepository};
use crate::server::AppState;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SignUpRequest {
    #[schema(example = "asha@example.com")]
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    #[schema(example = "Asha Rao")]
    pub full_name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SignInRequest {
    #[schema(example = "asha@example.com")]
    pub email: String,
    pub password: String,
}

/// Account details exposed to clients
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserDto {
    pub id: String,
    pub email: String,
    pub full_name: String,
}

impl From<&UserModel> for UserDto {
    fn from(user: &UserModel) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
        }
    }
}

/// Issued session
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionDto {
    /// Bearer token for the `Authorization` header
    pub access_token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Expiry (ISO 8601)
    pub expires_at: String,
    pub user: UserDto,
}

impl SessionDto {
    fn new(session: IssuedSession, user: &UserModel) -> Self {
        Self {
            access_token: session.token,
            token_type: "Bearer".to_string(),
            expires_at: session.expires_at.to_rfc3339(),
            user: UserDto::from(user),
        }
    }
}

/// Create an account and sign in
#[utoipa::path(
    post,
    path = "/api/v1/auth/sign-up",
    request_body = SignUpRequest,
    responses(
        (status = 201, description = "Account created", body = ApiResponse<SessionDto>),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 409, description = "Email already registered", body = ApiError)
    ),
    tag = "auth"
)]
pub async fn sign_up(
    State(state): State<AppState>,
    payload: Result<Json<SignUpRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<SessionDto>>), ApiError> {
    let request = json_body(payload)?;

    require_email("email", &request.email)?;
    require_text("full_name", &request.full_name)?;

    let min_length = state.config.password_min_length;
    if request.password.chars().count() < min_length {
        return Err(field_error(
            "password",
            &format!("password must be at least {min_length} characters"),
        ));
    }
    if request.password != request.confirm_password {
        return Err(field_error("confirm_password", "passwords do not match"));
    }

    let password_hash =
        hash_password_async(request.password, state.config.password_hash_iterations)
            .await
            .map_err(anyhow::Error::from)?;

    let user = UserRepository::new(&state.db)
        .create(&request.email, &request.full_name, password_hash)
        .await?;

    tracing::info!(user_id = %user.id, "Account created");

    let session = issue_session(&state.db, &state.config, &user).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(SessionDto::new(session, &user))),
    ))
}

/// Sign in with email and password
#[utoipa::path(
    post,
    path = "/api/v1/auth/sign-in",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in", body = ApiResponse<SessionDto>),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Invalid email or password", body = ApiError)
    ),
    tag = "auth"
)]
pub async fn sign_in(
    State(state): State<AppState>,
    payload: Result<Json<SignInRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<SessionDto>>, ApiError> {
    let request = json_body(payload)?;

    require_text("email", &request.email)?;
    require_text("password", &request.password)?;

    let user = UserRepository::new(&state.db)
        .find_by_email(&request.email)
        .await?;

    // Unknown emails still pay for a hash so timing does not reveal accounts.
    let encoded = match &user {
        Some(user) => user.password_hash.clone(),
        None => dummy_hash(state.config.password_hash_iterations),
    };
    let valid = verify_password_async(request.password, encoded)
        .await
        .unwrap_or_else(|err| {
            tracing::error!(error = %err, "Password verification failed");
            false
        });

    let user = match user {
        Some(user) if valid => user,
        Some(user) => {
            tracing::info!(user_id = %user.id, "Rejected sign-in");
            return Err(unauthorized(Some(INVALID_CREDENTIALS)));
        }
        None => return Err(unauthorized(Some(INVALID_CREDENTIALS))),
    };

    let session = issue_session(&state.db, &state.config, &user).await?;

    Ok(Json(ApiResponse::new(SessionDto::new(session, &user))))
}

/// End the current session
#[utoipa::path(
    post,
    path = "/api/v1/auth/sign-out",
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Signed out"),
        (status = 401, description = "Missing or invalid session", body = ApiError)
    ),
    tag = "auth"
)]
pub async fn sign_out(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<StatusCode, ApiError> {
    SessionRepository::new(&state.db)
        .delete_by_token_hash(&user.token_hash)
        .await?;

    tracing::info!(user_id = %user.id, "Signed out");

    Ok(StatusCode::NO_CONTENT)
}

/// Current user
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Signed-in user", body = ApiResponse<UserDto>),
        (status = 401, description = "Missing or invalid session", body = ApiError)
    ),
    tag = "auth"
)]
pub async fn me(user: CurrentUser) -> Json<ApiResponse<UserDto>> {
    Json(ApiResponse::new(UserDto {
        id: user.id.to_string(),
        email: user.email,
        full_name: user.full_name,
    }))
}
