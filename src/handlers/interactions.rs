//! # Interaction Log API Handlers

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::types::{ApiResponse, ListResponse, json_body, require_text};
use crate::error::{ApiError, not_found};
use crate::models::interaction_log::{ContactMethod, Model as InteractionModel};
use crate::repositories::interaction_log::NewInteraction;
use crate::repositories::{CollegeRepository, InteractionLogRepository};
use crate::server::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InteractionDto {
    pub id: String,
    pub college_id: String,
    pub executive_name: Option<String>,
    pub contact_method: ContactMethod,
    pub notes: String,
    pub interaction_date: NaiveDate,
    pub file_url: Option<String>,
    pub created_at: String,
}

impl From<InteractionModel> for InteractionDto {
    fn from(log: InteractionModel) -> Self {
        Self {
            id: log.id.to_string(),
            college_id: log.college_id.to_string(),
            executive_name: log.executive_name,
            contact_method: log.contact_method,
            notes: log.notes,
            interaction_date: log.interaction_date,
            file_url: log.file_url,
            created_at: log.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateInteractionRequest {
    pub executive_name: Option<String>,
    /// Defaults to `Call`
    pub contact_method: Option<ContactMethod>,
    #[schema(example = "Met the placement officer; proposal requested")]
    pub notes: String,
    /// Defaults to today (UTC)
    pub interaction_date: Option<NaiveDate>,
    pub file_url: Option<String>,
}

/// List interactions for a college
#[utoipa::path(
    get,
    path = "/api/v1/colleges/{id}/interactions",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "College UUID")),
    responses(
        (status = 200, description = "Interactions, latest first", body = ListResponse<InteractionDto>),
        (status = 401, description = "Missing or invalid session", body = ApiError),
        (status = 404, description = "College not found", body = ApiError)
    ),
    tag = "interactions"
)]
pub async fn list_interactions(
    State(state): State<AppState>,
    Path(college_id): Path<Uuid>,
) -> Result<Json<ListResponse<InteractionDto>>, ApiError> {
    if !CollegeRepository::new(&state.db).exists(college_id).await? {
        return Err(not_found("College", college_id));
    }

    let logs = InteractionLogRepository::new(&state.db)
        .list_for_college(college_id)
        .await?;

    Ok(Json(ListResponse::new(
        logs.into_iter().map(InteractionDto::from).collect(),
    )))
}

/// Log an interaction with a college
#[utoipa::path(
    post,
    path = "/api/v1/colleges/{id}/interactions",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "College UUID")),
    request_body = CreateInteractionRequest,
    responses(
        (status = 201, description = "Interaction logged", body = ApiResponse<InteractionDto>),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid session", body = ApiError),
        (status = 404, description = "College not found", body = ApiError)
    ),
    tag = "interactions"
)]
pub async fn create_interaction(
    State(state): State<AppState>,
    Path(college_id): Path<Uuid>,
    payload: Result<Json<CreateInteractionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<InteractionDto>>), ApiError> {
    let request = json_body(payload)?;

    require_text("notes", &request.notes)?;

    if !CollegeRepository::new(&state.db).exists(college_id).await? {
        return Err(not_found("College", college_id));
    }

    let log = InteractionLogRepository::new(&state.db)
        .create(NewInteraction {
            college_id,
            executive_name: request.executive_name,
            contact_method: request.contact_method.unwrap_or_default(),
            notes: request.notes,
            interaction_date: request
                .interaction_date
                .unwrap_or_else(|| Utc::now().date_naive()),
            file_url: request.file_url,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(InteractionDto::from(log))),
    ))
}
