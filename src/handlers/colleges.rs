//! # Colleges API Handlers
//!
//! Listing, search, editing and status reviews for college records.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header::LOCATION},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::types::{
    ApiResponse, ListResponse, PageParams, field_error, json_body, query, require_text,
};
use crate::auth::CurrentUser;
use crate::error::{ApiError, not_found};
use crate::models::college::{CollegeStatus, Model as CollegeModel};
use crate::repositories::CollegeRepository;
use crate::repositories::college::{CollegeFilter, CollegePatch, NewCollege, StatusUpdate};
use crate::server::AppState;

const MAX_NAME_LENGTH: usize = 255;

/// College as returned by the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CollegeDto {
    pub id: String,
    #[schema(example = "Government Engineering College")]
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pin_code: Option<String>,
    pub contact_person: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub college_type: Option<String>,
    pub status: CollegeStatus,
    pub last_contact_date: Option<NaiveDate>,
    pub next_followup_date: Option<NaiveDate>,
    pub rejection_reason: Option<String>,
    pub status_notes: Option<String>,
    pub description: Option<String>,
    pub created_by: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<CollegeModel> for CollegeDto {
    fn from(college: CollegeModel) -> Self {
        Self {
            id: college.id.to_string(),
            name: college.name,
            address: college.address,
            city: college.city,
            state: college.state,
            pin_code: college.pin_code,
            contact_person: college.contact_person,
            contact_email: college.contact_email,
            contact_phone: college.contact_phone,
            college_type: college.college_type,
            status: college.status,
            last_contact_date: college.last_contact_date,
            next_followup_date: college.next_followup_date,
            rejection_reason: college.rejection_reason,
            status_notes: college.status_notes,
            description: college.description,
            created_by: college.created_by.map(|id| id.to_string()),
            created_at: college.created_at.to_rfc3339(),
            updated_at: college.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListCollegesQuery {
    /// Case-insensitive match against name, city and contact person
    pub search: Option<String>,
    pub status: Option<CollegeStatus>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateCollegeRequest {
    #[schema(example = "Government Engineering College")]
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pin_code: Option<String>,
    pub contact_person: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub college_type: Option<String>,
    pub status: Option<CollegeStatus>,
    pub next_followup_date: Option<NaiveDate>,
    pub description: Option<String>,
}

/// Partial edit; omitted fields are unchanged, blank strings clear a field
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateCollegeRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pin_code: Option<String>,
    pub contact_person: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub college_type: Option<String>,
    pub description: Option<String>,
}

/// Status review form
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: CollegeStatus,
    pub last_contact_date: Option<NaiveDate>,
    pub next_followup_date: Option<NaiveDate>,
    /// Stored only when `status` is `rejected`
    pub rejection_reason: Option<String>,
    pub status_notes: Option<String>,
}

fn validate_name(name: &str) -> Result<(), ApiError> {
    require_text("name", name)?;
    if name.trim().chars().count() > MAX_NAME_LENGTH {
        return Err(field_error(
            "name",
            &format!("name cannot exceed {MAX_NAME_LENGTH} characters"),
        ));
    }
    Ok(())
}

fn validate_contact_email(email: Option<&str>) -> Result<(), ApiError> {
    match email.map(str::trim) {
        Some(email) if !email.is_empty() && !email.contains('@') => Err(field_error(
            "contact_email",
            "contact_email must be a valid email address",
        )),
        _ => Ok(()),
    }
}

/// List colleges
#[utoipa::path(
    get,
    path = "/api/v1/colleges",
    security(("bearer_auth" = [])),
    params(ListCollegesQuery),
    responses(
        (status = 200, description = "Colleges, newest first", body = ListResponse<CollegeDto>),
        (status = 400, description = "Invalid query parameters", body = ApiError),
        (status = 401, description = "Missing or invalid session", body = ApiError)
    ),
    tag = "colleges"
)]
pub async fn list_colleges(
    State(state): State<AppState>,
    params: Result<Query<ListCollegesQuery>, QueryRejection>,
) -> Result<Json<ListResponse<CollegeDto>>, ApiError> {
    let params = query(params)?;
    let (limit, offset) = PageParams {
        limit: params.limit,
        offset: params.offset,
    }
    .resolve()?;

    let filter = CollegeFilter {
        search: params.search,
        status: params.status,
        limit,
        offset,
    };

    let colleges = CollegeRepository::new(&state.db).list(&filter).await?;

    Ok(Json(ListResponse::new(
        colleges.into_iter().map(CollegeDto::from).collect(),
    )))
}

/// Create a college
#[utoipa::path(
    post,
    path = "/api/v1/colleges",
    security(("bearer_auth" = [])),
    request_body = CreateCollegeRequest,
    responses(
        (status = 201, description = "College created", body = ApiResponse<CollegeDto>, headers(
            ("Location", description = "URL of the created college")
        )),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid session", body = ApiError)
    ),
    tag = "colleges"
)]
pub async fn create_college(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: Result<Json<CreateCollegeRequest>, JsonRejection>,
) -> Result<
    (
        StatusCode,
        [(axum::http::HeaderName, String); 1],
        Json<ApiResponse<CollegeDto>>,
    ),
    ApiError,
> {
    let request = json_body(payload)?;

    validate_name(&request.name)?;
    validate_contact_email(request.contact_email.as_deref())?;

    let college = CollegeRepository::new(&state.db)
        .create(NewCollege {
            name: request.name,
            address: request.address,
            city: request.city,
            state: request.state,
            pin_code: request.pin_code,
            contact_person: request.contact_person,
            contact_email: request.contact_email,
            contact_phone: request.contact_phone,
            college_type: request.college_type,
            status: request.status,
            next_followup_date: request.next_followup_date,
            description: request.description,
            created_by: Some(user.id),
        })
        .await?;

    tracing::info!(college_id = %college.id, user_id = %user.id, "College created");

    let location = format!("/api/v1/colleges/{}", college.id);

    Ok((
        StatusCode::CREATED,
        [(LOCATION, location)],
        Json(ApiResponse::new(CollegeDto::from(college))),
    ))
}

/// Get a college by ID
#[utoipa::path(
    get,
    path = "/api/v1/colleges/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "College UUID")),
    responses(
        (status = 200, description = "College", body = ApiResponse<CollegeDto>),
        (status = 401, description = "Missing or invalid session", body = ApiError),
        (status = 404, description = "College not found", body = ApiError)
    ),
    tag = "colleges"
)]
pub async fn get_college(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<CollegeDto>>, ApiError> {
    let college = CollegeRepository::new(&state.db)
        .get(id)
        .await?
        .ok_or_else(|| not_found("College", id))?;

    Ok(Json(ApiResponse::new(CollegeDto::from(college))))
}

/// Edit college details
#[utoipa::path(
    patch,
    path = "/api/v1/colleges/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "College UUID")),
    request_body = UpdateCollegeRequest,
    responses(
        (status = 200, description = "College updated", body = ApiResponse<CollegeDto>),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid session", body = ApiError),
        (status = 404, description = "College not found", body = ApiError)
    ),
    tag = "colleges"
)]
pub async fn update_college(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateCollegeRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<CollegeDto>>, ApiError> {
    let request = json_body(payload)?;

    if let Some(name) = request.name.as_deref() {
        validate_name(name)?;
    }
    validate_contact_email(request.contact_email.as_deref())?;

    let college = CollegeRepository::new(&state.db)
        .update_details(
            id,
            CollegePatch {
                name: request.name,
                address: request.address,
                city: request.city,
                state: request.state,
                pin_code: request.pin_code,
                contact_person: request.contact_person,
                contact_email: request.contact_email,
                contact_phone: request.contact_phone,
                college_type: request.college_type,
                description: request.description,
            },
        )
        .await?;

    Ok(Json(ApiResponse::new(CollegeDto::from(college))))
}

/// Record a status review
#[utoipa::path(
    put,
    path = "/api/v1/colleges/{id}/status",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "College UUID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<CollegeDto>),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid session", body = ApiError),
        (status = 404, description = "College not found", body = ApiError)
    ),
    tag = "colleges"
)]
pub async fn update_college_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<CollegeDto>>, ApiError> {
    let request = json_body(payload)?;

    let college = CollegeRepository::new(&state.db)
        .update_status(
            id,
            StatusUpdate {
                status: request.status,
                last_contact_date: request.last_contact_date,
                next_followup_date: request.next_followup_date,
                rejection_reason: request.rejection_reason,
                status_notes: request.status_notes,
            },
        )
        .await?;

    Ok(Json(ApiResponse::new(CollegeDto::from(college))))
}

/// Delete a college
#[utoipa::path(
    delete,
    path = "/api/v1/colleges/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "College UUID")),
    responses(
        (status = 204, description = "College deleted"),
        (status = 401, description = "Missing or invalid session", body = ApiError),
        (status = 404, description = "College not found", body = ApiError)
    ),
    tag = "colleges"
)]
pub async fn delete_college(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    CollegeRepository::new(&state.db).delete(id).await?;

    tracing::info!(college_id = %id, user_id = %user.id, "College deleted");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contact_email_is_optional_but_checked() {
        assert!(validate_contact_email(None).is_ok());
        assert!(validate_contact_email(Some("")).is_ok());
        assert!(validate_contact_email(Some("principal@gec.edu")).is_ok());
        assert!(validate_contact_email(Some("principal")).is_err());
    }

    #[test]
    fn name_length_limit() {
        assert!(validate_name("GEC").is_ok());
        assert!(validate_name(" ").is_err());
        assert!(validate_name(&"a".repeat(MAX_NAME_LENGTH + 1)).is_err());
    }
}
