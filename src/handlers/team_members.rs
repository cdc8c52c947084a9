//! # Team Members API Handlers

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::types::{ApiResponse, ListResponse, json_body, query, require_email, require_text};
use crate::error::ApiError;
use crate::models::team_member::{MemberStatus, Model as MemberModel, TeamRole};
use crate::repositories::TeamMemberRepository;
use crate::repositories::team_member::{NewTeamMember, TeamMemberFilter, TeamMemberPatch};
use crate::server::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TeamMemberDto {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: TeamRole,
    pub department: Option<String>,
    pub status: MemberStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl From<MemberModel> for TeamMemberDto {
    fn from(member: MemberModel) -> Self {
        Self {
            id: member.id.to_string(),
            name: member.name,
            email: member.email,
            phone: member.phone,
            role: member.role,
            department: member.department,
            status: member.status,
            created_at: member.created_at.to_rfc3339(),
            updated_at: member.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListTeamMembersQuery {
    /// Case-insensitive match against name, email and department
    pub search: Option<String>,
    pub role: Option<TeamRole>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateTeamMemberRequest {
    #[schema(example = "Ravi Kumar")]
    pub name: String,
    #[schema(example = "ravi@example.com")]
    pub email: String,
    pub phone: Option<String>,
    pub role: Option<TeamRole>,
    pub department: Option<String>,
    pub status: Option<MemberStatus>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateTeamMemberRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<TeamRole>,
    pub department: Option<String>,
    pub status: Option<MemberStatus>,
}

/// List team members
#[utoipa::path(
    get,
    path = "/api/v1/team-members",
    security(("bearer_auth" = [])),
    params(ListTeamMembersQuery),
    responses(
        (status = 200, description = "Team members, newest first", body = ListResponse<TeamMemberDto>),
        (status = 400, description = "Invalid query parameters", body = ApiError),
        (status = 401, description = "Missing or invalid session", body = ApiError)
    ),
    tag = "team"
)]
pub async fn list_team_members(
    State(state): State<AppState>,
    params: Result<Query<ListTeamMembersQuery>, QueryRejection>,
) -> Result<Json<ListResponse<TeamMemberDto>>, ApiError> {
    let params = query(params)?;

    let members = TeamMemberRepository::new(&state.db)
        .list(&TeamMemberFilter {
            search: params.search,
            role: params.role,
        })
        .await?;

    Ok(Json(ListResponse::new(
        members.into_iter().map(TeamMemberDto::from).collect(),
    )))
}

/// Add a team member
#[utoipa::path(
    post,
    path = "/api/v1/team-members",
    security(("bearer_auth" = [])),
    request_body = CreateTeamMemberRequest,
    responses(
        (status = 201, description = "Team member created", body = ApiResponse<TeamMemberDto>),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid session", body = ApiError)
    ),
    tag = "team"
)]
pub async fn create_team_member(
    State(state): State<AppState>,
    payload: Result<Json<CreateTeamMemberRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<TeamMemberDto>>), ApiError> {
    let request = json_body(payload)?;

    require_text("name", &request.name)?;
    require_email("email", &request.email)?;

    let member = TeamMemberRepository::new(&state.db)
        .create(NewTeamMember {
            name: request.name,
            email: request.email,
            phone: request.phone,
            role: request.role,
            department: request.department,
            status: request.status,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(TeamMemberDto::from(member))),
    ))
}

/// Update a team member
#[utoipa::path(
    patch,
    path = "/api/v1/team-members/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Team member UUID")),
    request_body = UpdateTeamMemberRequest,
    responses(
        (status = 200, description = "Team member updated", body = ApiResponse<TeamMemberDto>),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid session", body = ApiError),
        (status = 404, description = "Team member not found", body = ApiError)
    ),
    tag = "team"
)]
pub async fn update_team_member(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateTeamMemberRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<TeamMemberDto>>, ApiError> {
    let request = json_body(payload)?;

    if let Some(name) = request.name.as_deref() {
        require_text("name", name)?;
    }
    if let Some(email) = request.email.as_deref() {
        require_email("email", email)?;
    }

    let member = TeamMemberRepository::new(&state.db)
        .update(
            id,
            TeamMemberPatch {
                name: request.name,
                email: request.email,
                phone: request.phone,
                role: request.role,
                department: request.department,
                status: request.status,
            },
        )
        .await?;

    Ok(Json(ApiResponse::new(TeamMemberDto::from(member))))
}

/// Remove a team member
#[utoipa::path(
    delete,
    path = "/api/v1/team-members/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Team member UUID")),
    responses(
        (status = 204, description = "Team member deleted"),
        (status = 401, description = "Missing or invalid session", body = ApiError),
        (status = 404, description = "Team member not found", body = ApiError)
    ),
    tag = "team"
)]
pub async fn delete_team_member(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    TeamMemberRepository::new(&state.db).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
