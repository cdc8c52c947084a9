//! # Dashboard API Handler

use axum::{Json, extract::State};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::interactions::InteractionDto;
use super::tasks::TaskDto;
use super::types::ApiResponse;
use crate::error::ApiError;
use crate::repositories::{
    CollegeRepository, InteractionLogRepository, TaskRepository, TeamMemberRepository,
};
use crate::server::AppState;
use crate::stats::{CollegeStats, TaskStats, TeamStats, college_stats, task_stats, team_stats};

const RECENT_INTERACTIONS: u64 = 5;
const UPCOMING_TASKS: u64 = 5;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DashboardSummary {
    pub colleges: CollegeStats,
    pub tasks: TaskStats,
    pub team: TeamStats,
    pub recent_interactions: Vec<InteractionDto>,
    pub upcoming_tasks: Vec<TaskDto>,
}

/// Dashboard summary
#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Statistics and recent activity", body = ApiResponse<DashboardSummary>),
        (status = 401, description = "Missing or invalid session", body = ApiError)
    ),
    tag = "dashboard"
)]
pub async fn dashboard(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<DashboardSummary>>, ApiError> {
    let today = Utc::now().date_naive();

    let colleges = CollegeRepository::new(&state.db).list_all().await?;
    let tasks_repo = TaskRepository::new(&state.db);
    let tasks = tasks_repo.list_all().await?;
    let upcoming = tasks_repo.upcoming(UPCOMING_TASKS).await?;
    let members = TeamMemberRepository::new(&state.db).list_all().await?;
    let recent = InteractionLogRepository::new(&state.db)
        .recent(RECENT_INTERACTIONS)
        .await?;

    let summary = DashboardSummary {
        colleges: college_stats(&colleges, today),
        tasks: task_stats(&tasks, today),
        team: team_stats(&members),
        recent_interactions: recent.into_iter().map(InteractionDto::from).collect(),
        upcoming_tasks: upcoming
            .into_iter()
            .map(|task| TaskDto::from_model(task, today))
            .collect(),
    };

    Ok(Json(ApiResponse::new(summary)))
}
