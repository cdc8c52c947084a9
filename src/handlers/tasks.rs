//! # Tasks API Handlers
//!
//! The task board: tab filters, edits and the pending/completed toggle.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::types::{ApiResponse, ResponseMeta, json_body, nullable, query, require_text};
use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::models::task::{Model as TaskModel, TaskPriority, TaskStatus};
use crate::repositories::TaskRepository;
use crate::repositories::task::{NewTask, TaskFilter, TaskPatch, TaskTab};
use crate::server::AppState;
use crate::stats::{TaskStats, task_stats};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TaskDto {
    pub id: String,
    #[schema(example = "Site visit - Chennai Engineering")]
    pub title: String,
    pub description: Option<String>,
    pub college_id: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub task_type: Option<String>,
    /// Pending with a due date before today
    pub overdue: bool,
    pub created_by: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl TaskDto {
    pub fn from_model(task: TaskModel, today: NaiveDate) -> Self {
        Self {
            overdue: task.is_overdue(today),
            id: task.id.to_string(),
            title: task.title,
            description: task.description,
            college_id: task.college_id.map(|id| id.to_string()),
            due_date: task.due_date,
            priority: task.priority,
            status: task.status,
            task_type: task.task_type,
            created_by: task.created_by.map(|id| id.to_string()),
            created_at: task.created_at.to_rfc3339(),
            updated_at: task.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListTasksQuery {
    /// `all` (default), `pending`, `completed` or `overdue`
    pub filter: Option<TaskTab>,
    pub college_id: Option<Uuid>,
}

/// Task board: the selected tab plus counts for every tab
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TaskBoardResponse {
    pub data: Vec<TaskDto>,
    pub meta: ResponseMeta,
    pub total: u64,
    pub counts: TaskStats,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: Option<String>,
    pub college_id: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
    pub priority: Option<TaskPriority>,
    pub task_type: Option<String>,
}

/// Partial edit; omitted fields are unchanged, `null` clears the college link
/// or the due date
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>, format = Uuid)]
    pub college_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>, format = Date)]
    pub due_date: Option<Option<NaiveDate>>,
    pub priority: Option<TaskPriority>,
    pub status: Option<TaskStatus>,
    pub task_type: Option<String>,
}

/// List tasks for a tab
#[utoipa::path(
    get,
    path = "/api/v1/tasks",
    security(("bearer_auth" = [])),
    params(ListTasksQuery),
    responses(
        (status = 200, description = "Tasks, soonest due first", body = TaskBoardResponse),
        (status = 400, description = "Invalid query parameters", body = ApiError),
        (status = 401, description = "Missing or invalid session", body = ApiError)
    ),
    tag = "tasks"
)]
pub async fn list_tasks(
    State(state): State<AppState>,
    params: Result<Query<ListTasksQuery>, QueryRejection>,
) -> Result<Json<TaskBoardResponse>, ApiError> {
    let params = query(params)?;
    let today = Utc::now().date_naive();
    let repo = TaskRepository::new(&state.db);

    let tasks = repo
        .list(&TaskFilter {
            tab: params.filter.unwrap_or_default(),
            college_id: params.college_id,
            today,
        })
        .await?;

    // Tab counts are scoped like the list, minus the tab itself.
    let scope = repo
        .list(&TaskFilter {
            tab: TaskTab::All,
            college_id: params.college_id,
            today,
        })
        .await?;

    let data: Vec<TaskDto> = tasks
        .into_iter()
        .map(|task| TaskDto::from_model(task, today))
        .collect();

    Ok(Json(TaskBoardResponse {
        total: data.len() as u64,
        data,
        meta: ResponseMeta::current(),
        counts: task_stats(&scope, today),
    }))
}

/// Create a task
#[utoipa::path(
    post,
    path = "/api/v1/tasks",
    security(("bearer_auth" = [])),
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created", body = ApiResponse<TaskDto>),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid session", body = ApiError)
    ),
    tag = "tasks"
)]
pub async fn create_task(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<TaskDto>>), ApiError> {
    let request = json_body(payload)?;

    require_text("title", &request.title)?;

    let task = TaskRepository::new(&state.db)
        .create(NewTask {
            title: request.title,
            description: request.description,
            college_id: request.college_id,
            due_date: request.due_date,
            priority: request.priority,
            task_type: request.task_type,
            created_by: Some(user.id),
        })
        .await?;

    let today = Utc::now().date_naive();

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(TaskDto::from_model(task, today))),
    ))
}

/// Edit a task
#[utoipa::path(
    patch,
    path = "/api/v1/tasks/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Task UUID")),
    request_body = UpdateTaskRequest,
    responses(
        (status = 200, description = "Task updated", body = ApiResponse<TaskDto>),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid session", body = ApiError),
        (status = 404, description = "Task not found", body = ApiError)
    ),
    tag = "tasks"
)]
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<TaskDto>>, ApiError> {
    let request = json_body(payload)?;

    if let Some(title) = request.title.as_deref() {
        require_text("title", title)?;
    }

    let task = TaskRepository::new(&state.db)
        .update(
            id,
            TaskPatch {
                title: request.title,
                description: request.description,
                college_id: request.college_id,
                due_date: request.due_date,
                priority: request.priority,
                status: request.status,
                task_type: request.task_type,
            },
        )
        .await?;

    Ok(Json(ApiResponse::new(TaskDto::from_model(
        task,
        Utc::now().date_naive(),
    ))))
}

/// Toggle a task between pending and completed
#[utoipa::path(
    post,
    path = "/api/v1/tasks/{id}/toggle",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Task UUID")),
    responses(
        (status = 200, description = "Task toggled", body = ApiResponse<TaskDto>),
        (status = 401, description = "Missing or invalid session", body = ApiError),
        (status = 404, description = "Task not found", body = ApiError)
    ),
    tag = "tasks"
)]
pub async fn toggle_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<TaskDto>>, ApiError> {
    let task = TaskRepository::new(&state.db).toggle_status(id).await?;

    Ok(Json(ApiResponse::new(TaskDto::from_model(
        task,
        Utc::now().date_naive(),
    ))))
}

/// Delete a task
#[utoipa::path(
    delete,
    path = "/api/v1/tasks/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Task UUID")),
    responses(
        (status = 204, description = "Task deleted"),
        (status = 401, description = "Missing or invalid session", body = ApiError),
        (status = 404, description = "Task not found", body = ApiError)
    ),
    tag = "tasks"
)]
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    TaskRepository::new(&state.db).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
