//! # Task Repository
//!
//! Follow-up tasks with the tab filters used by the task board.

use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::{NullOrdering, Order};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, ModelTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::optional_text;
use crate::error::RepositoryError;
use crate::models::task::{
    ActiveModel as TaskActiveModel, Column, Entity as Task, Model as TaskModel, TaskPriority,
    TaskStatus,
};

/// Task board tab
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TaskTab {
    #[default]
    All,
    Pending,
    Completed,
    /// Pending with a due date before today
    Overdue,
}

#[derive(Debug, Clone)]
pub struct TaskFilter {
    pub tab: TaskTab,
    pub college_id: Option<Uuid>,
    /// Reference date for the overdue tab
    pub today: NaiveDate,
}

#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub college_id: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
    pub priority: Option<TaskPriority>,
    pub task_type: Option<String>,
    pub created_by: Option<Uuid>,
}

/// Partial task edit; `None` leaves a field untouched and `Some(None)`
/// clears a nullable one.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub college_id: Option<Option<Uuid>>,
    pub due_date: Option<Option<NaiveDate>>,
    pub priority: Option<TaskPriority>,
    pub status: Option<TaskStatus>,
    pub task_type: Option<String>,
}

pub struct TaskRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> TaskRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Tasks for a tab, soonest due first with undated tasks last.
    pub async fn list(&self, filter: &TaskFilter) -> Result<Vec<TaskModel>, RepositoryError> {
        let mut query = Task::find();

        query = match filter.tab {
            TaskTab::All => query,
            TaskTab::Pending => query.filter(Column::Status.eq(TaskStatus::Pending)),
            TaskTab::Completed => query.filter(Column::Status.eq(TaskStatus::Completed)),
            TaskTab::Overdue => query
                .filter(Column::Status.eq(TaskStatus::Pending))
                .filter(Column::DueDate.lt(filter.today)),
        };

        if let Some(college_id) = filter.college_id {
            query = query.filter(Column::CollegeId.eq(college_id));
        }

        query
            .order_by_with_nulls(Column::DueDate, Order::Asc, NullOrdering::Last)
            .order_by_desc(Column::CreatedAt)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn list_all(&self) -> Result<Vec<TaskModel>, RepositoryError> {
        Task::find()
            .order_by_desc(Column::CreatedAt)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Pending tasks ordered by due date, for the dashboard.
    pub async fn upcoming(&self, limit: u64) -> Result<Vec<TaskModel>, RepositoryError> {
        Task::find()
            .filter(Column::Status.eq(TaskStatus::Pending))
            .order_by_with_nulls(Column::DueDate, Order::Asc, NullOrdering::Last)
            .order_by_desc(Column::CreatedAt)
            .limit(limit)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<TaskModel>, RepositoryError> {
        Task::find_by_id(id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn create(&self, new: NewTask) -> Result<TaskModel, RepositoryError> {
        let title = validate_title(&new.title)?;
        let now = Utc::now();

        let task = TaskActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(title),
            description: Set(optional_text(new.description)),
            college_id: Set(new.college_id),
            due_date: Set(new.due_date),
            priority: Set(new.priority.unwrap_or_default()),
            status: Set(TaskStatus::Pending),
            task_type: Set(optional_text(new.task_type)),
            created_by: Set(new.created_by),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        task.insert(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn update(&self, id: Uuid, patch: TaskPatch) -> Result<TaskModel, RepositoryError> {
        let task = self.require(id).await?;
        let mut active = task.into_active_model();

        if let Some(title) = patch.title {
            active.title = Set(validate_title(&title)?);
        }
        if let Some(description) = patch.description {
            active.description = Set(optional_text(Some(description)));
        }
        if let Some(college_id) = patch.college_id {
            active.college_id = Set(college_id);
        }
        if let Some(due_date) = patch.due_date {
            active.due_date = Set(due_date);
        }
        if let Some(priority) = patch.priority {
            active.priority = Set(priority);
        }
        if let Some(status) = patch.status {
            active.status = Set(status);
        }
        if let Some(task_type) = patch.task_type {
            active.task_type = Set(optional_text(Some(task_type)));
        }

        active.updated_at = Set(Utc::now().into());

        active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Flip pending ↔ completed.
    pub async fn toggle_status(&self, id: Uuid) -> Result<TaskModel, RepositoryError> {
        let task = self.require(id).await?;
        let next = task.status.toggled();

        let mut active = task.into_active_model();
        active.status = Set(next);
        active.updated_at = Set(Utc::now().into());

        active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let task = self.require(id).await?;

        task.delete(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(())
    }

    async fn require(&self, id: Uuid) -> Result<TaskModel, RepositoryError> {
        self.get(id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Task"))
    }
}

fn validate_title(title: &str) -> Result<String, RepositoryError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(RepositoryError::validation_error(
            "Task title cannot be empty",
        ));
    }
    Ok(title.to_string())
}
