//! # Interaction Log Repository
//!
//! Interaction logs are append-only: there is no update or delete.

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use super::optional_text;
use crate::error::RepositoryError;
use crate::models::interaction_log::{
    ActiveModel as InteractionActiveModel, Column, ContactMethod, Entity as InteractionLog,
    Model as InteractionModel,
};

/// Data for a new interaction
#[derive(Debug, Clone)]
pub struct NewInteraction {
    pub college_id: Uuid,
    pub executive_name: Option<String>,
    pub contact_method: ContactMethod,
    pub notes: String,
    pub interaction_date: NaiveDate,
    pub file_url: Option<String>,
}

pub struct InteractionLogRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> InteractionLogRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Interactions for a college, latest interaction date first.
    pub async fn list_for_college(
        &self,
        college_id: Uuid,
    ) -> Result<Vec<InteractionModel>, RepositoryError> {
        InteractionLog::find()
            .filter(Column::CollegeId.eq(college_id))
            .order_by_desc(Column::InteractionDate)
            .order_by_desc(Column::CreatedAt)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Most recently logged interactions across all colleges.
    pub async fn recent(&self, limit: u64) -> Result<Vec<InteractionModel>, RepositoryError> {
        InteractionLog::find()
            .order_by_desc(Column::CreatedAt)
            .limit(limit)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Append an interaction. The caller checks that the college exists.
    pub async fn create(&self, new: NewInteraction) -> Result<InteractionModel, RepositoryError> {
        let notes = new.notes.trim();
        if notes.is_empty() {
            return Err(RepositoryError::validation_error(
                "Interaction notes cannot be empty",
            ));
        }

        let interaction = InteractionActiveModel {
            id: Set(Uuid::new_v4()),
            college_id: Set(new.college_id),
            executive_name: Set(optional_text(new.executive_name)),
            contact_method: Set(new.contact_method),
            notes: Set(notes.to_string()),
            interaction_date: Set(new.interaction_date),
            file_url: Set(optional_text(new.file_url)),
            created_at: Set(Utc::now().into()),
        };

        let created = interaction
            .insert(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        tracing::debug!(
            interaction_id = %created.id,
            college_id = %created.college_id,
            "Interaction logged"
        );

        Ok(created)
    }
}
