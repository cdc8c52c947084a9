//! # College Repository
//!
//! CRUD, search and status transitions for college records.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, ModelTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use super::{optional_text, search_condition};
use crate::error::RepositoryError;
use crate::models::college::{
    ActiveModel as CollegeActiveModel, CollegeStatus, Column, Entity as College,
    Model as CollegeModel,
};

/// Filters applied when listing colleges
#[derive(Debug, Clone)]
pub struct CollegeFilter {
    /// Case-insensitive match against name, city and contact person
    pub search: Option<String>,
    pub status: Option<CollegeStatus>,
    pub limit: u64,
    pub offset: u64,
}

impl Default for CollegeFilter {
    fn default() -> Self {
        Self {
            search: None,
            status: None,
            limit: 100,
            offset: 0,
        }
    }
}

/// Data for a new college
#[derive(Debug, Clone, Default)]
pub struct NewCollege {
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
    pub next_followup_date: Option<chrono::NaiveDate>,
    pub description: Option<String>,
    pub created_by: Option<Uuid>,
}

/// Partial edit of college details; `None` leaves a field untouched and a
/// blank string clears an optional field.
#[derive(Debug, Clone, Default)]
pub struct CollegePatch {
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

/// Outcome recorded from a status review
#[derive(Debug, Clone, Default)]
pub struct StatusUpdate {
    pub status: CollegeStatus,
    pub last_contact_date: Option<chrono::NaiveDate>,
    pub next_followup_date: Option<chrono::NaiveDate>,
    /// Kept only when `status` is `rejected`
    pub rejection_reason: Option<String>,
    pub status_notes: Option<String>,
}

/// Repository for College database operations
pub struct CollegeRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> CollegeRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// List colleges, newest first.
    pub async fn list(&self, filter: &CollegeFilter) -> Result<Vec<CollegeModel>, RepositoryError> {
        let mut query = College::find();

        if let Some(condition) = filter.search.as_deref().and_then(|term| {
            search_condition(term, &[Column::Name, Column::City, Column::ContactPerson])
        }) {
            query = query.filter(condition);
        }

        if let Some(status) = filter.status {
            query = query.filter(Column::Status.eq(status));
        }

        query
            .order_by_desc(Column::CreatedAt)
            .limit(filter.limit)
            .offset(filter.offset)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Every college, for statistics.
    pub async fn list_all(&self) -> Result<Vec<CollegeModel>, RepositoryError> {
        College::find()
            .order_by_desc(Column::CreatedAt)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<CollegeModel>, RepositoryError> {
        College::find_by_id(id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn exists(&self, id: Uuid) -> Result<bool, RepositoryError> {
        Ok(self.get(id).await?.is_some())
    }

    pub async fn create(&self, new: NewCollege) -> Result<CollegeModel, RepositoryError> {
        let name = validate_name(&new.name)?;
        let now = Utc::now();

        let college = CollegeActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            address: Set(optional_text(new.address)),
            city: Set(optional_text(new.city)),
            state: Set(optional_text(new.state)),
            pin_code: Set(optional_text(new.pin_code)),
            contact_person: Set(optional_text(new.contact_person)),
            contact_email: Set(optional_text(new.contact_email)),
            contact_phone: Set(optional_text(new.contact_phone)),
            college_type: Set(optional_text(new.college_type)),
            status: Set(new.status.unwrap_or_default()),
            last_contact_date: Set(None),
            next_followup_date: Set(new.next_followup_date),
            rejection_reason: Set(None),
            status_notes: Set(None),
            description: Set(optional_text(new.description)),
            created_by: Set(new.created_by),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        college
            .insert(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Apply a partial edit of the descriptive fields.
    pub async fn update_details(
        &self,
        id: Uuid,
        patch: CollegePatch,
    ) -> Result<CollegeModel, RepositoryError> {
        let college = self.require(id).await?;
        let mut active = college.into_active_model();

        if let Some(name) = patch.name {
            active.name = Set(validate_name(&name)?);
        }

        macro_rules! apply_text {
            ($($field:ident),*) => {
                $(
                    if let Some(value) = patch.$field {
                        active.$field = Set(optional_text(Some(value)));
                    }
                )*
            };
        }
        apply_text!(
            address,
            city,
            state,
            pin_code,
            contact_person,
            contact_email,
            contact_phone,
            college_type,
            description
        );

        active.updated_at = Set(Utc::now().into());

        active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Record a status review. All five status fields are replaced.
    pub async fn update_status(
        &self,
        id: Uuid,
        update: StatusUpdate,
    ) -> Result<CollegeModel, RepositoryError> {
        let college = self.require(id).await?;
        let mut active = college.into_active_model();

        let rejection_reason = if update.status == CollegeStatus::Rejected {
            optional_text(update.rejection_reason)
        } else {
            None
        };

        active.status = Set(update.status);
        active.last_contact_date = Set(update.last_contact_date);
        active.next_followup_date = Set(update.next_followup_date);
        active.rejection_reason = Set(rejection_reason);
        active.status_notes = Set(optional_text(update.status_notes));
        active.updated_at = Set(Utc::now().into());

        let updated = active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        tracing::info!(college_id = %id, status = updated.status.as_str(), "College status updated");

        Ok(updated)
    }

    /// Delete a college. Interaction logs and tasks are left untouched.
    pub async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let college = self.require(id).await?;

        college
            .delete(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(())
    }

    async fn require(&self, id: Uuid) -> Result<CollegeModel, RepositoryError> {
        self.get(id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("College"))
    }
}

fn validate_name(name: &str) -> Result<String, RepositoryError> {
    let name = name.trim();

    if name.is_empty() {
        return Err(RepositoryError::validation_error(
            "College name cannot be empty",
        ));
    }

    if name.chars().count() > 255 {
        return Err(RepositoryError::validation_error(
            "College name cannot exceed 255 characters",
        ));
    }

    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_trimmed() {
        assert_eq!(validate_name("  IIT Bombay ").unwrap(), "IIT Bombay");
    }

    #[test]
    fn blank_or_long_names_rejected() {
        assert!(matches!(
            validate_name("   "),
            Err(RepositoryError::Validation(_))
        ));
        assert!(validate_name(&"x".repeat(256)).is_err());
        assert!(validate_name(&"x".repeat(255)).is_ok());
    }
}
