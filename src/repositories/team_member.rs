//! # Team Member Repository

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, ModelTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::{optional_text, search_condition};
use crate::error::RepositoryError;
use crate::models::team_member::{
    ActiveModel as MemberActiveModel, Column, Entity as TeamMember, MemberStatus,
    Model as MemberModel, TeamRole,
};

#[derive(Debug, Clone, Default)]
pub struct TeamMemberFilter {
    /// Case-insensitive match against name, email and department
    pub search: Option<String>,
    pub role: Option<TeamRole>,
}

#[derive(Debug, Clone, Default)]
pub struct NewTeamMember {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Option<TeamRole>,
    pub department: Option<String>,
    pub status: Option<MemberStatus>,
}

#[derive(Debug, Clone, Default)]
pub struct TeamMemberPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<TeamRole>,
    pub department: Option<String>,
    pub status: Option<MemberStatus>,
}

pub struct TeamMemberRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> TeamMemberRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(&self, filter: &TeamMemberFilter) -> Result<Vec<MemberModel>, RepositoryError> {
        let mut query = TeamMember::find();

        if let Some(condition) = filter.search.as_deref().and_then(|term| {
            search_condition(term, &[Column::Name, Column::Email, Column::Department])
        }) {
            query = query.filter(condition);
        }

        if let Some(role) = filter.role {
            query = query.filter(Column::Role.eq(role));
        }

        query
            .order_by_desc(Column::CreatedAt)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn list_all(&self) -> Result<Vec<MemberModel>, RepositoryError> {
        self.list(&TeamMemberFilter::default()).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<MemberModel>, RepositoryError> {
        TeamMember::find_by_id(id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn create(&self, new: NewTeamMember) -> Result<MemberModel, RepositoryError> {
        let name = required(&new.name, "Team member name")?;
        let email = validate_email(&new.email)?;
        let now = Utc::now();

        let member = MemberActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            email: Set(email),
            phone: Set(optional_text(new.phone)),
            role: Set(new.role.unwrap_or_default()),
            department: Set(optional_text(new.department)),
            status: Set(new.status.unwrap_or_default()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        member
            .insert(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn update(
        &self,
        id: Uuid,
        patch: TeamMemberPatch,
    ) -> Result<MemberModel, RepositoryError> {
        let member = self.require(id).await?;
        let mut active = member.into_active_model();

        if let Some(name) = patch.name {
            active.name = Set(required(&name, "Team member name")?);
        }
        if let Some(email) = patch.email {
            active.email = Set(validate_email(&email)?);
        }
        if let Some(phone) = patch.phone {
            active.phone = Set(optional_text(Some(phone)));
        }
        if let Some(role) = patch.role {
            active.role = Set(role);
        }
        if let Some(department) = patch.department {
            active.department = Set(optional_text(Some(department)));
        }
        if let Some(status) = patch.status {
            active.status = Set(status);
        }

        active.updated_at = Set(Utc::now().into());

        active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let member = self.require(id).await?;

        member
            .delete(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(())
    }

    async fn require(&self, id: Uuid) -> Result<MemberModel, RepositoryError> {
        self.get(id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("Team member"))
    }
}

fn required(value: &str, what: &str) -> Result<String, RepositoryError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(RepositoryError::validation_error(format!(
            "{what} cannot be empty"
        )));
    }
    Ok(value.to_string())
}

fn validate_email(email: &str) -> Result<String, RepositoryError> {
    let email = required(email, "Team member email")?;
    if !email.contains('@') {
        return Err(RepositoryError::validation_error(
            "Team member email must contain '@'",
        ));
    }
    Ok(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_needs_at_sign() {
        assert!(validate_email("asha@example.com").is_ok());
        assert!(validate_email("asha.example.com").is_err());
        assert!(validate_email("  ").is_err());
    }
}
