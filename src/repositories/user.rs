//! # User Repository
//!
//! Accounts are keyed by lower-cased email.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::user::{ActiveModel as UserActiveModel, Column, Entity as User, Model as UserModel};

pub struct UserRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> UserRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserModel>, RepositoryError> {
        User::find()
            .filter(Column::Email.eq(normalize_email(email)))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<UserModel>, RepositoryError> {
        User::find_by_id(id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Insert a user. A taken email surfaces as [`RepositoryError::Conflict`].
    pub async fn create(
        &self,
        email: &str,
        full_name: &str,
        password_hash: String,
    ) -> Result<UserModel, RepositoryError> {
        let user = UserActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(normalize_email(email)),
            full_name: Set(full_name.trim().to_string()),
            password_hash: Set(password_hash),
            created_at: Set(Utc::now().into()),
        };

        user.insert(self.db).await.map_err(|err| {
            match RepositoryError::database_error(err) {
                RepositoryError::Conflict(_) => {
                    RepositoryError::Conflict("An account with this email already exists".to_string())
                }
                other => other,
            }
        })
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
