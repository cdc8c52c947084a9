//! # Session Repository
//!
//! Sessions are looked up by the SHA-256 digest of their bearer token.

use chrono::{DateTime, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::session::{
    ActiveModel as SessionActiveModel, Column, Entity as Session, Model as SessionModel,
};

pub struct SessionRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> SessionRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        token_hash: String,
        expires_at: DateTime<Utc>,
    ) -> Result<SessionModel, RepositoryError> {
        let session = SessionActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            token_hash: Set(token_hash),
            expires_at: Set(expires_at.into()),
            created_at: Set(Utc::now().into()),
        };

        session
            .insert(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<SessionModel>, RepositoryError> {
        Session::find()
            .filter(Column::TokenHash.eq(token_hash))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Returns whether a session was removed.
    pub async fn delete_by_token_hash(&self, token_hash: &str) -> Result<bool, RepositoryError> {
        let result = Session::delete_many()
            .filter(Column::TokenHash.eq(token_hash))
            .exec(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(result.rows_affected > 0)
    }

    /// Remove every session that expired at or before `now`.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let cutoff: DateTimeWithTimeZone = now.into();
        let result = Session::delete_many()
            .filter(Column::ExpiresAt.lte(cutoff))
            .exec(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        if result.rows_affected > 0 {
            tracing::info!(purged = result.rows_affected, "Purged expired sessions");
        }

        Ok(result.rows_affected)
    }
}
