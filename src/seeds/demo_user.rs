//! Demo account seeding
//!
//! Ensures the configured demo credentials can sign in like any other
//! account. An existing user with the demo email is left untouched.

use anyhow::{Context, Result};
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::password::hash_password_async;
use crate::repositories::UserRepository;

const DEMO_FULL_NAME: &str = "Demo User";

/// Seeds the demo user when demo credentials are configured.
///
/// Returns whether a new user was created.
pub async fn seed_demo_user(db: &DatabaseConnection, config: &AppConfig) -> Result<bool> {
    let Some((email, password)) = config.demo_credentials() else {
        return Ok(false);
    };

    let repo = UserRepository::new(db);

    if repo
        .find_by_email(email)
        .await
        .context("Failed to look up demo user")?
        .is_some()
    {
        tracing::info!(email = %email, "Demo user already exists, skipping");
        return Ok(false);
    }

    let password_hash = hash_password_async(password.to_string(), config.password_hash_iterations)
        .await
        .context("Failed to hash demo password")?;

    repo.create(email, DEMO_FULL_NAME, password_hash)
        .await
        .context("Failed to create demo user")?;

    tracing::info!(email = %email, "Seeded demo user");
    Ok(true)
}
