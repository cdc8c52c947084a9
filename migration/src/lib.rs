//! Database migrations for the outreach CRM.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2026_09_01_000001_create_colleges;
mod m2026_09_01_000002_create_interaction_logs;
mod m2026_09_01_000003_create_tasks;
mod m2026_09_01_000004_create_team_members;
mod m2026_09_02_000001_create_users_and_sessions;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2026_09_01_000001_create_colleges::Migration),
            Box::new(m2026_09_01_000002_create_interaction_logs::Migration),
            Box::new(m2026_09_01_000003_create_tasks::Migration),
            Box::new(m2026_09_01_000004_create_team_members::Migration),
            Box::new(m2026_09_02_000001_create_users_and_sessions::Migration),
        ]
    }
}
