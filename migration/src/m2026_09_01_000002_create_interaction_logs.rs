//! Migration to create the interaction_logs table.
//!
//! Interaction logs are append-only records of contact attempts with a
//! college. The college reference is indexed but not constrained; removing a
//! college leaves its history in place.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(InteractionLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InteractionLogs::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(InteractionLogs::CollegeId).uuid().not_null())
                    .col(ColumnDef::new(InteractionLogs::ExecutiveName).text().null())
                    .col(
                        ColumnDef::new(InteractionLogs::ContactMethod)
                            .string_len(16)
                            .not_null()
                            .default("Call"),
                    )
                    .col(ColumnDef::new(InteractionLogs::Notes).text().not_null())
                    .col(
                        ColumnDef::new(InteractionLogs::InteractionDate)
                            .date()
                            .not_null(),
                    )
                    .col(ColumnDef::new(InteractionLogs::FileUrl).text().null())
                    .col(
                        ColumnDef::new(InteractionLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_interaction_logs_college_id")
                    .table(InteractionLogs::Table)
                    .col(InteractionLogs::CollegeId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_interaction_logs_college_id")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(InteractionLogs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum InteractionLogs {
    Table,
    Id,
    CollegeId,
    ExecutiveName,
    ContactMethod,
    Notes,
    InteractionDate,
    FileUrl,
    CreatedAt,
}
