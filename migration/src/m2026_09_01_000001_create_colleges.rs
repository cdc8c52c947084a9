//! Migration to create the colleges table.
//!
//! Colleges are the outreach pipeline records: contact details plus the
//! current pipeline status and follow-up dates.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Colleges::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Colleges::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Colleges::Name).text().not_null())
                    .col(ColumnDef::new(Colleges::Address).text().null())
                    .col(ColumnDef::new(Colleges::City).text().null())
                    .col(ColumnDef::new(Colleges::State).text().null())
                    .col(ColumnDef::new(Colleges::PinCode).text().null())
                    .col(ColumnDef::new(Colleges::ContactPerson).text().null())
                    .col(ColumnDef::new(Colleges::ContactEmail).text().null())
                    .col(ColumnDef::new(Colleges::ContactPhone).text().null())
                    .col(ColumnDef::new(Colleges::CollegeType).text().null())
                    .col(
                        ColumnDef::new(Colleges::Status)
                            .string_len(32)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Colleges::LastContactDate).date().null())
                    .col(ColumnDef::new(Colleges::NextFollowupDate).date().null())
                    .col(ColumnDef::new(Colleges::RejectionReason).text().null())
                    .col(ColumnDef::new(Colleges::StatusNotes).text().null())
                    .col(ColumnDef::new(Colleges::Description).text().null())
                    .col(ColumnDef::new(Colleges::CreatedBy).uuid().null())
                    .col(
                        ColumnDef::new(Colleges::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Colleges::UpdatedAt)
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
                    .name("idx_colleges_status")
                    .table(Colleges::Table)
                    .col(Colleges::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_colleges_status").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Colleges::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Colleges {
    Table,
    Id,
    Name,
    Address,
    City,
    State,
    PinCode,
    ContactPerson,
    ContactEmail,
    ContactPhone,
    CollegeType,
    Status,
    LastContactDate,
    NextFollowupDate,
    RejectionReason,
    StatusNotes,
    Description,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}
