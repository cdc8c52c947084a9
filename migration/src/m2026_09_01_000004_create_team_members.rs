//! Migration to create the team_members table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TeamMembers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TeamMembers::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TeamMembers::Name).text().not_null())
                    .col(ColumnDef::new(TeamMembers::Email).text().not_null())
                    .col(ColumnDef::new(TeamMembers::Phone).text().null())
                    .col(
                        ColumnDef::new(TeamMembers::Role)
                            .string_len(32)
                            .not_null()
                            .default("field_executive"),
                    )
                    .col(ColumnDef::new(TeamMembers::Department).text().null())
                    .col(
                        ColumnDef::new(TeamMembers::Status)
                            .string_len(16)
                            .not_null()
                            .default("active"),
                    )
                    .col(
                        ColumnDef::new(TeamMembers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(TeamMembers::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TeamMembers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum TeamMembers {
    Table,
    Id,
    Name,
    Email,
    Phone,
    Role,
    Department,
    Status,
    CreatedAt,
    UpdatedAt,
}
