use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Fees {
    Table,
    Id,
    AccountId,
    Amount,
    DueDate,
    Status,
    PaidAt,
    Note,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Fees::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Fees::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Fees::AccountId).integer().null())
                    .col(ColumnDef::new(Fees::Amount).big_integer().not_null())
                    .col(ColumnDef::new(Fees::DueDate).date().not_null())
                    .col(
                        ColumnDef::new(Fees::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Fees::PaidAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Fees::Note).text().null())
                    .col(
                        ColumnDef::new(Fees::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::current_timestamp())
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Fees::UpdatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::current_timestamp())
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        for (name, col) in [
            ("idx_fees_account", Fees::AccountId),
            ("idx_fees_due_date", Fees::DueDate),
            ("idx_fees_status", Fees::Status),
        ] {
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name(name)
                        .table(Fees::Table)
                        .col(col)
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().if_exists().table(Fees::Table).to_owned())
            .await
    }
}
