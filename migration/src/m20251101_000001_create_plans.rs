use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Plans {
    Table,
    Id,
    Name,
    Price,
    DueDay,
    Active,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Plans::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Plans::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Plans::Name)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    // minor units (cents)
                    .col(ColumnDef::new(Plans::Price).big_integer().not_null())
                    .col(
                        ColumnDef::new(Plans::DueDay)
                            .integer()
                            .not_null()
                            .default(10),
                    )
                    .col(
                        ColumnDef::new(Plans::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Plans::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::current_timestamp())
                            .null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().if_exists().table(Plans::Table).to_owned())
            .await
    }
}
