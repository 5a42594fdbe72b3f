use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum SubscriptionLinks {
    Table,
    Id,
    AccountId,
    PlanId,
    StartDate,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // No foreign key on plan_id: links to a missing plan are skipped at generation time.
        manager
            .create_table(
                Table::create()
                    .table(SubscriptionLinks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SubscriptionLinks::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SubscriptionLinks::AccountId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SubscriptionLinks::PlanId).integer().not_null())
                    .col(
                        ColumnDef::new(SubscriptionLinks::StartDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_subscription_links_account")
                    .table(SubscriptionLinks::Table)
                    .col(SubscriptionLinks::AccountId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(SubscriptionLinks::Table)
                    .to_owned(),
            )
            .await
    }
}
