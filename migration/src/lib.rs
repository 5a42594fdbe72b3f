pub use sea_orm_migration::prelude::*;

mod m20251101_000001_create_plans;
mod m20251101_000002_create_subscription_links;
mod m20251101_000003_create_fees;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251101_000001_create_plans::Migration),
            Box::new(m20251101_000002_create_subscription_links::Migration),
            Box::new(m20251101_000003_create_fees::Migration),
        ]
    }
}
