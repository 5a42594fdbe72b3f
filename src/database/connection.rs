use crate::config::DatabaseConfig;
use crate::error::AppResult;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

pub type DbPool = DatabaseConnection;

pub async fn create_pool(config: &DatabaseConfig) -> AppResult<DbPool> {
    let mut opt = ConnectOptions::new(config.url.clone());
    opt.max_connections(config.max_connections)
        .sqlx_logging(false);

    let pool = Database::connect(opt).await?;
    log::info!(
        "Database connected with {} max connections",
        config.max_connections
    );
    Ok(pool)
}

/// Brings the schema up to date. Runs once at startup, before any service
/// touches storage.
pub async fn run_migrations(pool: &DbPool) -> AppResult<()> {
    Migrator::up(pool, None).await?;
    Ok(())
}
