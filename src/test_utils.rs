use crate::database::{RetryPolicy, Storage};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database};
use std::time::Duration;

/// Fresh in-memory SQLite store with the full schema applied. A single
/// connection keeps every query on the same in-memory database.
pub async fn test_storage() -> Storage {
    let mut opt = ConnectOptions::new("sqlite::memory:".to_owned());
    opt.max_connections(1).min_connections(1).sqlx_logging(false);

    let conn = Database::connect(opt)
        .await
        .expect("failed to open in-memory sqlite");
    Migrator::up(&conn, None)
        .await
        .expect("failed to run migrations");

    Storage::new(conn, RetryPolicy::new(3, Duration::from_millis(1)))
}
