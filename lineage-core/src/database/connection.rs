use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use std::time::Duration;
use tracing::debug;

use super::migrations::Migrator;

pub const DEFAULT_DATABASE: &str = "lineage.db";

pub async fn establish_connection(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(database_url);

    // SQLite serialises writes; a small pool is plenty for the seed and the worker.
    opt.max_connections(5)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(5))
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(300))
        .sqlx_logging(true)
        .sqlx_logging_level(tracing::log::LevelFilter::Debug);

    // Every pooled connection to an in-memory database would see its own empty schema.
    if database_url.contains(":memory:") {
        opt.max_connections(1).min_connections(1);
    }

    Database::connect(opt).await
}

/// Connect to the SQLite file at `database_path` (or `:memory:`) and bring the
/// schema up to date.
pub async fn open_database(database_path: Option<&str>) -> Result<DatabaseConnection, DbErr> {
    let url = get_database_url(database_path);
    let db = establish_connection(&url).await?;
    Migrator::up(&db, None).await?;
    debug!("Database ready at {}", url);
    Ok(db)
}

pub fn get_database_url(database_path: Option<&str>) -> String {
    match database_path {
        Some(":memory:") => "sqlite::memory:".to_string(),
        Some(path) => format!("sqlite://{}?mode=rwc", path),
        None => format!("sqlite://{}?mode=rwc", DEFAULT_DATABASE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_url() {
        assert_eq!(get_database_url(Some(":memory:")), "sqlite::memory:");
        assert_eq!(
            get_database_url(Some("/tmp/figures.db")),
            "sqlite:///tmp/figures.db?mode=rwc"
        );
        assert_eq!(get_database_url(None), "sqlite://lineage.db?mode=rwc");
    }
}
