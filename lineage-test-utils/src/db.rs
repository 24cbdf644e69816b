use lineage::database::migrations::Migrator;
use sea_orm::{Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;

pub struct TestDb {
    url: String,
}

impl TestDb {
    pub fn new_in_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
        }
    }

    pub fn new_file(path: impl AsRef<std::path::Path>) -> Self {
        Self {
            url: format!("sqlite://{}?mode=rwc", path.as_ref().display()),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Connect and run every migration.
    pub async fn connect(&self) -> Result<DatabaseConnection, DbErr> {
        let db = Database::connect(&self.url).await?;
        Migrator::up(&db, None).await?;
        Ok(db)
    }
}
