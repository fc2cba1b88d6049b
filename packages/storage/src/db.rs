// ABOUTME: Database connection management and migration runner
// ABOUTME: Provides the shared SQLite pool every domain package builds on

use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::info;

use crate::error::Result;
use crate::StorageError;

/// Embedded migrations, applied on every connect
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Open (creating if necessary) the SQLite database and bring the schema
/// up to date.
pub async fn connect(database_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| StorageError::InvalidUrl(format!("{database_url}: {e}")))?
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    MIGRATOR.run(&pool).await?;
    info!("Database ready at {}", database_url);

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_runs_migrations() {
        let pool = connect("sqlite::memory:").await.unwrap();

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();

        assert!(tables.contains(&"ideas".to_string()));
        assert!(tables.contains(&"buckets".to_string()));
        assert!(tables.contains(&"revision_entries".to_string()));
    }
}
