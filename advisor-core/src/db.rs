use crate::config::{AuthConfig, DatabaseConfig};
use crate::credentials::CredentialStore;
use crate::error::AdvisorError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

pub async fn create_pool(config: &DatabaseConfig) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::new()
        .filename(&config.path)
        .create_if_missing(true);
    SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await
}

/// Single-connection in-memory pool. Each connection to `sqlite::memory:` is its
/// own database, so the pool must never open a second one.
pub async fn create_memory_pool() -> Result<SqlitePool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
}

pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            username TEXT PRIMARY KEY,
            password_hash TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// Open the users database, create the table if needed and wrap it in a store.
pub async fn open_credential_store(
    database: &DatabaseConfig,
    auth: &AuthConfig,
) -> Result<CredentialStore, AdvisorError> {
    let pool = create_pool(database).await?;
    init_schema(&pool).await?;
    tracing::info!(path = %database.path, "Credential store ready");
    Ok(CredentialStore::new(pool, auth)?)
}

pub async fn health_check(pool: &SqlitePool) -> Result<String, sqlx::Error> {
    let row: (String,) = sqlx::query_as("SELECT sqlite_version()")
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}
