use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// Errors from the persistence layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Referenced record missing: {0}")]
    MissingReference(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Classify constraint violations reported by PostgreSQL so callers can
    /// react to them without inspecting SQLSTATE codes.
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let constraint = db_err.constraint().unwrap_or("unknown").to_string();
            match db_err.code().as_deref() {
                Some("23505") => return DatabaseError::UniqueViolation(constraint),
                Some("23503") => return DatabaseError::MissingReference(constraint),
                _ => {}
            }
        }
        DatabaseError::Sqlx(err)
    }
}

/// Builds and prepares the PostgreSQL connection pool
pub struct DatabaseManager;

impl DatabaseManager {
    /// Connect a pool using the configured URL, size and acquire timeout
    pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let connection_string = Self::build_connection_string(config)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(&connection_string)
            .await?;

        info!(
            "Created database pool (max_connections={})",
            config.max_connections
        );
        Ok(pool)
    }

    /// Apply the embedded migrations under `migrations/`
    pub async fn migrate(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(|e| DatabaseError::MigrationError(e.to_string()))?;
        info!("Database migrations applied");
        Ok(())
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }

    fn build_connection_string(config: &DatabaseConfig) -> Result<String, DatabaseError> {
        let base = config
            .url
            .as_deref()
            .ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;

        let url = url::Url::parse(base).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        match url.scheme() {
            "postgres" | "postgresql" => {}
            _ => return Err(DatabaseError::InvalidDatabaseUrl),
        }
        // A URL without a database path would silently connect to the user's default db
        if url.path().trim_start_matches('/').is_empty() {
            return Err(DatabaseError::InvalidDatabaseUrl);
        }
        Ok(url.into())
    }
}
