use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::{redact, DatabaseConfig};
use crate::database::query_builder::QueryBuildError;

/// Errors surfaced by the data-access layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("failed to build query: {0}")]
    QueryBuild(#[from] QueryBuildError),

    /// No row matched; for todos this also covers rows owned by someone else
    #[error("user not found")]
    UserNotFound,

    #[error("todo not found")]
    TodoNotFound,

    #[error("{operation}: {source}")]
    Storage {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl DatabaseError {
    /// Wrap a driver error with the name of the operation that produced it
    pub fn storage(operation: &'static str) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| DatabaseError::Storage { operation, source }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DatabaseError::UserNotFound | DatabaseError::TodoNotFound)
    }

    pub fn is_unique_violation(&self) -> bool {
        match self {
            DatabaseError::Storage { source: sqlx::Error::Database(db), .. } => db.is_unique_violation(),
            _ => false,
        }
    }
}

#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn ping(&self) -> Result<(), DatabaseError>;
}

/// Shared connection pool; cloning hands out another handle to the same pool
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let url = config
            .url
            .as_deref()
            .ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
            .connect(url)
            .await
            .map_err(DatabaseError::storage("connect to postgres"))?;

        info!(url = %redact(url), max_connections = config.max_connections, "Connected to database");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("Closed database pool");
    }
}

#[async_trait]
impl HealthCheck for Database {
    async fn ping(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::storage("ping"))?;
        Ok(())
    }
}
