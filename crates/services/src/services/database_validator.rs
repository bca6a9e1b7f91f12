//! Startup check that the prompt library schema is in place.

use serde::Serialize;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, warn};

/// Tables the prompt library cannot run without.
pub const REQUIRED_TABLES: [&str; 2] = ["categories", "prompts"];

#[derive(Debug, Error)]
pub enum DatabaseValidationError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub struct DatabaseValidator {
    pool: SqlitePool,
}

impl DatabaseValidator {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn table_exists(&self, table: &str) -> Result<bool, DatabaseValidationError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = $1",
        )
        .bind(table)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    /// Checks the migration history and every table in [`REQUIRED_TABLES`].
    pub async fn validate(&self) -> Result<ValidationResult, DatabaseValidationError> {
        if !self.table_exists("_sqlx_migrations").await? {
            warn!("Database has no migration history");
            return Ok(ValidationResult {
                is_initialized: false,
                migrations_applied: 0,
                latest_migration: None,
                missing_tables: REQUIRED_TABLES.iter().map(|t| t.to_string()).collect(),
            });
        }

        let migrations_applied =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
                .fetch_one(&self.pool)
                .await?;
        let latest_migration = self.latest_migration().await?;
        let missing_tables = self.missing_tables(&REQUIRED_TABLES).await?;

        let result = ValidationResult {
            is_initialized: true,
            migrations_applied: migrations_applied as usize,
            latest_migration,
            missing_tables,
        };
        if result.is_ok() {
            info!(
                migrations_applied = result.migrations_applied,
                latest = result.latest_migration.as_deref().unwrap_or("-"),
                "Database validation complete"
            );
        } else {
            warn!(missing = ?result.missing_tables, "Database validation found missing tables");
        }
        Ok(result)
    }

    pub async fn missing_tables(&self, tables: &[&str]) -> Result<Vec<String>, DatabaseValidationError> {
        let mut missing = Vec::new();
        for table in tables {
            if !self.table_exists(table).await? {
                missing.push(table.to_string());
            }
        }
        Ok(missing)
    }

    pub async fn latest_migration(&self) -> Result<Option<String>, DatabaseValidationError> {
        let migration = sqlx::query_scalar::<_, String>(
            "SELECT description FROM _sqlx_migrations WHERE success = 1 ORDER BY version DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(migration)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    pub is_initialized: bool,
    pub migrations_applied: usize,
    pub latest_migration: Option<String>,
    pub missing_tables: Vec<String>,
}

impl ValidationResult {
    pub fn is_ok(&self) -> bool {
        self.is_initialized && self.missing_tables.is_empty()
    }

    pub fn summary(&self) -> String {
        if !self.is_initialized {
            "Database not initialized - migrations need to be run".to_string()
        } else if !self.missing_tables.is_empty() {
            format!("Database is missing tables: {}", self.missing_tables.join(", "))
        } else {
            format!("Database OK - {} migrations applied", self.migrations_applied)
        }
    }
}
