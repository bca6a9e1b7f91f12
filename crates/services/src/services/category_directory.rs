//! In-memory view of the category table with a store-first, cache-second,
//! built-in-defaults-last read path.

use std::sync::Arc;

use db::models::{
    category::{Category, CreateCategory, UpdateCategory},
    prompt::PromptRecord,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use ts_rs::TS;
use uuid::Uuid;

use super::reconciler::{label_for_legacy, legacy_for_label};

#[derive(Debug, Error)]
pub enum CategoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("category not found")]
    NotFound,
    #[error("category label must not be empty")]
    EmptyLabel,
    #[error("a category labelled '{0}' already exists")]
    DuplicateLabel(String),
    #[error("default categories cannot be deleted")]
    DefaultProtected,
    #[error("category is still used by {0} prompt(s)")]
    InUse(i64),
}

/// Where the categories of a snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
pub enum DirectorySource {
    Store,
    Cache,
    Builtin,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CategorySnapshot {
    pub categories: Vec<Category>,
    pub source: DirectorySource,
    pub error: Option<String>,
}

#[derive(Default)]
struct DirectoryState {
    cached: Option<Vec<Category>>,
    latest_error: Option<String>,
}

#[derive(Clone)]
pub struct CategoryDirectory {
    pool: SqlitePool,
    state: Arc<RwLock<DirectoryState>>,
}

fn duplicate_label(err: sqlx::Error, label: &str) -> CategoryError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            CategoryError::DuplicateLabel(label.to_string())
        }
        _ => CategoryError::Database(err),
    }
}

impl CategoryDirectory {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            state: Arc::new(RwLock::new(DirectoryState::default())),
        }
    }

    /// Seeds the default categories that are missing.
    pub async fn ensure_defaults(&self) -> Result<u64, CategoryError> {
        let inserted = Category::insert_defaults(&self.pool).await?;
        if inserted > 0 {
            info!(inserted, "Seeded default categories");
        }
        Ok(inserted)
    }

    async fn load(&self) -> Result<Vec<Category>, sqlx::Error> {
        let categories = Category::find_all(&self.pool).await?;
        if !categories.is_empty() {
            return Ok(categories);
        }
        info!("Category table is empty, seeding defaults");
        Category::insert_defaults(&self.pool).await?;
        Category::find_all(&self.pool).await
    }

    /// Reads the categories from the store. A failed read falls back to the
    /// last good list, then to the built-in defaults; it never errors.
    pub async fn snapshot(&self) -> CategorySnapshot {
        match self.load().await {
            Ok(categories) => {
                let mut state = self.state.write().await;
                state.cached = Some(categories.clone());
                state.latest_error = None;
                CategorySnapshot {
                    categories,
                    source: DirectorySource::Store,
                    error: None,
                }
            }
            Err(e) => {
                error!(error = %e, "Failed to load categories");
                let message = format!("Failed to load categories: {e}");
                let mut state = self.state.write().await;
                state.latest_error = Some(message.clone());
                match &state.cached {
                    Some(cached) => {
                        warn!(count = cached.len(), "Serving cached categories");
                        CategorySnapshot {
                            categories: cached.clone(),
                            source: DirectorySource::Cache,
                            error: Some(message),
                        }
                    }
                    None => {
                        warn!("No cached categories, serving built-in defaults");
                        CategorySnapshot {
                            categories: Category::builtin_defaults(),
                            source: DirectorySource::Builtin,
                            error: Some(message),
                        }
                    }
                }
            }
        }
    }

    pub async fn latest_error(&self) -> Option<String> {
        self.state.read().await.latest_error.clone()
    }

    pub async fn create(&self, data: CreateCategory) -> Result<Category, CategoryError> {
        let label = data.label.trim().to_string();
        if label.is_empty() {
            return Err(CategoryError::EmptyLabel);
        }
        let data = CreateCategory { label, ..data };

        let category = Category::create(&self.pool, &data, Uuid::new_v4())
            .await
            .map_err(|e| duplicate_label(e, &data.label))?;
        info!(category_id = %category.id, label = %category.label, "Category created");

        self.snapshot().await;
        Ok(category)
    }

    pub async fn update(&self, id: Uuid, data: UpdateCategory) -> Result<Category, CategoryError> {
        let label = match data.label.as_deref().map(str::trim) {
            Some("") => return Err(CategoryError::EmptyLabel),
            Some(label) => Some(label.to_string()),
            None => None,
        };
        if Category::is_seeded(id) && data.is_default == Some(false) {
            warn!(category_id = %id, "Refusing to demote a seeded default category");
            return Err(CategoryError::DefaultProtected);
        }
        let data = UpdateCategory { label, ..data };

        let category = Category::update(&self.pool, id, &data)
            .await
            .map_err(|e| duplicate_label(e, data.label.as_deref().unwrap_or_default()))?
            .ok_or(CategoryError::NotFound)?;
        info!(category_id = %category.id, label = %category.label, "Category updated");

        self.snapshot().await;
        Ok(category)
    }

    /// Deletes a custom category that no prompt references.
    pub async fn delete(&self, id: Uuid) -> Result<(), CategoryError> {
        let category = Category::find_by_id(&self.pool, id)
            .await?
            .ok_or(CategoryError::NotFound)?;

        // Seeded ids stay protected even when the flag was cleared in the store.
        if category.is_default || Category::is_seeded(category.id) {
            return Err(CategoryError::DefaultProtected);
        }

        // Prompts may reference the category by id or, for the primary
        // labels, by legacy string.
        let mut stored_forms = vec![category.id.to_string()];
        if let Some(legacy) = legacy_for_label(&category.label) {
            if label_for_legacy(legacy) == Some(category.label.as_str()) {
                stored_forms.push(legacy.to_string());
            }
        }
        let in_use = PromptRecord::count_with_category(&self.pool, &stored_forms).await?;
        if in_use > 0 {
            return Err(CategoryError::InUse(in_use));
        }

        Category::delete(&self.pool, id).await?;
        info!(category_id = %id, label = %category.label, "Category deleted");

        self.snapshot().await;
        Ok(())
    }
}
