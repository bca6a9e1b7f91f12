//! Prompt CRUD for the single library owner.
//!
//! Categories are reconciled on every read and write: rows may hold a legacy
//! string or a UUID, the API only ever sees the resolved category id.

use std::{cmp::Ordering, collections::HashSet};

use db::models::prompt::{CreatePrompt, Prompt, PromptRecord, SortBy, UpdatePrompt};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use ts_rs::TS;
use uuid::Uuid;

use super::{
    category_directory::{CategoryDirectory, CategorySnapshot},
    reconciler::CategoryReconciler,
};

/// Category filter value that matches every prompt.
pub const ALL_CATEGORIES: &str = "all";

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("prompt not found")]
    NotFound,
    #[error("prompt title must not be empty")]
    EmptyTitle,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct PromptQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub sort_by: SortBy,
}

/// A listing that degrades to empty instead of failing.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct PromptListing {
    pub prompts: Vec<Prompt>,
    pub error: Option<String>,
}

/// The prompt a mutation produced, with the owner's full listing re-read
/// after it.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct PromptMutation {
    pub prompt: Prompt,
    pub prompts: Vec<Prompt>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
    pub failed: usize,
}

fn matches_search(prompt: &Prompt, needle: &str) -> bool {
    prompt.title.to_lowercase().contains(needle)
        || prompt.description.to_lowercase().contains(needle)
        || prompt.content.to_lowercase().contains(needle)
        || prompt
            .tags
            .iter()
            .any(|tag| tag.to_lowercase().contains(needle))
}

fn compare(a: &Prompt, b: &Prompt, sort_by: SortBy) -> Ordering {
    b.is_favorite.cmp(&a.is_favorite).then_with(|| match sort_by {
        SortBy::Latest | SortBy::Favorite => b.created_at.cmp(&a.created_at),
        SortBy::Oldest => a.created_at.cmp(&b.created_at),
        SortBy::Title => a.title.cmp(&b.title),
        SortBy::Usage => b.usage_hours.cmp(&a.usage_hours),
    })
}

/// Filters and orders an already reconciled listing.
pub fn apply_query(
    prompts: Vec<Prompt>,
    query: &PromptQuery,
    reconciler: &CategoryReconciler<'_>,
) -> Vec<Prompt> {
    let category = query
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty() && *c != ALL_CATEGORIES)
        .map(|c| reconciler.to_uuid(c));
    let needle = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    let mut prompts: Vec<Prompt> = prompts
        .into_iter()
        .filter(|p| category.is_none_or(|id| p.category == id))
        .filter(|p| needle.as_deref().is_none_or(|n| matches_search(p, n)))
        .collect();
    // Stable, so equal keys keep the newest-first store order.
    prompts.sort_by(|a, b| compare(a, b, query.sort_by));
    prompts
}

fn reconcile(reconciler: &CategoryReconciler<'_>, record: PromptRecord) -> Prompt {
    let category = reconciler.to_uuid(&record.category);
    record.into_prompt(category)
}

#[derive(Clone)]
pub struct PromptRepository {
    pool: SqlitePool,
    owner_id: String,
    directory: CategoryDirectory,
}

impl PromptRepository {
    pub fn new(pool: SqlitePool, owner_id: impl Into<String>, directory: CategoryDirectory) -> Self {
        Self {
            pool,
            owner_id: owner_id.into(),
            directory,
        }
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    /// The owner's prompts reconciled against one directory snapshot, which
    /// is returned alongside for further lookups.
    async fn load_all(&self) -> Result<(Vec<Prompt>, CategorySnapshot), PromptError> {
        let records = PromptRecord::find_by_user(&self.pool, &self.owner_id).await?;
        let snapshot = self.directory.snapshot().await;
        let reconciler = CategoryReconciler::new(&snapshot.categories);
        let prompts: Vec<Prompt> = records
            .into_iter()
            .map(|record| reconcile(&reconciler, record))
            .collect();
        Ok((prompts, snapshot))
    }

    /// Every prompt of the owner, newest first.
    pub async fn all(&self) -> Result<Vec<Prompt>, PromptError> {
        Ok(self.load_all().await?.0)
    }

    /// The filtered and sorted listing. A failed read yields an empty
    /// listing with the error message.
    pub async fn list(&self, query: &PromptQuery) -> PromptListing {
        match self.load_all().await {
            Ok((prompts, snapshot)) => {
                let reconciler = CategoryReconciler::new(&snapshot.categories);
                let prompts = apply_query(prompts, query, &reconciler);
                debug!(count = prompts.len(), sort_by = %query.sort_by, "Listed prompts");
                PromptListing {
                    prompts,
                    error: None,
                }
            }
            Err(e) => {
                error!(error = %e, owner_id = %self.owner_id, "Failed to load prompts");
                PromptListing {
                    prompts: Vec::new(),
                    error: Some(format!("Failed to load prompts: {e}")),
                }
            }
        }
    }

    pub async fn get(&self, id: Uuid) -> Result<Prompt, PromptError> {
        let record = PromptRecord::find_by_id(&self.pool, &self.owner_id, id)
            .await?
            .ok_or(PromptError::NotFound)?;
        let snapshot = self.directory.snapshot().await;
        Ok(reconcile(&CategoryReconciler::new(&snapshot.categories), record))
    }

    async fn mutation(&self, record: PromptRecord) -> Result<PromptMutation, PromptError> {
        let (prompts, snapshot) = self.load_all().await?;
        let prompt = reconcile(&CategoryReconciler::new(&snapshot.categories), record);
        Ok(PromptMutation { prompt, prompts })
    }

    async fn insert(&self, data: &CreatePrompt) -> Result<PromptRecord, PromptError> {
        if data.title.trim().is_empty() {
            return Err(PromptError::EmptyTitle);
        }
        let snapshot = self.directory.snapshot().await;
        let category = CategoryReconciler::new(&snapshot.categories).to_legacy(&data.category);

        let record =
            PromptRecord::create(&self.pool, &self.owner_id, data, &category, Uuid::new_v4())
                .await?;
        info!(prompt_id = %record.id, category = %record.category, "Prompt created");
        Ok(record)
    }

    pub async fn create(&self, data: CreatePrompt) -> Result<PromptMutation, PromptError> {
        let record = self.insert(&data).await?;
        self.mutation(record).await
    }

    pub async fn update(&self, id: Uuid, data: UpdatePrompt) -> Result<PromptMutation, PromptError> {
        if data.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(PromptError::EmptyTitle);
        }
        let category = match data.category.as_deref() {
            Some(input) => {
                let snapshot = self.directory.snapshot().await;
                Some(CategoryReconciler::new(&snapshot.categories).to_legacy(input))
            }
            None => None,
        };

        let record =
            PromptRecord::update(&self.pool, &self.owner_id, id, &data, category.as_deref())
                .await?
                .ok_or(PromptError::NotFound)?;
        info!(prompt_id = %record.id, category = %record.category, "Prompt updated");
        self.mutation(record).await
    }

    /// Deletes the prompt and answers with the remaining listing.
    pub async fn delete(&self, id: Uuid) -> Result<Vec<Prompt>, PromptError> {
        let deleted = PromptRecord::delete(&self.pool, &self.owner_id, id).await?;
        if deleted == 0 {
            warn!(prompt_id = %id, "Delete of unknown prompt");
            return Err(PromptError::NotFound);
        }
        info!(prompt_id = %id, "Prompt deleted");
        Ok(self.load_all().await?.0)
    }

    pub async fn toggle_favorite(&self, id: Uuid) -> Result<PromptMutation, PromptError> {
        let current = PromptRecord::find_by_id(&self.pool, &self.owner_id, id)
            .await?
            .ok_or(PromptError::NotFound)?;

        let record =
            PromptRecord::set_favorite(&self.pool, &self.owner_id, id, !current.is_favorite)
                .await?
                .ok_or(PromptError::NotFound)?;
        info!(prompt_id = %id, is_favorite = record.is_favorite, "Prompt favorite toggled");
        self.mutation(record).await
    }

    /// Creates every prompt whose title the owner does not have yet. Single
    /// failures are logged and counted.
    pub async fn import(&self, prompts: Vec<CreatePrompt>) -> Result<ImportSummary, PromptError> {
        let mut known: HashSet<String> = PromptRecord::find_titles(&self.pool, &self.owner_id)
            .await?
            .into_iter()
            .collect();
        let mut summary = ImportSummary::default();

        for data in prompts {
            if known.contains(&data.title) {
                debug!(title = %data.title, "Skipping import of existing title");
                summary.skipped += 1;
                continue;
            }
            match self.insert(&data).await {
                Ok(_) => {
                    known.insert(data.title);
                    summary.imported += 1;
                }
                Err(e) => {
                    error!(error = %e, title = %data.title, "Failed to import prompt");
                    summary.failed += 1;
                }
            }
        }

        info!(
            imported = summary.imported,
            skipped = summary.skipped,
            failed = summary.failed,
            "Prompt import finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use db::{
        DBService,
        models::category::{Category, CreateCategory, DEFAULT_CATEGORIES},
    };

    use super::*;
    use crate::services::reconciler::FALLBACK_CATEGORY_ID;

    const OWNER: &str = "user-test";

    async fn repository() -> (DBService, PromptRepository) {
        let db = DBService::new_in_memory().await.unwrap();
        let directory = CategoryDirectory::new(db.pool.clone());
        directory.ensure_defaults().await.unwrap();
        let repository = PromptRepository::new(db.pool.clone(), OWNER, directory);
        (db, repository)
    }

    fn draft(title: &str, category: &str) -> CreatePrompt {
        CreatePrompt {
            title: title.to_string(),
            description: String::new(),
            content: "본문".to_string(),
            category: category.to_string(),
            tags: vec![],
            usage_hours: 0,
            is_favorite: false,
        }
    }

    async fn stored_category(db: &DBService, id: Uuid) -> String {
        PromptRecord::find_by_id(&db.pool, OWNER, id)
            .await
            .unwrap()
            .unwrap()
            .category
    }

    #[tokio::test]
    async fn create_persists_legacy_string_and_serves_uuid() {
        let (db, repository) = repository().await;
        let press = DEFAULT_CATEGORIES[1].id;

        let created = repository
            .create(draft("보도자료 초안", &press.to_string()))
            .await
            .unwrap();

        assert_eq!(created.prompt.category, press);
        assert_eq!(created.prompts.len(), 1);
        assert_eq!(stored_category(&db, created.prompt.id).await, "marketing");
    }

    #[tokio::test]
    async fn custom_categories_are_stored_by_id() {
        let (db, repository) = repository().await;
        let directory = CategoryDirectory::new(db.pool.clone());
        let custom = directory
            .create(CreateCategory {
                label: "회의록".to_string(),
                color: "text-teal-700".to_string(),
                bg_color: "bg-teal-100".to_string(),
                border_color: "border-teal-200".to_string(),
                description: None,
                is_default: None,
            })
            .await
            .unwrap();

        let created = repository
            .create(draft("회의 요약", &custom.id.to_string()))
            .await
            .unwrap();

        assert_eq!(created.prompt.category, custom.id);
        assert_eq!(stored_category(&db, created.prompt.id).await, custom.id.to_string());
    }

    #[tokio::test]
    async fn unknown_categories_are_kept_on_write_and_fall_back_on_read() {
        let (db, repository) = repository().await;
        PromptRecord::create(
            &db.pool,
            OWNER,
            &draft("옛 데이터", "research"),
            "research",
            Uuid::new_v4(),
        )
        .await
        .unwrap();

        let unknown = Uuid::new_v4().to_string();
        let created = repository.create(draft("새 데이터", &unknown)).await.unwrap();

        assert_eq!(created.prompt.category, FALLBACK_CATEGORY_ID);
        assert!(
            created
                .prompts
                .iter()
                .all(|p| p.category == FALLBACK_CATEGORY_ID)
        );
        assert_eq!(stored_category(&db, created.prompt.id).await, unknown);

        let updated = repository
            .update(
                created.prompt.id,
                UpdatePrompt {
                    category: Some("research".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.prompt.category, FALLBACK_CATEGORY_ID);
        assert_eq!(stored_category(&db, created.prompt.id).await, "research");
    }

    #[tokio::test]
    async fn update_stores_legacy_category_and_bumps_timestamp() {
        let (db, repository) = repository().await;
        let created = repository.create(draft("초안", "development")).await.unwrap();

        let updated = repository
            .update(
                created.prompt.id,
                UpdatePrompt {
                    category: Some(DEFAULT_CATEGORIES[4].id.to_string()),
                    usage_hours: Some(2),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.prompt.category, DEFAULT_CATEGORIES[4].id);
        assert_eq!(updated.prompt.usage_hours, 2);
        assert_eq!(updated.prompt.title, "초안");
        assert!(updated.prompt.updated_at >= created.prompt.updated_at);
        assert_eq!(stored_category(&db, created.prompt.id).await, "business");
    }

    #[tokio::test]
    async fn missing_prompts_are_not_found() {
        let (_db, repository) = repository().await;
        let id = Uuid::new_v4();

        assert!(matches!(repository.get(id).await, Err(PromptError::NotFound)));
        assert!(matches!(
            repository.update(id, UpdatePrompt::default()).await,
            Err(PromptError::NotFound)
        ));
        assert!(matches!(repository.delete(id).await, Err(PromptError::NotFound)));
        assert!(matches!(
            repository.toggle_favorite(id).await,
            Err(PromptError::NotFound)
        ));
    }

    #[tokio::test]
    async fn blank_titles_are_rejected() {
        let (_db, repository) = repository().await;
        assert!(matches!(
            repository.create(draft("  ", "development")).await,
            Err(PromptError::EmptyTitle)
        ));
    }

    #[tokio::test]
    async fn toggle_favorite_flips_the_flag() {
        let (_db, repository) = repository().await;
        let created = repository.create(draft("초안", "development")).await.unwrap();

        let once = repository.toggle_favorite(created.prompt.id).await.unwrap();
        assert!(once.prompt.is_favorite);
        let twice = repository.toggle_favorite(created.prompt.id).await.unwrap();
        assert!(!twice.prompt.is_favorite);
    }

    #[tokio::test]
    async fn delete_answers_with_the_remaining_prompts() {
        let (_db, repository) = repository().await;
        let first = repository.create(draft("하나", "development")).await.unwrap();
        repository.create(draft("둘", "analysis")).await.unwrap();

        let remaining = repository.delete(first.prompt.id).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].title, "둘");
    }

    #[tokio::test]
    async fn list_filters_by_category_and_search() {
        let (_db, repository) = repository().await;
        let mut tagged = draft("정책 비교", "analysis");
        tagged.tags = vec!["Budget".to_string()];
        repository.create(tagged).await.unwrap();
        repository.create(draft("보도자료 작성", "marketing")).await.unwrap();

        let by_legacy = repository
            .list(&PromptQuery {
                category: Some("analysis".to_string()),
                ..Default::default()
            })
            .await;
        assert_eq!(by_legacy.prompts.len(), 1);
        assert_eq!(by_legacy.prompts[0].title, "정책 비교");

        let by_id = repository
            .list(&PromptQuery {
                category: Some(DEFAULT_CATEGORIES[1].id.to_string()),
                ..Default::default()
            })
            .await;
        assert_eq!(by_id.prompts[0].title, "보도자료 작성");

        let by_tag = repository
            .list(&PromptQuery {
                search: Some("budget".to_string()),
                category: Some(ALL_CATEGORIES.to_string()),
                ..Default::default()
            })
            .await;
        assert_eq!(by_tag.prompts.len(), 1);

        let blank = repository
            .list(&PromptQuery {
                search: Some("   ".to_string()),
                ..Default::default()
            })
            .await;
        assert_eq!(blank.prompts.len(), 2);
        assert!(blank.error.is_none());
    }

    #[tokio::test]
    async fn fallback_filter_includes_unresolvable_prompts() {
        let (_db, repository) = repository().await;
        repository.create(draft("옛 분류", "research")).await.unwrap();
        repository.create(draft("기본", "development")).await.unwrap();
        repository.create(draft("분석", "analysis")).await.unwrap();

        let listing = repository
            .list(&PromptQuery {
                category: Some(FALLBACK_CATEGORY_ID.to_string()),
                sort_by: SortBy::Title,
                ..Default::default()
            })
            .await;
        let titles: Vec<&str> = listing.prompts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["기본", "옛 분류"]);
    }

    #[tokio::test]
    async fn failed_reads_degrade_to_an_empty_listing() {
        let (db, repository) = repository().await;
        repository.create(draft("초안", "development")).await.unwrap();

        db.pool.close().await;
        let listing = repository.list(&PromptQuery::default()).await;
        assert!(listing.prompts.is_empty());
        assert!(listing.error.is_some());
    }

    #[tokio::test]
    async fn import_skips_existing_and_repeated_titles() {
        let (_db, repository) = repository().await;
        repository.create(draft("있던 것", "development")).await.unwrap();

        let summary = repository
            .import(vec![
                draft("있던 것", "development"),
                draft("새 것", "creative"),
                draft("새 것", "creative"),
                draft("", "creative"),
            ])
            .await
            .unwrap();

        assert_eq!(
            summary,
            ImportSummary {
                imported: 1,
                skipped: 2,
                failed: 1,
            }
        );
        assert_eq!(repository.all().await.unwrap().len(), 2);
    }

    fn listed(title: &str, favorite: bool, usage_hours: i64, age_minutes: i64) -> Prompt {
        let created_at = Utc::now() - Duration::minutes(age_minutes);
        Prompt {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: String::new(),
            content: String::new(),
            category: FALLBACK_CATEGORY_ID,
            tags: vec![],
            usage_hours,
            is_favorite: favorite,
            created_at,
            updated_at: created_at,
        }
    }

    fn order(sort_by: SortBy) -> Vec<String> {
        let categories = Category::builtin_defaults();
        let reconciler = CategoryReconciler::new(&categories);
        let prompts = vec![
            listed("b", false, 5, 10),
            listed("c", true, 1, 30),
            listed("a", false, 9, 20),
            listed("d", true, 7, 5),
        ];
        let query = PromptQuery {
            sort_by,
            ..Default::default()
        };
        apply_query(prompts, &query, &reconciler)
            .into_iter()
            .map(|p| p.title)
            .collect()
    }

    #[test]
    fn favorites_always_sort_first() {
        assert_eq!(order(SortBy::Latest), ["d", "c", "b", "a"]);
        assert_eq!(order(SortBy::Oldest), ["c", "d", "a", "b"]);
        assert_eq!(order(SortBy::Title), ["c", "d", "a", "b"]);
        assert_eq!(order(SortBy::Usage), ["d", "c", "a", "b"]);
        assert_eq!(order(SortBy::Favorite), ["d", "c", "b", "a"]);
    }
}
