use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, types::Json};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

/// Ordering applied to a prompt listing. Favorites always come first; this
/// picks the tie-breaker.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SortBy {
    #[default]
    Latest,
    Oldest,
    Title,
    Usage,
    Favorite,
}

/// A prompt as served by the API. `category` is always the id of an existing
/// category; legacy strings never leave the service layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct Prompt {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub content: String,
    pub category: Uuid,
    pub tags: Vec<String>,
    pub usage_hours: i64,
    pub is_favorite: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row of `prompts`. `category` is the persisted form: a legacy string such
/// as `development`, or a UUID in text form.
#[derive(Debug, Clone, FromRow)]
pub struct PromptRecord {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub content: String,
    pub category: String,
    pub tags: Json<Vec<String>>,
    pub usage_hours: i64,
    pub is_favorite: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreatePrompt {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub content: String,
    pub category: String, // Category UUID or legacy string
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub usage_hours: i64,
    #[serde(default)]
    pub is_favorite: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdatePrompt {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub usage_hours: Option<i64>,
    pub is_favorite: Option<bool>,
}

const SELECT_COLUMNS: &str = "id, user_id, title, description, content, category, tags, usage_hours, is_favorite, created_at, updated_at";

fn stored_description(description: &str) -> Option<String> {
    if description.is_empty() {
        None
    } else {
        Some(description.to_string())
    }
}

impl PromptRecord {
    /// Converts the row into its API shape with an already resolved category.
    pub fn into_prompt(self, category: Uuid) -> Prompt {
        Prompt {
            id: self.id,
            title: self.title,
            description: self.description.unwrap_or_default(),
            content: self.content,
            category,
            tags: self.tags.0,
            usage_hours: self.usage_hours,
            is_favorite: self.is_favorite,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub async fn find_by_user(pool: &SqlitePool, user_id: &str) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, PromptRecord>(&format!(
            "SELECT {SELECT_COLUMNS} FROM prompts WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(
        pool: &SqlitePool,
        user_id: &str,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, PromptRecord>(&format!(
            "SELECT {SELECT_COLUMNS} FROM prompts WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_titles(pool: &SqlitePool, user_id: &str) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>("SELECT title FROM prompts WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Counts prompts of every owner whose stored category is one of `categories`.
    pub async fn count_with_category(
        pool: &SqlitePool,
        categories: &[String],
    ) -> Result<i64, sqlx::Error> {
        let mut total = 0;
        for category in categories {
            total += sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM prompts WHERE category = $1")
                .bind(category)
                .fetch_one(pool)
                .await?;
        }
        Ok(total)
    }

    /// Inserts a prompt. `category` must already be in its persisted form.
    pub async fn create(
        pool: &SqlitePool,
        user_id: &str,
        data: &CreatePrompt,
        category: &str,
        prompt_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let now = Utc::now();
        sqlx::query_as::<_, PromptRecord>(&format!(
            r#"INSERT INTO prompts (id, user_id, title, description, content, category, tags, usage_hours, is_favorite, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
               RETURNING {SELECT_COLUMNS}"#
        ))
        .bind(prompt_id)
        .bind(user_id)
        .bind(&data.title)
        .bind(stored_description(&data.description))
        .bind(&data.content)
        .bind(category)
        .bind(Json(&data.tags))
        .bind(data.usage_hours)
        .bind(data.is_favorite)
        .bind(now)
        .fetch_one(pool)
        .await
    }

    /// Applies the provided fields and bumps `updated_at`. `category`, when
    /// present, must already be in its persisted form. Returns `None` when
    /// the prompt does not exist for this owner.
    pub async fn update(
        pool: &SqlitePool,
        user_id: &str,
        id: Uuid,
        data: &UpdatePrompt,
        category: Option<&str>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let Some(existing) = Self::find_by_id(pool, user_id, id).await? else {
            return Ok(None);
        };

        let title = data.title.clone().unwrap_or(existing.title);
        let description = match &data.description {
            Some(d) => stored_description(d),
            None => existing.description,
        };
        let content = data.content.clone().unwrap_or(existing.content);
        let category = category.map(str::to_string).unwrap_or(existing.category);
        let tags = data.tags.clone().unwrap_or(existing.tags.0);
        let usage_hours = data.usage_hours.unwrap_or(existing.usage_hours);
        let is_favorite = data.is_favorite.unwrap_or(existing.is_favorite);

        sqlx::query_as::<_, PromptRecord>(&format!(
            r#"UPDATE prompts
               SET title = $3, description = $4, content = $5, category = $6, tags = $7,
                   usage_hours = $8, is_favorite = $9, updated_at = $10
               WHERE id = $1 AND user_id = $2
               RETURNING {SELECT_COLUMNS}"#
        ))
        .bind(id)
        .bind(user_id)
        .bind(title)
        .bind(description)
        .bind(content)
        .bind(category)
        .bind(Json(tags))
        .bind(usage_hours)
        .bind(is_favorite)
        .bind(Utc::now())
        .fetch_optional(pool)
        .await
    }

    pub async fn set_favorite(
        pool: &SqlitePool,
        user_id: &str,
        id: Uuid,
        is_favorite: bool,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, PromptRecord>(&format!(
            r#"UPDATE prompts SET is_favorite = $3, updated_at = $4
               WHERE id = $1 AND user_id = $2
               RETURNING {SELECT_COLUMNS}"#
        ))
        .bind(id)
        .bind(user_id)
        .bind(is_favorite)
        .bind(Utc::now())
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, user_id: &str, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM prompts WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DBService;

    const OWNER: &str = "user-test";

    fn sample(title: &str, category: &str) -> CreatePrompt {
        CreatePrompt {
            title: title.to_string(),
            description: String::new(),
            content: "Summarize the following text.".to_string(),
            category: category.to_string(),
            tags: vec!["summary".to_string()],
            usage_hours: 0,
            is_favorite: false,
        }
    }

    #[tokio::test]
    async fn create_stores_empty_description_as_null() {
        let db = DBService::new_in_memory().await.unwrap();
        let data = sample("요약", "development");

        let record = PromptRecord::create(&db.pool, OWNER, &data, "development", Uuid::new_v4())
            .await
            .unwrap();

        assert_eq!(record.description, None);
        assert_eq!(record.tags.0, vec!["summary".to_string()]);
        let prompt = record.into_prompt(Uuid::nil());
        assert_eq!(prompt.description, "");
    }

    #[tokio::test]
    async fn queries_are_scoped_to_the_owner() {
        let db = DBService::new_in_memory().await.unwrap();
        let data = sample("요약", "development");
        let record = PromptRecord::create(&db.pool, OWNER, &data, "development", Uuid::new_v4())
            .await
            .unwrap();

        assert!(
            PromptRecord::find_by_id(&db.pool, "someone-else", record.id)
                .await
                .unwrap()
                .is_none()
        );
        assert_eq!(
            PromptRecord::delete(&db.pool, "someone-else", record.id)
                .await
                .unwrap(),
            0
        );
        assert_eq!(PromptRecord::find_by_user(&db.pool, OWNER).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_merges_partial_changes() {
        let db = DBService::new_in_memory().await.unwrap();
        let data = sample("요약", "development");
        let record = PromptRecord::create(&db.pool, OWNER, &data, "development", Uuid::new_v4())
            .await
            .unwrap();

        let updated = PromptRecord::update(
            &db.pool,
            OWNER,
            record.id,
            &UpdatePrompt {
                title: Some("[중급] 요약".to_string()),
                usage_hours: Some(3),
                ..Default::default()
            },
            Some("marketing"),
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(updated.title, "[중급] 요약");
        assert_eq!(updated.usage_hours, 3);
        assert_eq!(updated.category, "marketing");
        assert_eq!(updated.content, data.content);
        assert!(updated.updated_at >= record.updated_at);
    }

    #[tokio::test]
    async fn count_with_category_matches_any_stored_form() {
        let db = DBService::new_in_memory().await.unwrap();
        let id = Uuid::new_v4().to_string();
        for (title, category) in [("a", "development"), ("b", id.as_str()), ("c", "business")] {
            PromptRecord::create(&db.pool, OWNER, &sample(title, category), category, Uuid::new_v4())
                .await
                .unwrap();
        }

        let count =
            PromptRecord::count_with_category(&db.pool, &[id.clone(), "development".to_string()])
                .await
                .unwrap();
        assert_eq!(count, 2);
    }
}
