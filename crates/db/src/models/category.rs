use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// A category as stored in `categories`. The color fields are Tailwind class
/// names consumed by the UI and carry no meaning here.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, TS)]
pub struct Category {
    pub id: Uuid,
    pub label: String,
    pub color: String,
    pub bg_color: String,
    pub border_color: String,
    pub description: Option<String>,
    pub is_default: bool, // Protects the category from deletion
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateCategory {
    pub label: String,
    pub color: String,
    pub bg_color: String,
    pub border_color: String,
    pub description: Option<String>,
    pub is_default: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateCategory {
    pub label: Option<String>,
    pub color: Option<String>,
    pub bg_color: Option<String>,
    pub border_color: Option<String>,
    pub description: Option<String>,
    pub is_default: Option<bool>,
}

/// One of the categories seeded on first run.
#[derive(Debug, Clone, Copy)]
pub struct DefaultCategory {
    pub id: Uuid,
    pub label: &'static str,
    pub color: &'static str,
    pub bg_color: &'static str,
    pub border_color: &'static str,
}

pub const DEFAULT_CATEGORIES: [DefaultCategory; 5] = [
    DefaultCategory {
        id: Uuid::from_u128(0x91a38be2_3dca_4c28_a7c7_bce2ed9d54d2),
        label: "기본 프롬프트",
        color: "text-purple-700",
        bg_color: "bg-purple-100",
        border_color: "border-purple-200",
    },
    DefaultCategory {
        id: Uuid::from_u128(0x437e1cff_0ec1_4d9f_b37f_7a96d8d2a0ae),
        label: "보도자료",
        color: "text-blue-700",
        bg_color: "bg-blue-100",
        border_color: "border-blue-200",
    },
    DefaultCategory {
        id: Uuid::from_u128(0x960b5ae8_210e_4106_a5a6_e1aba0da0b23),
        label: "이슈분석",
        color: "text-green-700",
        bg_color: "bg-green-100",
        border_color: "border-green-200",
    },
    DefaultCategory {
        id: Uuid::from_u128(0x4bd095c7_261d_40f8_aca2_1b450adf0d37),
        label: "질의서작성",
        color: "text-yellow-700",
        bg_color: "bg-yellow-100",
        border_color: "border-yellow-200",
    },
    DefaultCategory {
        id: Uuid::from_u128(0xd891db58_09c8_495e_ad9e_453f1d7b4713),
        label: "시각화",
        color: "text-red-700",
        bg_color: "bg-red-100",
        border_color: "border-red-200",
    },
];

impl DefaultCategory {
    pub fn to_category(&self, now: DateTime<Utc>) -> Category {
        Category {
            id: self.id,
            label: self.label.to_string(),
            color: self.color.to_string(),
            bg_color: self.bg_color.to_string(),
            border_color: self.border_color.to_string(),
            description: None,
            is_default: true,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Category {
    /// True for the ids of [`DEFAULT_CATEGORIES`], whatever their stored flag.
    pub fn is_seeded(id: Uuid) -> bool {
        DEFAULT_CATEGORIES.iter().any(|category| category.id == id)
    }

    /// The seeded defaults as plain values, for when the store cannot be read.
    pub fn builtin_defaults() -> Vec<Category> {
        let epoch = DateTime::<Utc>::default();
        DEFAULT_CATEGORIES
            .iter()
            .map(|category| category.to_category(epoch))
            .collect()
    }

    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            r#"SELECT id, label, color, bg_color, border_color, description, is_default, created_at, updated_at
               FROM categories
               ORDER BY is_default DESC, created_at ASC"#,
        )
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            r#"SELECT id, label, color, bg_color, border_color, description, is_default, created_at, updated_at
               FROM categories
               WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        data: &CreateCategory,
        category_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let now = Utc::now();
        let description = data.description.clone().filter(|d| !d.is_empty());
        sqlx::query_as::<_, Category>(
            r#"INSERT INTO categories (id, label, color, bg_color, border_color, description, is_default, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
               RETURNING id, label, color, bg_color, border_color, description, is_default, created_at, updated_at"#,
        )
        .bind(category_id)
        .bind(&data.label)
        .bind(&data.color)
        .bind(&data.bg_color)
        .bind(&data.border_color)
        .bind(description)
        .bind(data.is_default.unwrap_or(false))
        .bind(now)
        .fetch_one(pool)
        .await
    }

    /// Applies the provided fields; returns `None` when the id is unknown.
    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        data: &UpdateCategory,
    ) -> Result<Option<Self>, sqlx::Error> {
        let Some(existing) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };

        let label = data.label.clone().unwrap_or(existing.label);
        let color = data.color.clone().unwrap_or(existing.color);
        let bg_color = data.bg_color.clone().unwrap_or(existing.bg_color);
        let border_color = data.border_color.clone().unwrap_or(existing.border_color);
        let description = match &data.description {
            Some(d) if d.is_empty() => None,
            Some(d) => Some(d.clone()),
            None => existing.description,
        };
        let is_default = data.is_default.unwrap_or(existing.is_default);

        sqlx::query_as::<_, Category>(
            r#"UPDATE categories
               SET label = $2, color = $3, bg_color = $4, border_color = $5,
                   description = $6, is_default = $7, updated_at = $8
               WHERE id = $1
               RETURNING id, label, color, bg_color, border_color, description, is_default, created_at, updated_at"#,
        )
        .bind(id)
        .bind(label)
        .bind(color)
        .bind(bg_color)
        .bind(border_color)
        .bind(description)
        .bind(is_default)
        .bind(Utc::now())
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Inserts the default categories that are missing. Existing rows, by id
    /// or by label, are left untouched. Returns the number of rows inserted.
    pub async fn insert_defaults(pool: &SqlitePool) -> Result<u64, sqlx::Error> {
        let mut inserted = 0;
        for category in DEFAULT_CATEGORIES.iter() {
            let now = Utc::now();
            let result = sqlx::query(
                r#"INSERT OR IGNORE INTO categories (id, label, color, bg_color, border_color, description, is_default, created_at, updated_at)
                   VALUES ($1, $2, $3, $4, $5, NULL, 1, $6, $6)"#,
            )
            .bind(category.id)
            .bind(category.label)
            .bind(category.color)
            .bind(category.bg_color)
            .bind(category.border_color)
            .bind(now)
            .execute(pool)
            .await?;
            inserted += result.rows_affected();
        }
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DBService;

    fn custom(label: &str) -> CreateCategory {
        CreateCategory {
            label: label.to_string(),
            color: "text-teal-700".to_string(),
            bg_color: "bg-teal-100".to_string(),
            border_color: "border-teal-200".to_string(),
            description: Some("custom".to_string()),
            is_default: None,
        }
    }

    #[tokio::test]
    async fn insert_defaults_is_idempotent() {
        let db = DBService::new_in_memory().await.unwrap();

        assert_eq!(Category::insert_defaults(&db.pool).await.unwrap(), 5);
        assert_eq!(Category::insert_defaults(&db.pool).await.unwrap(), 0);

        let all = Category::find_all(&db.pool).await.unwrap();
        assert_eq!(all.len(), 5);
        assert!(all.iter().all(|c| c.is_default));
    }

    #[test]
    fn seeded_ids_are_recognised() {
        assert!(DEFAULT_CATEGORIES.iter().all(|c| Category::is_seeded(c.id)));
        assert!(!Category::is_seeded(Uuid::new_v4()));
    }

    #[tokio::test]
    async fn defaults_sort_before_custom_categories() {
        let db = DBService::new_in_memory().await.unwrap();
        Category::create(&db.pool, &custom("아이데이션"), Uuid::new_v4())
            .await
            .unwrap();
        Category::insert_defaults(&db.pool).await.unwrap();

        let all = Category::find_all(&db.pool).await.unwrap();
        assert_eq!(all.len(), 6);
        assert_eq!(all.last().unwrap().label, "아이데이션");
        assert!(!all.last().unwrap().is_default);
    }

    #[tokio::test]
    async fn update_keeps_unset_fields() {
        let db = DBService::new_in_memory().await.unwrap();
        let created = Category::create(&db.pool, &custom("요약"), Uuid::new_v4())
            .await
            .unwrap();

        let updated = Category::update(
            &db.pool,
            created.id,
            &UpdateCategory {
                label: Some("요약하기".to_string()),
                description: Some(String::new()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(updated.label, "요약하기");
        assert_eq!(updated.color, "text-teal-700");
        assert_eq!(updated.description, None);

        let missing = Category::update(&db.pool, Uuid::new_v4(), &UpdateCategory::default())
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn duplicate_label_is_a_unique_violation() {
        let db = DBService::new_in_memory().await.unwrap();
        Category::create(&db.pool, &custom("요약"), Uuid::new_v4())
            .await
            .unwrap();

        let err = Category::create(&db.pool, &custom("요약"), Uuid::new_v4())
            .await
            .unwrap_err();
        match err {
            sqlx::Error::Database(db_err) => assert!(db_err.is_unique_violation()),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
