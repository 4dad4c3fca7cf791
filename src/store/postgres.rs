use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use std::time::{Duration, Instant};
use uuid::Uuid;

use super::{like_pattern, ContentStore, StoreError};
use crate::db::models::{normalize_email, DocumentKey, User, Website, WebsitePageQuery};

const WEBSITE_COLUMNS: &str = "id, name, slug, image, language, language_description, \
                               description, link, created_at, updated_at";

const USER_COLUMNS: &str =
    "id, name, email, password_hash, is_admin, reset_token, created_at, updated_at";

/// PostgreSQL-backed store
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}

#[async_trait]
impl ContentStore for PgStore {
    fn backend_tag(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> Result<Duration, StoreError> {
        let start = Instant::now();
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(start.elapsed())
    }

    async fn load_document(&self, key: DocumentKey) -> Result<Option<Value>, StoreError> {
        let row: Option<(Value,)> =
            sqlx::query_as("SELECT content FROM site_documents WHERE key = $1")
                .bind(key.as_str())
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(content,)| content))
    }

    async fn save_document(&self, key: DocumentKey, content: &Value) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO site_documents (key, content, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (key) DO UPDATE SET
                content = EXCLUDED.content,
                updated_at = now()
            "#,
        )
        .bind(key.as_str())
        .bind(content)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_websites(&self) -> Result<Vec<Website>, StoreError> {
        let websites = sqlx::query_as::<_, Website>(&format!(
            "SELECT {WEBSITE_COLUMNS} FROM websites ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(websites)
    }

    async fn page_websites(
        &self,
        query: &WebsitePageQuery,
    ) -> Result<(Vec<Website>, i64), StoreError> {
        // NULL pattern disables the filter
        let pattern = query.keyword.as_deref().map(like_pattern);

        let websites = sqlx::query_as::<_, Website>(&format!(
            r#"
            SELECT {WEBSITE_COLUMNS}
            FROM websites
            WHERE $1::TEXT IS NULL
               OR name ILIKE $1 ESCAPE '\'
               OR description ILIKE $1 ESCAPE '\'
               OR language ILIKE $1 ESCAPE '\'
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(&pattern)
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(&self.pool)
        .await?;

        let total: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM websites
            WHERE $1::TEXT IS NULL
               OR name ILIKE $1 ESCAPE '\'
               OR description ILIKE $1 ESCAPE '\'
               OR language ILIKE $1 ESCAPE '\'
            "#,
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        Ok((websites, total.0))
    }

    async fn find_website(&self, id: Uuid) -> Result<Option<Website>, StoreError> {
        let website = sqlx::query_as::<_, Website>(&format!(
            "SELECT {WEBSITE_COLUMNS} FROM websites WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(website)
    }

    async fn find_website_by_slug(&self, slug: &str) -> Result<Option<Website>, StoreError> {
        // Slugs are not unique; the oldest entry wins.
        let website = sqlx::query_as::<_, Website>(&format!(
            "SELECT {WEBSITE_COLUMNS} FROM websites WHERE slug = $1 ORDER BY created_at LIMIT 1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;
        Ok(website)
    }

    async fn insert_website(&self, website: &Website) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO websites (id, name, slug, image, language, language_description,
                                  description, link, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(website.id)
        .bind(&website.name)
        .bind(&website.slug)
        .bind(&website.image)
        .bind(&website.language)
        .bind(&website.language_description)
        .bind(&website.description)
        .bind(&website.link)
        .bind(website.created_at)
        .bind(website.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_website(&self, website: &Website) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE websites
            SET name = $2, slug = $3, image = $4, language = $5, language_description = $6,
                description = $7, link = $8, updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(website.id)
        .bind(&website.name)
        .bind(&website.slug)
        .bind(&website.image)
        .bind(&website.language)
        .bind(&website.language_description)
        .bind(&website.description)
        .bind(&website.link)
        .bind(website.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_website(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM websites WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(normalize_email(email))
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_reset_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE reset_token = $1"
        ))
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, is_admin, reset_token,
                               created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_admin)
        .bind(&user.reset_token)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(StoreError::Conflict(format!(
                "email {} already registered",
                user.email
            ))),
            Err(e) => Err(e.into()),
        }
    }

    async fn set_reset_token(
        &self,
        user_id: Uuid,
        token_hash: Option<&str>,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET reset_token = $2, updated_at = now() WHERE id = $1")
            .bind(user_id)
            .bind(token_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_password(&self, user_id: Uuid, password_hash: &str) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE users SET password_hash = $2, reset_token = NULL, updated_at = now() \
             WHERE id = $1",
        )
        .bind(user_id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
