//! Document store: singleton content documents, website entries and users.
//!
//! Two backends implement [`ContentStore`]: [`PgStore`] over PostgreSQL and
//! [`MemoryStore`] for running without a database (and for tests).

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::db::models::{DocumentKey, SingletonDocument, User, Website, WebsitePageQuery};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Conflict: {0}")]
    Conflict(String),
}

#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Short backend name reported by health checks.
    fn backend_tag(&self) -> &'static str;

    /// Round-trip to the backend, returning its latency.
    async fn ping(&self) -> Result<Duration, StoreError>;

    async fn load_document(&self, key: DocumentKey) -> Result<Option<Value>, StoreError>;

    /// Insert or replace the document stored under `key`.
    async fn save_document(&self, key: DocumentKey, content: &Value) -> Result<(), StoreError>;

    /// All entries, newest first.
    async fn list_websites(&self) -> Result<Vec<Website>, StoreError>;

    /// One page of entries (newest first) and the total number of matches.
    async fn page_websites(
        &self,
        query: &WebsitePageQuery,
    ) -> Result<(Vec<Website>, i64), StoreError>;

    async fn find_website(&self, id: Uuid) -> Result<Option<Website>, StoreError>;

    async fn find_website_by_slug(&self, slug: &str) -> Result<Option<Website>, StoreError>;

    async fn insert_website(&self, website: &Website) -> Result<(), StoreError>;

    /// Returns false when no entry has the website's id.
    async fn update_website(&self, website: &Website) -> Result<bool, StoreError>;

    /// Returns false when no entry has `id`.
    async fn delete_website(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_user_by_reset_token(&self, token_hash: &str)
        -> Result<Option<User>, StoreError>;

    /// Fails with [`StoreError::Conflict`] when the email is taken.
    async fn insert_user(&self, user: &User) -> Result<(), StoreError>;

    async fn set_reset_token(&self, user_id: Uuid, token_hash: Option<&str>)
        -> Result<(), StoreError>;

    /// Replace the password hash and clear any pending reset token.
    async fn update_password(&self, user_id: Uuid, password_hash: &str) -> Result<(), StoreError>;
}

/// Load a typed singleton document.
pub async fn load<T: SingletonDocument>(store: &dyn ContentStore) -> Result<Option<T>, StoreError> {
    match store.load_document(T::KEY).await? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

/// Upsert a typed singleton document.
pub async fn save<T: SingletonDocument>(store: &dyn ContentStore, doc: &T) -> Result<(), StoreError> {
    let value = serde_json::to_value(doc)?;
    store.save_document(T::KEY, &value).await
}

/// Escape LIKE metacharacters so the keyword matches literally.
pub(crate) fn like_pattern(keyword: &str) -> String {
    let mut escaped = String::with_capacity(keyword.len() + 2);
    escaped.push('%');
    for c in keyword.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}
