use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ContentStore, StoreError};
use crate::db::models::{normalize_email, DocumentKey, User, Website, WebsitePageQuery};

/// In-process store used when no database is configured.
/// Contents are lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<DocumentKey, Value>>,
    websites: RwLock<Vec<Website>>,
    users: RwLock<Vec<User>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Newest first, ties broken by descending id (same order as the SQL backend).
fn newest_first(websites: &[Website]) -> Vec<Website> {
    let mut sorted = websites.to_vec();
    sorted.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
    sorted
}

#[async_trait]
impl ContentStore for MemoryStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<Duration, StoreError> {
        let start = Instant::now();
        let _ = self.documents.read().await;
        Ok(start.elapsed())
    }

    async fn load_document(&self, key: DocumentKey) -> Result<Option<Value>, StoreError> {
        Ok(self.documents.read().await.get(&key).cloned())
    }

    async fn save_document(&self, key: DocumentKey, content: &Value) -> Result<(), StoreError> {
        self.documents.write().await.insert(key, content.clone());
        Ok(())
    }

    async fn list_websites(&self) -> Result<Vec<Website>, StoreError> {
        Ok(newest_first(&self.websites.read().await))
    }

    async fn page_websites(
        &self,
        query: &WebsitePageQuery,
    ) -> Result<(Vec<Website>, i64), StoreError> {
        let needle = query.keyword.as_ref().map(|k| k.to_lowercase());
        let matching: Vec<Website> = newest_first(&self.websites.read().await)
            .into_iter()
            .filter(|w| needle.as_deref().map_or(true, |n| w.matches_keyword(n)))
            .collect();

        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(query.offset.max(0) as usize)
            .take(query.limit.max(0) as usize)
            .collect();
        Ok((page, total))
    }

    async fn find_website(&self, id: Uuid) -> Result<Option<Website>, StoreError> {
        Ok(self.websites.read().await.iter().find(|w| w.id == id).cloned())
    }

    async fn find_website_by_slug(&self, slug: &str) -> Result<Option<Website>, StoreError> {
        Ok(self
            .websites
            .read()
            .await
            .iter()
            .find(|w| w.slug == slug)
            .cloned())
    }

    async fn insert_website(&self, website: &Website) -> Result<(), StoreError> {
        self.websites.write().await.push(website.clone());
        Ok(())
    }

    async fn update_website(&self, website: &Website) -> Result<bool, StoreError> {
        let mut websites = self.websites.write().await;
        match websites.iter_mut().find(|w| w.id == website.id) {
            Some(existing) => {
                *existing = website.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_website(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut websites = self.websites.write().await;
        let before = websites.len();
        websites.retain(|w| w.id != id);
        Ok(websites.len() != before)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let email = normalize_email(email);
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_user_by_reset_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.reset_token.as_deref() == Some(token_hash))
            .cloned())
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(format!(
                "email {} already registered",
                user.email
            )));
        }
        users.push(user.clone());
        Ok(())
    }

    async fn set_reset_token(
        &self,
        user_id: Uuid,
        token_hash: Option<&str>,
    ) -> Result<(), StoreError> {
        if let Some(user) = self.users.write().await.iter_mut().find(|u| u.id == user_id) {
            user.reset_token = token_hash.map(str::to_string);
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn update_password(&self, user_id: Uuid, password_hash: &str) -> Result<(), StoreError> {
        if let Some(user) = self.users.write().await.iter_mut().find(|u| u.id == user_id) {
            user.password_hash = password_hash.to_string();
            user.reset_token = None;
            user.updated_at = Utc::now();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn website_at(name: &str, minutes_ago: i64) -> Website {
        let mut website = Website::placeholder(Utc::now() - ChronoDuration::minutes(minutes_ago));
        website.name = name.to_string();
        website.slug = name.to_lowercase();
        website
    }

    #[tokio::test]
    async fn test_list_websites_newest_first() {
        let store = MemoryStore::new();
        store.insert_website(&website_at("Old", 10)).await.unwrap();
        store.insert_website(&website_at("New", 1)).await.unwrap();

        let names: Vec<String> = store
            .list_websites()
            .await
            .unwrap()
            .into_iter()
            .map(|w| w.name)
            .collect();
        assert_eq!(names, vec!["New", "Old"]);
    }

    #[tokio::test]
    async fn test_equal_timestamps_page_by_descending_id() {
        let store = MemoryStore::new();
        let created = Utc::now();
        let mut ids = Vec::new();
        for name in ["A", "B", "C"] {
            let mut website = Website::placeholder(created);
            website.name = name.to_string();
            ids.push(website.id);
            store.insert_website(&website).await.unwrap();
        }
        ids.sort_by(|a, b| b.cmp(a));

        let mut paged = Vec::new();
        for offset in 0..3 {
            let (page, total) = store
                .page_websites(&WebsitePageQuery {
                    keyword: None,
                    offset,
                    limit: 1,
                })
                .await
                .unwrap();
            assert_eq!(total, 3);
            paged.extend(page.into_iter().map(|w| w.id));
        }
        assert_eq!(paged, ids);
    }

    #[tokio::test]
    async fn test_page_websites_filters_and_counts() {
        let store = MemoryStore::new();
        for (i, name) in ["React Shop", "Vue Blog", "react native app"].iter().enumerate() {
            store.insert_website(&website_at(name, i as i64)).await.unwrap();
        }

        let (page, total) = store
            .page_websites(&WebsitePageQuery {
                keyword: Some("REACT".to_string()),
                offset: 0,
                limit: 1,
            })
            .await
            .unwrap();
        assert_eq!(total, 2);
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].name, "React Shop");
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_website_report_false() {
        let store = MemoryStore::new();
        let website = website_at("Ghost", 0);
        assert!(!store.update_website(&website).await.unwrap());
        assert!(!store.delete_website(website.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_insert_user_rejects_duplicate_email() {
        let store = MemoryStore::new();
        store
            .insert_user(&User::new("Ann", "ann@example.com", "h".to_string(), false))
            .await
            .unwrap();
        let err = store
            .insert_user(&User::new("Ann", "ANN@example.com", "h".to_string(), false))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_password_clears_reset_token() {
        let store = MemoryStore::new();
        let user = User::new("Ann", "ann@example.com", "old".to_string(), false);
        store.insert_user(&user).await.unwrap();
        store.set_reset_token(user.id, Some("digest")).await.unwrap();
        assert!(store.find_user_by_reset_token("digest").await.unwrap().is_some());

        store.update_password(user.id, "new").await.unwrap();
        let reloaded = store.find_user_by_email("ann@example.com").await.unwrap().unwrap();
        assert_eq!(reloaded.password_hash, "new");
        assert!(reloaded.reset_token.is_none());
    }
}
