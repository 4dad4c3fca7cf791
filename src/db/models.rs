//! Database Models - content documents, website entries and users.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Fixed keys of the singleton content documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKey {
    Home,
    About,
    Design,
    Portfolio,
}

impl DocumentKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKey::Home => "home",
            DocumentKey::About => "about",
            DocumentKey::Design => "design",
            DocumentKey::Portfolio => "portfolio",
        }
    }
}

impl std::fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A content type stored as exactly one document under a fixed key.
pub trait SingletonDocument: Serialize + DeserializeOwned + Default + Send + Sync {
    const KEY: DocumentKey;
}

/// Reference to a file in the upload store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub url: String,
    #[serde(default)]
    pub name: String,
}

// ============================================================================
// Home
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeSection {
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeContent {
    #[serde(default)]
    pub jumbotron_text: Vec<String>,
    #[serde(default)]
    pub sections: Vec<HomeSection>,
}

impl SingletonDocument for HomeContent {
    const KEY: DocumentKey = DocumentKey::Home;
}

// ============================================================================
// About / Design
// ============================================================================

/// A section type of a page that carries a jumbotron image and a section list.
pub trait PageSection: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const PAGE: DocumentKey;
    /// Human label used in not-found messages, e.g. "About content".
    const PAGE_LABEL: &'static str;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AboutSection {
    pub title: String,
    #[serde(default)]
    pub paragraphs: Vec<String>,
    #[serde(default)]
    pub images: Vec<ImageRef>,
}

impl PageSection for AboutSection {
    const PAGE: DocumentKey = DocumentKey::About;
    const PAGE_LABEL: &'static str = "About content";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignSection {
    pub title: String,
    #[serde(default)]
    pub paragraphs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_text: Option<String>,
    #[serde(default)]
    pub images: Vec<ImageRef>,
}

impl PageSection for DesignSection {
    const PAGE: DocumentKey = DocumentKey::Design;
    const PAGE_LABEL: &'static str = "Design content";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionedContent<S> {
    #[serde(default)]
    pub jumbotron_image: Option<ImageRef>,
    #[serde(default = "Vec::new")]
    pub sections: Vec<S>,
}

impl<S> Default for SectionedContent<S> {
    fn default() -> Self {
        Self {
            jumbotron_image: None,
            sections: Vec::new(),
        }
    }
}

impl<S: PageSection> SingletonDocument for SectionedContent<S> {
    const KEY: DocumentKey = S::PAGE;
}

pub type AboutContent = SectionedContent<AboutSection>;
pub type DesignContent = SectionedContent<DesignSection>;

// ============================================================================
// Portfolio
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioContent {
    #[serde(default)]
    pub paragraphs: Vec<String>,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub link_text: String,
}

impl SingletonDocument for PortfolioContent {
    const KEY: DocumentKey = DocumentKey::Portfolio;
}

// ============================================================================
// Websites
// ============================================================================

/// Portfolio entry shown on the portfolio page
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Website {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub image: String,
    pub language: String,
    pub language_description: String,
    pub description: String,
    pub link: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Website {
    /// New entry with placeholder values, to be edited afterwards.
    pub fn placeholder(now: DateTime<Utc>) -> Self {
        let stamp = now.timestamp_millis().to_string();
        Self {
            id: Uuid::new_v4(),
            name: stamp.clone(),
            slug: stamp,
            image: "/images/".to_string(),
            language: "MERN Stack".to_string(),
            language_description: "MongoDB, Express, React, Node.js".to_string(),
            description: "description".to_string(),
            link: "https://www.domain.com".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Case-insensitive substring match over name, description and language.
    /// `needle` must already be lower-cased.
    pub fn matches_keyword(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
            || self.language.to_lowercase().contains(needle)
    }
}

/// Page request over the website collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebsitePageQuery {
    pub keyword: Option<String>,
    pub offset: i64,
    pub limit: i64,
}

// ============================================================================
// Users
// ============================================================================

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub is_admin: bool,
    #[serde(skip_serializing, default)]
    pub reset_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: &str, email: &str, password_hash: String, is_admin: bool) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            email: normalize_email(email),
            password_hash,
            is_admin,
            reset_token: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Emails are stored trimmed and lower-cased so uniqueness is case-insensitive.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
