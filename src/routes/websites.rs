/**
 * Website Routes
 * CRUD and paginated keyword search over portfolio website entries
 */
use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AdminUser;
use crate::db::models::{Website, WebsitePageQuery};
use crate::error::{ApiError, ApiResult};
use crate::routes::{ApiJson, MessageResponse};
use crate::state::AppState;

const DEFAULT_PAGE: i64 = 1;
const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Paging parameters. Kept as raw strings so junk falls back to defaults
/// instead of failing the request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageParams {
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub q: Option<String>,
}

impl PageParams {
    fn page(&self) -> i64 {
        parse_positive(self.page.as_deref()).unwrap_or(DEFAULT_PAGE)
    }

    fn page_size(&self) -> i64 {
        parse_positive(self.page_size.as_deref())
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .min(MAX_PAGE_SIZE)
    }

    fn keyword(&self) -> Option<String> {
        self.q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_string)
    }

    fn to_query(&self, keyword: Option<String>) -> WebsitePageQuery {
        let page = self.page();
        let limit = self.page_size();
        WebsitePageQuery {
            keyword,
            offset: (page - 1).saturating_mul(limit),
            limit,
        }
    }
}

fn parse_positive(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|n| *n >= 1)
}

/// Number of pages for `count` matches, never less than one.
pub fn page_count(count: i64, page_size: i64) -> i64 {
    if page_size <= 0 {
        return 1;
    }
    ((count + page_size - 1) / page_size).max(1)
}

/// Response for GET /api/websites/admin
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminPageResponse {
    pub websites: Vec<Website>,
    pub total_websites: i64,
    pub page: i64,
    pub pages: i64,
}

/// Response for GET /api/websites/search
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub websites: Vec<Website>,
    pub page: i64,
    pub pages: i64,
    pub count_websites: i64,
}

/// Request body for PUT /api/websites/{id}
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWebsiteRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub image: Option<String>,
    pub language: Option<String>,
    pub language_description: Option<String>,
    pub description: Option<String>,
    pub link: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WebsiteMutationResponse {
    pub message: String,
    pub website: Website,
}

fn not_found() -> ApiError {
    ApiError::NotFound("Website Not Found".to_string())
}

/// Ids that are not UUIDs can never match an entry.
fn parse_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| not_found())
}

fn required(value: Option<String>, field: &str) -> ApiResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("{} is required", field)))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/websites
pub async fn list_websites(State(state): State<AppState>) -> ApiResult<Json<Vec<Website>>> {
    let websites = state.store.list_websites().await?;
    Ok(Json(websites))
}

/// GET /api/websites/admin (admin)
pub async fn admin_websites(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<AdminPageResponse>> {
    let query = params.to_query(None);
    let (websites, total) = state.store.page_websites(&query).await?;

    Ok(Json(AdminPageResponse {
        websites,
        total_websites: total,
        page: params.page(),
        pages: page_count(total, query.limit),
    }))
}

/// GET /api/websites/search
pub async fn search_websites(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<SearchResponse>> {
    let query = params.to_query(params.keyword());
    let (websites, count) = state.store.page_websites(&query).await?;

    tracing::debug!(
        keyword = ?query.keyword,
        page = params.page(),
        count,
        "website search"
    );

    Ok(Json(SearchResponse {
        websites,
        page: params.page(),
        pages: page_count(count, query.limit),
        count_websites: count,
    }))
}

/// GET /api/websites/slug/{slug}
pub async fn get_website_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<Website>> {
    state
        .store
        .find_website_by_slug(&slug)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

/// GET /api/websites/{id}
pub async fn get_website(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Website>> {
    let id = parse_id(&id)?;
    state
        .store
        .find_website(id)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

/// POST /api/websites (admin) - new entry with placeholder values
pub async fn create_website(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> ApiResult<Json<WebsiteMutationResponse>> {
    let website = Website::placeholder(Utc::now());
    state.store.insert_website(&website).await?;

    tracing::info!(admin = %admin.email, id = %website.id, "website created");
    Ok(Json(WebsiteMutationResponse {
        message: "Website Created".to_string(),
        website,
    }))
}

/// PUT /api/websites/{id} (admin) - full replacement of the editable fields
pub async fn update_website(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UpdateWebsiteRequest>,
) -> ApiResult<Json<WebsiteMutationResponse>> {
    let id = parse_id(&id)?;
    let name = required(payload.name, "Name")?;
    let slug = required(payload.slug, "Slug")?;

    let mut website = state.store.find_website(id).await?.ok_or_else(not_found)?;
    website.name = name;
    website.slug = slug;
    website.image = payload.image.unwrap_or_default();
    website.language = payload.language.unwrap_or_default();
    website.language_description = payload.language_description.unwrap_or_default();
    website.description = payload.description.unwrap_or_default();
    website.link = payload.link.unwrap_or_default();
    website.updated_at = Utc::now();

    if !state.store.update_website(&website).await? {
        return Err(not_found());
    }

    tracing::info!(admin = %admin.email, id = %website.id, slug = %website.slug, "website updated");
    Ok(Json(WebsiteMutationResponse {
        message: "Website Updated".to_string(),
        website,
    }))
}

/// DELETE /api/websites/{id} (admin)
pub async fn delete_website(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let id = parse_id(&id)?;
    if !state.store.delete_website(id).await? {
        return Err(not_found());
    }

    tracing::info!(admin = %admin.email, %id, "website deleted");
    Ok(Json(MessageResponse::new("Website Deleted")))
}
