/**
 * Portfolio Content Routes
 * Intro paragraphs and call-to-action link of the portfolio page
 */
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::auth::AdminUser;
use crate::db::models::PortfolioContent;
use crate::error::ApiResult;
use crate::routes::ApiJson;
use crate::state::AppState;
use crate::store;

/// Request body for PUT /api/portfoliocontent
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePortfolioRequest {
    pub paragraphs: Option<Vec<String>>,
    pub link: Option<String>,
    pub link_text: Option<String>,
}

/// Response for PUT /api/portfoliocontent
#[derive(Debug, Serialize)]
pub struct UpdatePortfolioResponse {
    pub message: String,
    pub content: PortfolioContent,
}

/// GET /api/portfoliocontent
pub async fn get_portfolio_content(
    State(state): State<AppState>,
) -> ApiResult<Json<PortfolioContent>> {
    let content = store::load::<PortfolioContent>(state.store.as_ref())
        .await?
        .unwrap_or_default();
    Ok(Json(content))
}

/// PUT /api/portfoliocontent (admin)
pub async fn update_portfolio_content(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiJson(payload): ApiJson<UpdatePortfolioRequest>,
) -> ApiResult<Json<UpdatePortfolioResponse>> {
    let _guard = state.edit_lock.lock().await;

    let mut content = store::load::<PortfolioContent>(state.store.as_ref())
        .await?
        .unwrap_or_default();
    if let Some(paragraphs) = payload.paragraphs {
        content.paragraphs = paragraphs;
    }
    if let Some(link) = payload.link {
        content.link = link;
    }
    if let Some(link_text) = payload.link_text {
        content.link_text = link_text;
    }
    store::save(state.store.as_ref(), &content).await?;

    tracing::info!(admin = %admin.email, "portfolio content updated");
    Ok(Json(UpdatePortfolioResponse {
        message: "Portfolio content updated successfully".to_string(),
        content,
    }))
}
