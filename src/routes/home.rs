/**
 * Home Content Routes
 * Jumbotron text and call-to-action sections of the landing page
 */
use axum::{extract::State, Json};
use serde::Deserialize;

use crate::auth::AdminUser;
use crate::db::models::{HomeContent, HomeSection};
use crate::error::ApiResult;
use crate::routes::ApiJson;
use crate::state::AppState;
use crate::store;

/// Request body for PUT /api/homecontent
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateHomeRequest {
    pub jumbotron_text: Option<Vec<String>>,
    pub sections: Option<Vec<HomeSection>>,
}

/// GET /api/homecontent
/// Empty lists until the first PUT creates the document
pub async fn get_home_content(State(state): State<AppState>) -> ApiResult<Json<HomeContent>> {
    let content = store::load::<HomeContent>(state.store.as_ref())
        .await?
        .unwrap_or_default();
    Ok(Json(content))
}

/// PUT /api/homecontent (admin)
pub async fn update_home_content(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiJson(payload): ApiJson<UpdateHomeRequest>,
) -> ApiResult<Json<HomeContent>> {
    let _guard = state.edit_lock.lock().await;

    let mut content = store::load::<HomeContent>(state.store.as_ref())
        .await?
        .unwrap_or_default();
    if let Some(jumbotron_text) = payload.jumbotron_text {
        content.jumbotron_text = jumbotron_text;
    }
    if let Some(sections) = payload.sections {
        content.sections = sections;
    }
    store::save(state.store.as_ref(), &content).await?;

    tracing::info!(admin = %admin.email, sections = content.sections.len(), "home content updated");
    Ok(Json(content))
}
