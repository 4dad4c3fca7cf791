/**
 * Sectioned Page Routes
 * About and Design pages: a jumbotron image plus a list of sections with
 * paragraphs and images. Handlers are generic over the section type.
 */
use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::auth::AdminUser;
use crate::db::models::{ImageRef, PageSection, SectionedContent};
use crate::error::{ApiError, ApiResult};
use crate::routes::{ApiJson, ApiMultipart, DeleteImageRequest, MessageResponse};
use crate::state::AppState;
use crate::store;

/// Request body for PUT /api/{page}content
#[derive(Debug, Deserialize)]
#[serde(bound = "S: PageSection")]
pub struct UpdateSectionsRequest<S> {
    pub sections: Option<Vec<S>>,
}

/// Request body for PUT /api/{page}content/section/{index}
#[derive(Debug, Deserialize)]
#[serde(bound = "S: PageSection")]
pub struct UpdateSectionRequest<S> {
    pub section: Option<S>,
}

#[derive(Debug, Serialize)]
pub struct ImageResponse {
    pub image: ImageRef,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JumbotronResponse {
    pub jumbotron_image: Option<ImageRef>,
}

/// GET /api/{page}content
/// `null` until the page has been saved once
pub async fn get_content<S: PageSection>(
    State(state): State<AppState>,
) -> ApiResult<Json<Option<SectionedContent<S>>>> {
    let content = store::load::<SectionedContent<S>>(state.store.as_ref()).await?;
    Ok(Json(content))
}

/// PUT /api/{page}content (admin) - replace the section list
pub async fn update_content<S: PageSection>(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiJson(payload): ApiJson<UpdateSectionsRequest<S>>,
) -> ApiResult<Json<SectionedContent<S>>> {
    let _guard = state.edit_lock.lock().await;

    let mut content = store::load::<SectionedContent<S>>(state.store.as_ref())
        .await?
        .unwrap_or_default();
    if let Some(sections) = payload.sections {
        content.sections = sections;
    }
    store::save(state.store.as_ref(), &content).await?;

    tracing::info!(
        admin = %admin.email,
        page = %S::PAGE,
        sections = content.sections.len(),
        "page sections replaced"
    );
    Ok(Json(content))
}

/// PUT /api/{page}content/section/{index} (admin)
/// Out-of-range, negative and non-numeric indexes are all "not found".
pub async fn update_section<S: PageSection>(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(index): Path<String>,
    ApiJson(payload): ApiJson<UpdateSectionRequest<S>>,
) -> ApiResult<Json<MessageResponse>> {
    let section = payload
        .section
        .ok_or_else(|| ApiError::BadRequest("Section is required".to_string()))?;
    let not_found = || ApiError::NotFound("Section not found".to_string());
    let index: usize = index.trim().parse().map_err(|_| not_found())?;

    let _guard = state.edit_lock.lock().await;

    let mut content = store::load::<SectionedContent<S>>(state.store.as_ref())
        .await?
        .ok_or_else(not_found)?;
    let slot = content.sections.get_mut(index).ok_or_else(not_found)?;
    *slot = section;
    store::save(state.store.as_ref(), &content).await?;

    tracing::info!(admin = %admin.email, page = %S::PAGE, index, "page section updated");
    Ok(Json(MessageResponse::new("Section updated successfully")))
}

/// PUT /api/{page}content/image (admin), multipart field `image`
/// Stores the file only; the client attaches it to a section.
pub async fn upload_section_image<S: PageSection>(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    ApiMultipart(mut multipart): ApiMultipart,
) -> ApiResult<Json<ImageResponse>> {
    let image = state.uploads.save_field(&mut multipart, "image").await?;
    tracing::debug!(page = %S::PAGE, file = %image.name, "section image uploaded");
    Ok(Json(ImageResponse { image }))
}

/// DELETE /api/{page}content/image (admin)
pub async fn delete_section_image<S: PageSection>(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    ApiJson(payload): ApiJson<DeleteImageRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let name = payload
        .image_name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Image name is required".to_string()))?;

    state.uploads.remove(&name).await?;
    tracing::debug!(page = %S::PAGE, file = %name, "section image deleted");
    Ok(Json(MessageResponse::new("Image deleted successfully")))
}

/// PUT /api/{page}content/jumbotron (admin), multipart field `jumbotronImage`
///
/// The new file is written before the document is saved and the previous
/// file is removed only once the save succeeded.
pub async fn upload_jumbotron<S: PageSection>(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiMultipart(mut multipart): ApiMultipart,
) -> ApiResult<Json<JumbotronResponse>> {
    let image = state
        .uploads
        .save_field(&mut multipart, "jumbotronImage")
        .await?;

    let _guard = state.edit_lock.lock().await;

    let saved = async {
        let mut content = store::load::<SectionedContent<S>>(state.store.as_ref())
            .await?
            .unwrap_or_default();
        let previous = content.jumbotron_image.replace(image.clone());
        store::save(state.store.as_ref(), &content).await?;
        Ok::<_, ApiError>(previous)
    }
    .await;

    let previous = match saved {
        Ok(previous) => previous,
        Err(e) => {
            if let Err(cleanup) = state.uploads.remove_if_present(&image.name).await {
                tracing::warn!(file = %image.name, error = %cleanup, "failed to remove unsaved upload");
            }
            return Err(e);
        }
    };

    if let Some(old) = previous.filter(|old| !old.name.is_empty() && old.name != image.name) {
        if let Err(e) = state.uploads.remove_if_present(&old.name).await {
            tracing::warn!(file = %old.name, error = %e, "failed to remove replaced jumbotron image");
        }
    }

    tracing::info!(admin = %admin.email, page = %S::PAGE, file = %image.name, "jumbotron image replaced");
    Ok(Json(JumbotronResponse {
        jumbotron_image: Some(image),
    }))
}

/// DELETE /api/{page}content/jumbotron (admin)
pub async fn delete_jumbotron<S: PageSection>(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> ApiResult<Json<MessageResponse>> {
    let _guard = state.edit_lock.lock().await;

    let mut content = store::load::<SectionedContent<S>>(state.store.as_ref())
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("{} not found", S::PAGE_LABEL)))?;
    let image = content
        .jumbotron_image
        .take()
        .ok_or_else(|| ApiError::NotFound("Jumbotron image not found".to_string()))?;
    store::save(state.store.as_ref(), &content).await?;

    if !image.name.is_empty() {
        if let Err(e) = state.uploads.remove_if_present(&image.name).await {
            tracing::warn!(file = %image.name, error = %e, "failed to remove jumbotron image");
        }
    }

    tracing::info!(admin = %admin.email, page = %S::PAGE, "jumbotron image deleted");
    Ok(Json(MessageResponse::new(
        "Jumbotron image deleted successfully",
    )))
}
