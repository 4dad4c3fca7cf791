use axum::{
    extract::State,
    Json,
};
use serde::Serialize;

use crate::auth::AdminUser;
use crate::db::models::ImageRef;
use crate::error::{ApiError, ApiResult};
use crate::routes::{ApiJson, ApiMultipart, DeleteImageRequest, MessageResponse};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub image: ImageRef,
}

/// POST /api/upload/single (admin), multipart field `image`
pub async fn upload_image(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiMultipart(mut multipart): ApiMultipart,
) -> ApiResult<Json<UploadResponse>> {
    let image = state.uploads.save_field(&mut multipart, "image").await?;

    tracing::info!(admin = %admin.email, file = %image.name, "image uploaded");
    Ok(Json(UploadResponse {
        message: "Image uploaded successfully".to_string(),
        image,
    }))
}

/// DELETE /api/upload/image (admin), JSON `{imageName}`
pub async fn delete_image(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiJson(payload): ApiJson<DeleteImageRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let name = payload
        .image_name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Image name not provided".to_string()))?;

    state.uploads.remove(&name).await?;

    tracing::info!(admin = %admin.email, file = %name, "image deleted");
    Ok(Json(MessageResponse::new("Image deleted successfully")))
}
