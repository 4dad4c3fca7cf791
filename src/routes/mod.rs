/**
 * Routes Module
 * API route handlers
 */
pub mod health;
pub mod home;
pub mod pages;
pub mod portfolio;
pub mod upload;
pub mod users;
pub mod websites;

use axum::extract::{FromRequest, Multipart, Request};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// JSON body extractor whose rejections use the `{message}` error body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Multipart extractor with the same `{message}` rejections as [`ApiJson`].
pub struct ApiMultipart(pub Multipart);

impl<S> FromRequest<S> for ApiMultipart
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Multipart::from_request(req, state)
            .await
            .map(ApiMultipart)
            .map_err(ApiError::from)
    }
}

/// Error body shared by every route
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}

/// Plain acknowledgement body
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Body of the delete-image routes
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteImageRequest {
    pub image_name: Option<String>,
}
