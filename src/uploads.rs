//! Upload store: one directory of uploaded images shared by every router.
//!
//! Files are named `<unix-millis>-<sanitized original name>` and served
//! under [`PUBLIC_PREFIX`].

use axum::extract::Multipart;
use chrono::Utc;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

use crate::db::models::ImageRef;

pub const PUBLIC_PREFIX: &str = "/uploads";

const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Attempts at finding a free name before giving up.
const MAX_NAME_ATTEMPTS: i64 = 16;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No file uploaded")]
    MissingFile,

    #[error("Empty file")]
    Empty,

    #[error("File too large. Maximum size is {0} MB.")]
    TooLarge(usize),

    #[error("Images only! Allowed: JPEG, PNG, GIF, WebP.")]
    UnsupportedType,

    #[error("Invalid filename")]
    InvalidName,

    #[error("Image not found")]
    NotFound,

    #[error("Invalid multipart data: {0}")]
    Multipart(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct UploadStore {
    root: Arc<PathBuf>,
    max_bytes: usize,
}

fn sniff_image(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [0x89, 0x50, 0x4E, 0x47, ..] => Some("image/png"),
        [0x47, 0x49, 0x46, 0x38, ..] => Some("image/gif"),
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Some("image/webp"),
        _ => None,
    }
}

fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Keep the last path component and replace anything outside `[A-Za-z0-9._-]`.
fn sanitize_original_name(original: &str) -> String {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Stored names never start with a dot or contain separators.
fn is_safe_stored_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains("..")
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains('\0')
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            root: Arc::new(root.into()),
            max_bytes,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn ensure_dir(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(self.root.as_ref()).await
    }

    pub fn public_url(name: &str) -> String {
        format!("{}/{}", PUBLIC_PREFIX, name)
    }

    /// Read the multipart field called `field_name` and store it.
    /// Other fields are skipped.
    pub async fn save_field(
        &self,
        multipart: &mut Multipart,
        field_name: &str,
    ) -> Result<ImageRef, UploadError> {
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| UploadError::Multipart(e.to_string()))?
        {
            if field.name() != Some(field_name) {
                continue;
            }
            let original = field.file_name().unwrap_or("upload").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| UploadError::Multipart(e.to_string()))?;
            return self.store(&original, &bytes).await;
        }
        Err(UploadError::MissingFile)
    }

    /// Validate and write one image, returning its reference.
    pub async fn store(&self, original_name: &str, bytes: &[u8]) -> Result<ImageRef, UploadError> {
        let ext = extension_of(original_name).ok_or(UploadError::UnsupportedType)?;
        if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
            return Err(UploadError::UnsupportedType);
        }
        if bytes.is_empty() {
            return Err(UploadError::Empty);
        }
        if bytes.len() > self.max_bytes {
            return Err(UploadError::TooLarge(self.max_bytes / (1024 * 1024)));
        }
        if sniff_image(bytes).is_none() {
            return Err(UploadError::UnsupportedType);
        }

        self.ensure_dir().await?;
        let base = sanitize_original_name(original_name);
        let mut millis = Utc::now().timestamp_millis();

        for _ in 0..MAX_NAME_ATTEMPTS {
            let name = format!("{}-{}", millis, base);
            let path = self.root.join(&name);
            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(mut file) => {
                    if let Err(e) = file.write_all(bytes).await {
                        let _ = tokio::fs::remove_file(&path).await;
                        return Err(e.into());
                    }
                    file.flush().await?;
                    tracing::info!(file = %name, size = bytes.len(), "image stored");
                    return Ok(ImageRef {
                        url: Self::public_url(&name),
                        name,
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => millis += 1,
                Err(e) => return Err(e.into()),
            }
        }

        Err(UploadError::Io(std::io::Error::new(
            ErrorKind::AlreadyExists,
            format!("no free upload name for {}", base),
        )))
    }

    pub async fn exists(&self, name: &str) -> bool {
        is_safe_stored_name(name)
            && tokio::fs::try_exists(self.root.join(name))
                .await
                .unwrap_or(false)
    }

    /// Delete a stored file; [`UploadError::NotFound`] when it is absent.
    pub async fn remove(&self, name: &str) -> Result<(), UploadError> {
        if !is_safe_stored_name(name) {
            return Err(UploadError::InvalidName);
        }
        let path = self.root.join(name);
        // Only regular files count as stored images.
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Err(UploadError::NotFound),
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(UploadError::NotFound),
            Err(e) => return Err(e.into()),
        }
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(file = %name, "image deleted");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(UploadError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a file that may already be gone. Returns whether it existed.
    pub async fn remove_if_present(&self, name: &str) -> Result<bool, UploadError> {
        match self.remove(name).await {
            Ok(()) => Ok(true),
            Err(UploadError::NotFound) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
