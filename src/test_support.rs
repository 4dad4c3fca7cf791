//! Router test harness: in-memory store, temp upload directory and signed tokens.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;
use tower::ServiceExt;

use crate::auth::create_access_token;
use crate::config::AppConfig;
use crate::db::models::User;
use crate::state::AppState;

/// Smallest byte string that passes the PNG signature check.
pub const PNG_BYTES: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

const BOUNDARY: &str = "----portfolio-cms-test-boundary";

pub struct TestApp {
    pub state: AppState,
    router: Router,
    uploads: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// Uses `config` with the upload directory redirected to a temp dir.
    pub fn with_config(config: AppConfig) -> Self {
        let uploads = TempDir::new().unwrap();
        let config = AppConfig {
            upload_dir: uploads.path().to_path_buf(),
            ..config
        };
        let state = AppState::in_memory(config);
        let router = crate::create_app(state.clone());
        Self {
            state,
            router,
            uploads,
        }
    }

    pub fn upload_dir(&self) -> &Path {
        self.uploads.path()
    }

    pub fn upload_exists(&self, name: &str) -> bool {
        self.uploads.path().join(name).is_file()
    }

    pub fn upload_count(&self) -> usize {
        std::fs::read_dir(self.uploads.path()).unwrap().count()
    }

    fn token_for(&self, is_admin: bool) -> String {
        let user = User::new("Tester", "tester@example.com", String::new(), is_admin);
        create_access_token(&user, &self.state.config).unwrap()
    }

    pub fn admin_token(&self) -> String {
        self.token_for(true)
    }

    pub fn user_token(&self) -> String {
        self.token_for(false)
    }

    async fn call(&self, req: Request<Body>) -> (StatusCode, axum::body::Bytes) {
        let res = self.router.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes)
    }

    fn to_json(bytes: &[u8]) -> Value {
        if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(bytes).into_owned())
            })
        }
    }

    fn builder(method: Method, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder
    }

    pub async fn get_raw(&self, uri: &str) -> (StatusCode, axum::body::Bytes) {
        self.call(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let (status, bytes) = self.get_raw(uri).await;
        (status, Self::to_json(&bytes))
    }

    pub async fn send_empty(&self, method: Method, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let req = Self::builder(method, uri, token).body(Body::empty()).unwrap();
        let (status, bytes) = self.call(req).await;
        (status, Self::to_json(&bytes))
    }

    pub async fn send_json(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: &Value,
    ) -> (StatusCode, Value) {
        let req = Self::builder(method, uri, token)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap();
        let (status, bytes) = self.call(req).await;
        (status, Self::to_json(&bytes))
    }

    /// Single-file multipart request.
    pub async fn send_multipart(
        &self,
        method: Method,
        uri: &str,
        token: &str,
        field: &str,
        filename: &str,
        content: &[u8],
    ) -> (StatusCode, Value) {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        let req = Self::builder(method, uri, Some(token))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        let (status, bytes) = self.call(req).await;
        (status, Self::to_json(&bytes))
    }
}
