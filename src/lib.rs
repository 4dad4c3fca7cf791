//! Portfolio CMS - library for app logic and testing

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod routes;
pub mod state;
pub mod store;
pub mod uploads;

#[cfg(test)]
mod test_support;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    cors::{Any as AnyOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::db::models::{AboutSection, DesignSection};
use crate::error::ApiError;
use crate::routes::{pages, ErrorResponse};
use crate::state::AppState;
use crate::store::{ContentStore, MemoryStore, PgStore};

/// Configure CORS from ALLOWED_ORIGINS.
/// Any origin is allowed when the list is empty.
pub fn configure_cors(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if origins.is_empty() {
        cors.allow_origin(AnyOrigin)
    } else {
        cors.allow_origin(origins)
    }
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            message: "Not found".to_string(),
        }),
    )
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    ApiError::Internal(format!("handler panicked: {}", detail)).into_response()
}

/// Create and configure the application router.
pub fn create_app(state: AppState) -> Router {
    let config = state.config.clone();
    let cors = configure_cors(&config);

    let router = Router::new()
        // Home
        .route(
            "/api/homecontent",
            get(routes::home::get_home_content).put(routes::home::update_home_content),
        )
        // About
        .route(
            "/api/aboutcontent",
            get(pages::get_content::<AboutSection>).put(pages::update_content::<AboutSection>),
        )
        .route(
            "/api/aboutcontent/section/{index}",
            put(pages::update_section::<AboutSection>),
        )
        .route(
            "/api/aboutcontent/image",
            put(pages::upload_section_image::<AboutSection>)
                .delete(pages::delete_section_image::<AboutSection>),
        )
        .route(
            "/api/aboutcontent/jumbotron",
            put(pages::upload_jumbotron::<AboutSection>)
                .delete(pages::delete_jumbotron::<AboutSection>),
        )
        // Design
        .route(
            "/api/designcontent",
            get(pages::get_content::<DesignSection>).put(pages::update_content::<DesignSection>),
        )
        .route(
            "/api/designcontent/section/{index}",
            put(pages::update_section::<DesignSection>),
        )
        .route(
            "/api/designcontent/image",
            put(pages::upload_section_image::<DesignSection>)
                .delete(pages::delete_section_image::<DesignSection>),
        )
        .route(
            "/api/designcontent/jumbotron",
            put(pages::upload_jumbotron::<DesignSection>)
                .delete(pages::delete_jumbotron::<DesignSection>),
        )
        // Portfolio
        .route(
            "/api/portfoliocontent",
            get(routes::portfolio::get_portfolio_content)
                .put(routes::portfolio::update_portfolio_content),
        )
        // Websites
        .route(
            "/api/websites",
            get(routes::websites::list_websites).post(routes::websites::create_website),
        )
        .route("/api/websites/admin", get(routes::websites::admin_websites))
        .route("/api/websites/search", get(routes::websites::search_websites))
        .route(
            "/api/websites/slug/{slug}",
            get(routes::websites::get_website_by_slug),
        )
        .route(
            "/api/websites/{id}",
            get(routes::websites::get_website)
                .put(routes::websites::update_website)
                .delete(routes::websites::delete_website),
        )
        // Uploads
        .route("/api/upload/single", post(routes::upload::upload_image))
        .route(
            "/api/upload/image",
            axum::routing::delete(routes::upload::delete_image),
        )
        // Users
        .route("/api/users/signin", post(routes::users::signin))
        .route("/api/users/signup", post(routes::users::signup))
        .route(
            "/api/users/forget-password",
            post(routes::users::forget_password),
        )
        .route(
            "/api/users/reset-password",
            post(routes::users::reset_password),
        )
        // Health
        .route("/health", get(routes::health::health_ping))
        .route("/health/detailed", get(routes::health::health_detailed))
        .route("/health/ready", get(routes::health::health_ready))
        .nest_service("/uploads", ServeDir::new(state.uploads.root()));

    // Production serves the built frontend with index.html as SPA fallback.
    let router = if config.is_production() {
        let index = config.frontend_dist.join("index.html");
        router.fallback_service(ServeDir::new(&config.frontend_dist).fallback(ServeFile::new(index)))
    } else {
        router.fallback(not_found)
    };

    router
        .with_state(state)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.body_limit_bytes()))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(logging::middleware::propagate_request_id_layer())
        .layer(middleware::from_fn(logging::middleware::log_request))
        .layer(logging::middleware::request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}

/// Pick the storage backend: PostgreSQL when DATABASE_URL is set, memory otherwise.
async fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn ContentStore>> {
    match config.database_url.as_deref() {
        Some(url) => {
            let db_config = db::DbConfig::new(url);
            let pool = db::init_pool(&db_config)
                .await
                .context("failed to connect to PostgreSQL")?;
            db::run_migrations(&pool)
                .await
                .context("failed to run database migrations")?;
            Ok(Arc::new(PgStore::new(pool)))
        }
        None => {
            tracing::warn!("DATABASE_URL not set. Content is kept in memory and lost on restart.");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Run the server (used by main).
pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env();

    // Guards must outlive the server or buffered log lines are lost.
    let _log_guards = logging::init(&config);

    config.validate()?;
    routes::health::init_start_time();

    let store = open_store(&config).await?;
    let state = AppState::new(config, store);

    state
        .uploads
        .ensure_dir()
        .await
        .with_context(|| format!("cannot create upload directory {}", state.uploads.root().display()))?;
    tracing::info!(dir = %state.uploads.root().display(), "Upload directory ready");

    routes::users::seed_admin(&state)
        .await
        .map_err(|e| anyhow::anyhow!("failed to seed admin account: {}", e))?;

    let addr: SocketAddr = format!("{}:{}", state.config.host, state.config.port)
        .parse()
        .context("invalid HOST/PORT configuration")?;

    let app = create_app(state);

    tracing::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("server error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::config::AppConfig;
    use crate::test_support::TestApp;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_unknown_path_is_json_not_found() {
        let app = TestApp::new();
        let (status, body) = app.get("/no/such/page").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Not found");
    }

    #[tokio::test]
    async fn test_uploaded_files_are_served() {
        let app = TestApp::new();
        std::fs::write(app.upload_dir().join("123-hero.png"), crate::test_support::PNG_BYTES)
            .unwrap();
        let (status, bytes) = app.get_raw("/uploads/123-hero.png").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&bytes[..], crate::test_support::PNG_BYTES);
    }

    #[tokio::test]
    async fn test_production_serves_spa_index() {
        let dist = tempfile::TempDir::new().unwrap();
        std::fs::write(dist.path().join("index.html"), "<html>app</html>").unwrap();
        let app = TestApp::with_config(AppConfig {
            environment: "production".to_string(),
            frontend_dist: dist.path().to_path_buf(),
            ..AppConfig::default()
        });

        let (status, bytes) = app.get_raw("/portfolio/bakery-shop").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&bytes[..], b"<html>app</html>");

        let (status, _) = app.get("/api/homecontent").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_malformed_json_gets_message_body() {
        use axum::body::Body;
        use axum::http::{header, Request};
        use tower::ServiceExt;

        let app = TestApp::new();
        let req = Request::post("/api/users/signin")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let res = super::create_app(app.state.clone()).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["message"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_cors_echoes_only_configured_origins() {
        use axum::body::Body;
        use axum::http::{header, Method, Request};
        use tower::ServiceExt;

        let app = TestApp::with_config(AppConfig {
            allowed_origins: vec!["https://example.com".to_string()],
            ..AppConfig::default()
        });
        let preflight = |origin: &str| {
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/homecontent")
                .header(header::ORIGIN, origin)
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PUT")
                .body(Body::empty())
                .unwrap()
        };

        let router = super::create_app(app.state.clone());
        let res = router
            .clone()
            .oneshot(preflight("https://example.com"))
            .await
            .unwrap();
        assert_eq!(
            res.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://example.com"
        );

        let res = router.oneshot(preflight("https://evil.example")).await.unwrap();
        assert!(res.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }
}
