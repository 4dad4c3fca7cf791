/**
 * Health Routes
 * Liveness, readiness and detailed dependency checks
 */
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::state::AppState;
use crate::store::StoreError;

// Track server start time for uptime calculation
lazy_static::lazy_static! {
    static ref SERVER_START: Instant = Instant::now();
}

/// Initialize the server start time
pub fn init_start_time() {
    lazy_static::initialize(&SERVER_START);
}

/// Single dependency check result
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCheck {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ServiceCheck {
    fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            backend: None,
            response_time: None,
            error: None,
        }
    }

    fn unhealthy(error: impl Into<String>) -> Self {
        Self {
            status: "unhealthy".to_string(),
            backend: None,
            response_time: None,
            error: Some(error.into()),
        }
    }
}

/// Detailed health check response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedHealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime: Option<u64>,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthChecks {
    pub store: ServiceCheck,
    pub uploads: ServiceCheck,
}

/// Ready check response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Simple health response
#[derive(Debug, Serialize, Deserialize)]
pub struct SimpleHealthResponse {
    pub status: String,
}

fn uptime() -> u64 {
    SERVER_START.elapsed().as_secs()
}

fn store_check(tag: &str, ping: Result<Duration, StoreError>) -> ServiceCheck {
    let mut check = match ping {
        Ok(latency) => ServiceCheck {
            response_time: Some(latency.as_millis() as u64),
            ..ServiceCheck::healthy()
        },
        Err(e) => ServiceCheck::unhealthy(e.to_string()),
    };
    check.backend = Some(tag.to_string());
    check
}

fn readiness(ping: Result<Duration, StoreError>) -> (StatusCode, ReadyResponse) {
    let (status, label, reason) = match ping {
        Ok(_) => (StatusCode::OK, "ready", None),
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "not ready",
                Some(format!("Content store unavailable: {}", e)),
            )
        }
    };
    (
        status,
        ReadyResponse {
            status: label.to_string(),
            timestamp: Utc::now(),
            uptime: Some(uptime()),
            reason,
        },
    )
}

/// GET /health - Simple health ping
pub async fn health_ping() -> impl IntoResponse {
    Json(SimpleHealthResponse {
        status: "ok".to_string(),
    })
}

/// GET /health/detailed - store and upload directory checks
pub async fn health_detailed(State(state): State<AppState>) -> impl IntoResponse {
    let store = store_check(state.store.backend_tag(), state.store.ping().await);

    let uploads = match tokio::fs::metadata(state.uploads.root()).await {
        Ok(meta) if meta.is_dir() => ServiceCheck::healthy(),
        Ok(_) => ServiceCheck::unhealthy("Upload path is not a directory"),
        Err(e) => ServiceCheck::unhealthy(e.to_string()),
    };

    // Overall status stays "ok" so the frontend can tell the process is up.
    let response = DetailedHealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now(),
        uptime: Some(uptime()),
        checks: HealthChecks { store, uploads },
    };

    (StatusCode::OK, Json(response))
}

/// GET /health/ready - Readiness check, 503 while the store is unreachable
pub async fn health_ready(State(state): State<AppState>) -> impl IntoResponse {
    let (status, response) = readiness(state.store.ping().await);
    (status, Json(response))
}
