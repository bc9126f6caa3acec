use crate::state::AppState;
use crate::views;
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

/// Store pings slower than this report the store as degraded.
const SLOW_PING: Duration = Duration::from_secs(1);

/// Health status for a component or the overall system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    /// Serving, but slower or partially failing
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    pub fn status_code(&self) -> StatusCode {
        match self {
            HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
            HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// The worse of the two.
    pub fn combine(self, other: Self) -> Self {
        match (self, other) {
            (HealthStatus::Unhealthy, _) | (_, HealthStatus::Unhealthy) => HealthStatus::Unhealthy,
            (HealthStatus::Degraded, _) | (_, HealthStatus::Degraded) => HealthStatus::Degraded,
            _ => HealthStatus::Healthy,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ComponentHealth {
    pub fn healthy(details: serde_json::Value) -> Self {
        Self {
            status: HealthStatus::Healthy,
            error: None,
            details: Some(details),
        }
    }

    pub fn degraded(error: impl Into<String>, details: serde_json::Value) -> Self {
        Self {
            status: HealthStatus::Degraded,
            error: Some(error.into()),
            details: Some(details),
        }
    }

    pub fn unhealthy(error: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            error: Some(error.into()),
            details: None,
        }
    }
}

/// Liveness response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub timestamp: i64,
    pub version: String,
}

impl IntoResponse for HealthResponse {
    fn into_response(self) -> Response {
        let status = self.status.status_code();
        (status, Json(self)).into_response()
    }
}

/// Readiness response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub status: HealthStatus,
    pub timestamp: i64,
    pub components: BTreeMap<String, ComponentHealth>,
}

impl IntoResponse for ReadinessResponse {
    fn into_response(self) -> Response {
        let status = if self.ready {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };
        (status, Json(self)).into_response()
    }
}

/// Runs the component checks against the shared state.
#[derive(Clone)]
pub struct HealthChecker {
    state: Arc<AppState>,
}

impl HealthChecker {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// The process is up and answering.
    pub fn liveness(&self) -> HealthResponse {
        HealthResponse {
            status: HealthStatus::Healthy,
            timestamp: now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Ready when the store answers a ping.
    pub async fn readiness(&self) -> ReadinessResponse {
        let mut components = BTreeMap::new();
        components.insert("store".to_string(), self.check_store().await);
        components.insert("templates".to_string(), self.check_templates());

        let status = components
            .values()
            .fold(HealthStatus::Healthy, |overall, health| {
                overall.combine(health.status)
            });

        ReadinessResponse {
            ready: status != HealthStatus::Unhealthy,
            status,
            timestamp: now(),
            components,
        }
    }

    async fn check_store(&self) -> ComponentHealth {
        let store = self.state.store();
        let started = Instant::now();
        match store.ping().await {
            Ok(()) => {
                let elapsed = started.elapsed();
                let details = serde_json::json!({
                    "backend": store.backend(),
                    "ping_ms": elapsed.as_millis() as u64,
                });
                if elapsed > SLOW_PING {
                    ComponentHealth::degraded("store ping is slow", details)
                } else {
                    ComponentHealth::healthy(details)
                }
            }
            Err(error) => {
                tracing::warn!(%error, "store readiness check failed");
                ComponentHealth::unhealthy(format!("store ping failed: {error}"))
            }
        }
    }

    fn check_templates(&self) -> ComponentHealth {
        let required = [
            views::INDEX,
            views::CATEGORY_LIST,
            views::CATEGORY_DETAIL,
            views::CATEGORY_FORM,
            views::CATEGORY_DELETE,
            views::PRODUCT_LIST,
            views::PRODUCT_DETAIL,
            views::PRODUCT_FORM,
            views::PRODUCT_DELETE,
        ];
        let missing: Vec<&str> = required
            .into_iter()
            .filter(|name| !self.state.views().has_template(name))
            .collect();
        if missing.is_empty() {
            ComponentHealth::healthy(serde_json::json!({ "templates": required.len() }))
        } else {
            ComponentHealth::unhealthy(format!("missing templates: {}", missing.join(", ")))
        }
    }
}

fn now() -> i64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// `GET /health`
pub async fn liveness_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    HealthChecker::new(state).liveness()
}

/// `GET /ready`
pub async fn readiness_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    HealthChecker::new(state).readiness().await
}
