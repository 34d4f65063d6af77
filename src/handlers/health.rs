use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::app_state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
    pub environment: String,
    pub sms_provider: String,
    pub sms_configured: bool,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub missing_settings: Vec<String>,
}

impl HealthStatus {
    pub fn from_state(state: &AppState) -> Self {
        let missing: Vec<String> = state
            .notifier
            .missing_settings()
            .into_iter()
            .map(str::to_string)
            .collect();

        Self {
            status: if missing.is_empty() {
                "healthy".to_string()
            } else {
                "degraded".to_string()
            },
            timestamp: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: state.config.environment.clone(),
            sms_provider: state.notifier.provider().to_string(),
            sms_configured: missing.is_empty(),
            missing_settings: missing,
        }
    }
}

/// Liveness check
/// GET /
pub async fn root() -> Json<Value> {
    Json(json!({ "ok": true }))
}

/// Detailed health check endpoint
/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus::from_state(&state))
}
