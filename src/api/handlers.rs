use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::catalog::{Category, FieldSpec};
use crate::errors::AppError;
use crate::models::service::{ServiceStatus, TestOutcome};
use crate::AppState;

// ── Request / Response DTOs ──────────────────────────────────

#[derive(Deserialize)]
pub struct ConfigureRequest {
    pub service: String,
    pub api_key: Option<String>,
    #[serde(default)]
    pub additional_config: HashMap<String, Value>,
}

#[derive(Serialize)]
pub struct ConfigureResponse {
    pub success: bool,
    pub message: String,
    pub service: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct ServiceView {
    pub name: &'static str,
    pub description: &'static str,
    pub fields: &'static [FieldSpec],
    pub status: ServiceStatus,
    pub enabled: bool,
    pub configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_tested_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
pub struct CategoryGroup {
    pub category: Category,
    pub services: Vec<ServiceView>,
}

#[derive(Serialize)]
pub struct RemoveResponse {
    pub success: bool,
    pub service: String,
    pub message: String,
}

// The dashboard posts checkbox and numeric values as JSON primitives;
// secrets are always strings. Everything is stored stringified.
fn coerce(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

// ── Handlers ─────────────────────────────────────────────────

/// GET /api/services — full catalog with field specs and live status.
pub async fn list_services(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CategoryGroup>>, AppError> {
    let report = state.registry.get_status().await?;
    let by_name: HashMap<&str, _> = report
        .services
        .iter()
        .map(|s| (s.name, (s.status, s.last_tested_at)))
        .collect();

    let groups = Category::ALL
        .iter()
        .map(|&category| CategoryGroup {
            category,
            services: crate::catalog::services_in(category)
                .map(|d| {
                    let (status, last_tested_at) = by_name
                        .get(d.name)
                        .copied()
                        .unwrap_or((ServiceStatus::NotConfigured, None));
                    let configured = status != ServiceStatus::NotConfigured;
                    ServiceView {
                        name: d.name,
                        description: d.description,
                        fields: d.fields,
                        status,
                        enabled: configured,
                        configured,
                        last_tested_at,
                    }
                })
                .collect(),
        })
        .collect();

    Ok(Json(groups))
}

/// GET /api/status — category → service → {status, enabled, configured},
/// plus the overall health roll-up the dashboard header shows.
pub async fn get_status(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let report = state.registry.get_status().await?;

    let mut data = serde_json::Map::new();
    for category in Category::ALL {
        let mut services = serde_json::Map::new();
        for s in report.services.iter().filter(|s| s.category == category) {
            services.insert(
                s.name.to_string(),
                json!({
                    "enabled": s.enabled,
                    "configured": s.configured,
                    "status": s.status,
                }),
            );
        }
        data.insert(category.as_str().to_string(), Value::Object(services));
    }
    data.insert("overall_health".into(), json!(report.overall_health));
    data.insert(
        "configured_services".into(),
        json!(report.configured_services),
    );
    data.insert("total_services".into(), json!(report.total_services));
    data.insert("last_checked".into(), json!(Utc::now()));

    Ok(Json(json!({ "success": true, "data": data })))
}

/// POST /api/configure — body {service, api_key, additional_config}.
/// `api_key` maps onto the descriptor's primary field; the rest of the
/// field map comes from `additional_config`.
pub async fn configure_service(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ConfigureRequest>,
) -> Result<Json<ConfigureResponse>, AppError> {
    let descriptor = state.registry.descriptor(&payload.service)?;

    let mut fields: HashMap<String, String> = payload
        .additional_config
        .iter()
        .map(|(k, v)| (k.clone(), coerce(v)))
        .collect();
    if let (Some(primary), Some(api_key)) = (descriptor.primary, payload.api_key) {
        fields.insert(primary.to_string(), api_key);
    }

    state.registry.configure(&payload.service, &fields).await?;

    Ok(Json(ConfigureResponse {
        success: true,
        message: format!("Configuration updated for {}", payload.service),
        service: payload.service,
        updated_at: Utc::now(),
    }))
}

/// POST /api/services/:service/test — single bounded connectivity check.
pub async fn test_service(
    State(state): State<Arc<AppState>>,
    Path(service): Path<String>,
) -> Result<Json<TestOutcome>, AppError> {
    let outcome = state.registry.test_connection(&service).await?;
    Ok(Json(outcome))
}

/// DELETE /api/services/:service — idempotent removal.
pub async fn remove_service(
    State(state): State<Arc<AppState>>,
    Path(service): Path<String>,
) -> Result<(StatusCode, Json<RemoveResponse>), AppError> {
    state.registry.remove_configuration(&service).await?;
    Ok((
        StatusCode::OK,
        Json(RemoveResponse {
            success: true,
            message: format!("Service '{}' removed successfully", service),
            service,
        }),
    ))
}
