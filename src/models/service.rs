use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::Category;

/// Lifecycle stage of a service's configuration.
///
/// Transitions are driven only by configure/test/remove calls — there is
/// no background process touching these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    NotConfigured,
    Disconnected,
    Connected,
    Error,
}

impl ServiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::NotConfigured => "not_configured",
            ServiceStatus::Disconnected => "disconnected",
            ServiceStatus::Connected => "connected",
            ServiceStatus::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "not_configured" => Some(ServiceStatus::NotConfigured),
            "disconnected" => Some(ServiceStatus::Disconnected),
            "connected" => Some(ServiceStatus::Connected),
            "error" => Some(ServiceStatus::Error),
            _ => None,
        }
    }
}

/// Classification of a failed connectivity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Auth,
    Network,
    Timeout,
    Unknown,
}

/// Result of a single connectivity test. A classified failure is a normal
/// outcome here, not an error — the caller decides whether to re-invoke.
#[derive(Debug, Clone, Serialize)]
pub struct TestOutcome {
    pub success: bool,
    pub status: ServiceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<FailureKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tested_at: Option<DateTime<Utc>>,
}

/// Per-service view returned by the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceState {
    pub name: &'static str,
    pub category: Category,
    pub status: ServiceStatus,
    pub enabled: bool,
    pub configured: bool,
    pub last_tested_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Health {
    Healthy,
    Degraded,
    Critical,
}

/// Catalog-wide status roll-up. `configured_services` counts services with
/// a persisted configuration, matching the dashboard's "ready" counter.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub services: Vec<ServiceState>,
    pub overall_health: Health,
    pub configured_services: usize,
    pub total_services: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            ServiceStatus::NotConfigured,
            ServiceStatus::Disconnected,
            ServiceStatus::Connected,
            ServiceStatus::Error,
        ] {
            assert_eq!(ServiceStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ServiceStatus::parse("ready"), None);
    }

    #[test]
    fn failure_kind_serializes_snake_case() {
        let json = serde_json::to_value(FailureKind::Auth).unwrap();
        assert_eq!(json, "auth");
    }
}
