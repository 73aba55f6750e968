use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::catalog::{ProbeAuth, ServiceDescriptor};
use crate::models::service::FailureKind;

/// A failed connectivity check with its cause classification.
/// The message must never contain credential material — status codes and
/// transport errors only.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct CheckFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl CheckFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }
}

/// Capability seam for per-service connectivity verification.
/// The registry owns the timeout; implementations just attempt the check.
#[async_trait]
pub trait ConnectivityChecker: Send + Sync {
    async fn check(
        &self,
        descriptor: &ServiceDescriptor,
        fields: &HashMap<String, String>,
    ) -> Result<(), CheckFailure>;
}

/// Production checker: hits the descriptor's declared probe endpoint with
/// the primary credential. Services without a probe pass vacuously — none
/// of the social or book platforms expose a stable unauthenticated
/// metadata endpoint worth hardcoding.
pub struct HttpChecker {
    client: reqwest::Client,
}

impl HttpChecker {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpChecker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConnectivityChecker for HttpChecker {
    async fn check(
        &self,
        descriptor: &ServiceDescriptor,
        fields: &HashMap<String, String>,
    ) -> Result<(), CheckFailure> {
        let Some(probe) = descriptor.probe else {
            return Ok(());
        };

        let credential = descriptor
            .primary
            .and_then(|key| fields.get(key))
            .ok_or_else(|| {
                CheckFailure::new(FailureKind::Unknown, "no primary credential stored")
            })?;

        let request = self.client.get(probe.url);
        let request = match probe.auth {
            ProbeAuth::Bearer => request.bearer_auth(credential),
            ProbeAuth::Header(name) => request.header(name, credential.as_str()),
            ProbeAuth::Query(param) => request.query(&[(param, credential.as_str())]),
        };

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                CheckFailure::new(FailureKind::Timeout, "probe timed out")
            } else {
                CheckFailure::new(FailureKind::Network, format!("probe failed: {}", e))
            }
        })?;

        match response.status() {
            s if s.is_success() => Ok(()),
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => Err(
                CheckFailure::new(FailureKind::Auth, "credential rejected by provider"),
            ),
            s => Err(CheckFailure::new(
                FailureKind::Unknown,
                format!("probe returned status {}", s.as_u16()),
            )),
        }
    }
}
