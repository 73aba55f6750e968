//! The credential registry: catalog reads, validated configuration writes,
//! connectivity testing, and removal. Writes for the same service key are
//! serialized through a per-key async mutex; distinct services proceed in
//! parallel.

pub mod checker;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::catalog::{self, FieldKind, ServiceDescriptor};
use crate::errors::AppError;
use crate::models::service::{
    FailureKind, Health, ServiceState, ServiceStatus, StatusReport, TestOutcome,
};
use crate::store::SqliteStore;
use crate::vault::{EncryptedPayload, VaultCrypto};
use checker::ConnectivityChecker;

pub struct CredentialRegistry {
    store: SqliteStore,
    crypto: VaultCrypto,
    checker: Arc<dyn ConnectivityChecker>,
    locks: DashMap<String, Arc<Mutex<()>>>,
    test_timeout: Duration,
}

impl CredentialRegistry {
    pub fn new(
        store: SqliteStore,
        crypto: VaultCrypto,
        checker: Arc<dyn ConnectivityChecker>,
        test_timeout: Duration,
    ) -> Self {
        Self {
            store,
            crypto,
            checker,
            locks: DashMap::new(),
            test_timeout,
        }
    }

    /// The full static catalog. Purely declarative, immutable at runtime.
    pub fn list_catalog(&self) -> &'static [ServiceDescriptor] {
        catalog::all()
    }

    pub fn descriptor(&self, service: &str) -> Result<&'static ServiceDescriptor, AppError> {
        catalog::lookup(service).ok_or_else(|| AppError::UnknownService(service.to_string()))
    }

    fn key_lock(&self, service: &str) -> Arc<Mutex<()>> {
        self.locks.entry(service.to_string()).or_default().clone()
    }

    /// Validate and persist a configuration for `service`.
    ///
    /// Unknown field keys are ignored (forward-compatible); missing or
    /// empty required fields fail before any side effect. Every stored
    /// value is encrypted individually. A successful save always lands in
    /// `disconnected` — only a passing test promotes to `connected`.
    pub async fn configure(
        &self,
        service: &str,
        fields: &HashMap<String, String>,
    ) -> Result<(), AppError> {
        let descriptor = self.descriptor(service)?;

        let missing: Vec<String> = descriptor
            .fields
            .iter()
            .filter(|spec| spec.required)
            .filter(|spec| match fields.get(spec.key) {
                // A checkbox carries "true"/"false"; presence is enough.
                Some(_) if spec.kind == FieldKind::Checkbox => false,
                Some(value) => value.trim().is_empty(),
                None => true,
            })
            .map(|spec| spec.key.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(AppError::Validation { missing });
        }

        let mut encrypted: HashMap<String, EncryptedPayload> = HashMap::new();
        for spec in descriptor.fields {
            if let Some(value) = fields.get(spec.key) {
                let payload = self
                    .crypto
                    .encrypt(value)
                    .map_err(|e| AppError::Crypto(e.to_string()))?;
                encrypted.insert(spec.key.to_string(), payload);
            }
        }

        let lock = self.key_lock(service);
        let _guard = lock.lock().await;

        self.store
            .upsert_config(service, &encrypted, ServiceStatus::Disconnected)
            .await?;

        tracing::info!(service, "configuration saved, pending verification");
        Ok(())
    }

    /// Run a single connectivity check for a configured service.
    ///
    /// One attempt, bounded by the configured timeout; expiry is a failure
    /// outcome, never a hang. The classified result is returned to the
    /// caller and mirrored into the persisted status.
    pub async fn test_connection(&self, service: &str) -> Result<TestOutcome, AppError> {
        let descriptor = self.descriptor(service)?;

        let lock = self.key_lock(service);
        let _guard = lock.lock().await;

        let row = self
            .store
            .get_config(service)
            .await?
            .ok_or_else(|| AppError::NotConfigured(service.to_string()))?;

        let mut plaintext: HashMap<String, String> = HashMap::new();
        for (key, payload) in row.fields.0.iter() {
            let value = self
                .crypto
                .decrypt(payload)
                .map_err(|e| AppError::Crypto(e.to_string()))?;
            plaintext.insert(key.clone(), value);
        }

        let verdict =
            tokio::time::timeout(self.test_timeout, self.checker.check(descriptor, &plaintext))
                .await;

        let outcome = match verdict {
            Ok(Ok(())) => {
                let now = Utc::now();
                self.store
                    .set_status(service, ServiceStatus::Connected, Some(now))
                    .await?;
                tracing::info!(service, "connectivity test passed");
                TestOutcome {
                    success: true,
                    status: ServiceStatus::Connected,
                    cause: None,
                    message: None,
                    tested_at: Some(now),
                }
            }
            Ok(Err(failure)) => {
                self.store
                    .set_status(service, ServiceStatus::Error, None)
                    .await?;
                tracing::warn!(service, cause = ?failure.kind, "connectivity test failed: {}", failure.message);
                TestOutcome {
                    success: false,
                    status: ServiceStatus::Error,
                    cause: Some(failure.kind),
                    message: Some(failure.message),
                    tested_at: None,
                }
            }
            Err(_elapsed) => {
                self.store
                    .set_status(service, ServiceStatus::Error, None)
                    .await?;
                tracing::warn!(service, "connectivity test timed out");
                TestOutcome {
                    success: false,
                    status: ServiceStatus::Error,
                    cause: Some(FailureKind::Timeout),
                    message: Some(format!(
                        "no verdict within {}s",
                        self.test_timeout.as_secs()
                    )),
                    tested_at: None,
                }
            }
        };

        Ok(outcome)
    }

    /// Delete the persisted record for a service. Idempotent: removing an
    /// absent configuration is a no-op success.
    pub async fn remove_configuration(&self, service: &str) -> Result<(), AppError> {
        self.descriptor(service)?;

        let lock = self.key_lock(service);
        let _guard = lock.lock().await;

        let existed = self.store.delete_config(service).await?;
        if existed {
            tracing::info!(service, "configuration removed");
        }
        Ok(())
    }

    /// Status of every cataloged service, defaulting to `not_configured`
    /// where no record exists. Side-effect-free read.
    pub async fn get_status(&self) -> Result<StatusReport, AppError> {
        let rows = self.store.list_configs().await?;
        let mut by_name = HashMap::with_capacity(rows.len());
        for row in rows {
            let status = ServiceStatus::parse(&row.status).ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!(
                    "corrupt status '{}' for service '{}'",
                    row.status,
                    row.service
                ))
            })?;
            by_name.insert(row.service.clone(), (status, row.last_tested_at));
        }

        let services: Vec<ServiceState> = catalog::all()
            .iter()
            .map(|d| {
                let (status, last_tested_at) = by_name
                    .get(d.name)
                    .copied()
                    .unwrap_or((ServiceStatus::NotConfigured, None));
                let configured = status != ServiceStatus::NotConfigured;
                ServiceState {
                    name: d.name,
                    category: d.category,
                    status,
                    enabled: configured,
                    configured,
                    last_tested_at,
                }
            })
            .collect();

        let total_services = services.len();
        let configured_services = services.iter().filter(|s| s.configured).count();
        let overall_health = if configured_services == 0 {
            Health::Critical
        } else if configured_services * 2 < total_services {
            Health::Degraded
        } else {
            Health::Healthy
        };

        Ok(StatusReport {
            services,
            overall_health,
            configured_services,
            total_services,
        })
    }
}
