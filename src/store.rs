use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::types::Json;
use sqlx::SqlitePool;

use crate::models::service::ServiceStatus;
use crate::vault::EncryptedPayload;

/// One persisted record per configured service, keyed by service name.
#[derive(Debug, sqlx::FromRow)]
pub struct ServiceConfigRow {
    pub service: String,
    pub fields: Json<HashMap<String, EncryptedPayload>>,
    pub status: String,
    pub last_tested_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // SQLite has a single writer; one pooled connection avoids lock
        // contention and keeps `:memory:` databases coherent.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run pending migrations from the migrations/ directory.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Create or replace the record for a service in a single statement,
    /// so a failed write leaves the prior record untouched.
    /// Re-configuring resets the status and clears the last test verdict.
    pub async fn upsert_config(
        &self,
        service: &str,
        fields: &HashMap<String, EncryptedPayload>,
        status: ServiceStatus,
    ) -> sqlx::Result<()> {
        let now = Utc::now();
        sqlx::query(
            r#"INSERT INTO service_configs (service, fields, status, last_tested_at, created_at, updated_at)
               VALUES (?1, ?2, ?3, NULL, ?4, ?4)
               ON CONFLICT(service) DO UPDATE SET
                   fields = excluded.fields,
                   status = excluded.status,
                   last_tested_at = NULL,
                   updated_at = excluded.updated_at"#,
        )
        .bind(service)
        .bind(Json(fields))
        .bind(status.as_str())
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_config(&self, service: &str) -> sqlx::Result<Option<ServiceConfigRow>> {
        sqlx::query_as::<_, ServiceConfigRow>(
            "SELECT service, fields, status, last_tested_at, created_at, updated_at
             FROM service_configs WHERE service = ?1",
        )
        .bind(service)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn list_configs(&self) -> sqlx::Result<Vec<ServiceConfigRow>> {
        sqlx::query_as::<_, ServiceConfigRow>(
            "SELECT service, fields, status, last_tested_at, created_at, updated_at
             FROM service_configs ORDER BY service ASC",
        )
        .fetch_all(&self.pool)
        .await
    }

    /// Update the status after a connectivity test. `tested_at` is set only
    /// on success; on failure the prior successful timestamp is kept.
    pub async fn set_status(
        &self,
        service: &str,
        status: ServiceStatus,
        tested_at: Option<DateTime<Utc>>,
    ) -> sqlx::Result<()> {
        sqlx::query(
            r#"UPDATE service_configs
               SET status = ?2,
                   last_tested_at = COALESCE(?3, last_tested_at),
                   updated_at = ?4
               WHERE service = ?1"#,
        )
        .bind(service)
        .bind(status.as_str())
        .bind(tested_at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Returns whether a record existed. Deleting an absent record is a
    /// no-op success.
    pub async fn delete_config(&self, service: &str) -> sqlx::Result<bool> {
        let result = sqlx::query("DELETE FROM service_configs WHERE service = ?1")
            .bind(service)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
