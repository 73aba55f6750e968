use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub master_key: String,
    pub admin_key: Option<String>,
    /// Upper bound on a single connectivity test, in seconds.
    /// Set via PROMODESK_TEST_TIMEOUT_SECS env var. Default: 5.
    pub test_timeout_secs: u64,
}

impl Config {
    /// Returns the admin key for API authentication.
    /// Falls back to master_key if PROMODESK_ADMIN_KEY is not set.
    pub fn admin_key(&self) -> &str {
        self.admin_key.as_deref().unwrap_or(&self.master_key)
    }
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();

    // The registry cannot run without its encryption key; a missing or
    // malformed key is a fatal startup condition.
    let master_key = std::env::var("PROMODESK_MASTER_KEY").map_err(|_| {
        anyhow::anyhow!(
            "PROMODESK_MASTER_KEY is not set. Generate one with \
             `openssl rand -hex 32` and export it before starting."
        )
    })?;
    crate::vault::parse_master_key(&master_key)?;

    Ok(Config {
        port: std::env::var("PROMODESK_PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse()
            .unwrap_or(8080),
        database_url: std::env::var("PROMODESK_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://promodesk.db".into()),
        master_key,
        admin_key: std::env::var("PROMODESK_ADMIN_KEY").ok(),
        test_timeout_secs: std::env::var("PROMODESK_TEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5),
    })
}
