use std::time::Duration;

use reqwest::Client;
use sqlx::SqlitePool;

use crate::error::AppError;

const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
}

/// State of the forwarding layer: one shared client and the API base URL.
#[derive(Clone)]
pub struct ProxyState {
    pub client: Client,
    pub upstream: String,
}

impl ProxyState {
    pub fn new(upstream: impl Into<String>) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(UPSTREAM_TIMEOUT)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build http client: {}", e)))?;

        Ok(Self {
            client,
            upstream: upstream.into().trim_end_matches('/').to_string(),
        })
    }
}
