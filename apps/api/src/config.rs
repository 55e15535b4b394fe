use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::llm_client::DEFAULT_MODEL;
use crate::retry::RetryPolicy;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub llm_model: String,
    /// Per-file ceiling; larger uploads are dropped, not rejected.
    pub upload_max_size: usize,
    /// Whole multipart body ceiling.
    pub request_body_limit: usize,
    pub web_scraping_timeout: Duration,
    pub pdf_extraction_timeout: Duration,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
    pub request_timeout: Duration,
    /// PNG bytes the texture cache may retain before rendering uncached.
    pub texture_cache_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            llm_model: std::env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            upload_max_size: env_or("UPLOAD_MAX_SIZE", 10 * 1024 * 1024)?,
            request_body_limit: env_or("REQUEST_BODY_LIMIT", 50 * 1024 * 1024)?,
            web_scraping_timeout: Duration::from_millis(env_or("WEB_SCRAPING_TIMEOUT", 30_000)?),
            pdf_extraction_timeout: Duration::from_millis(env_or("PDF_EXTRACTION_TIMEOUT", 10_000)?),
            max_retries: env_or("MAX_RETRIES", 2)?,
            retry_base_delay: Duration::from_millis(env_or("RETRY_BASE_DELAY_MS", 500)?),
            request_timeout: Duration::from_secs(env_or("REQUEST_TIMEOUT_SECS", 300)?),
            texture_cache_bytes: env_or("TEXTURE_CACHE_BYTES", 64 * 1024 * 1024)?,
            port: env_or("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.retry_base_delay)
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Parses `key` when set, otherwise returns `default`.
fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw:?}")),
        Err(_) => Ok(default),
    }
}
