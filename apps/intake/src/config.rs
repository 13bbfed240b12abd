use std::time::Duration;

use anyhow::{bail, Context, Result};

const DEFAULT_API_BASE: &str = "http://localhost:8000";
const DEFAULT_POLL_INTERVAL_MS: u64 = 4000;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Client configuration loaded from environment variables.
/// Nothing is required; every value has a local-development default.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base: String,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            api_base: normalize_base(optional_env("INTAKE_API_BASE").as_deref()),
            poll_interval: poll_interval(
                parse_env_u64("INTAKE_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS)?,
                "INTAKE_POLL_INTERVAL_MS",
            )?,
            request_timeout: Duration::from_secs(parse_env_u64(
                "INTAKE_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    pub fn with_api_base(mut self, base: Option<String>) -> Self {
        if let Some(base) = base {
            self.api_base = normalize_base(Some(&base));
        }
        self
    }

    /// `--interval-ms` override. Zero is rejected like it is in the environment.
    pub fn with_poll_interval_ms(mut self, ms: Option<u64>) -> Result<Self> {
        if let Some(ms) = ms {
            self.poll_interval = poll_interval(ms, "--interval-ms")?;
        }
        Ok(self)
    }
}

fn poll_interval(ms: u64, source: &str) -> Result<Duration> {
    if ms == 0 {
        bail!("{source} must be at least 1 millisecond, got 0");
    }
    Ok(Duration::from_millis(ms))
}

/// Empty or missing values fall back to the local backend origin.
pub fn normalize_base(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(base) if !base.is_empty() => base.trim_end_matches('/').to_string(),
        _ => DEFAULT_API_BASE.to_string(),
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env_u64(key: &str, default: u64) -> Result<u64> {
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .with_context(|| format!("{key} must be a non-negative integer, got '{raw}'")),
        None => Ok(default),
    }
}
