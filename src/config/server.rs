// src/config/server.rs
use std::env;
use std::time::Duration;

pub const ENV_RATE_LIMIT_PER_MINUTE: &str = "RATE_LIMIT_PER_MINUTE";
pub const ENV_RATE_LIMIT_SWEEP_THRESHOLD: &str = "RATE_LIMIT_SWEEP_THRESHOLD";
pub const ENV_CORS_ALLOWED_ORIGINS: &str = "CORS_ALLOWED_ORIGINS";
pub const ENV_UPSTREAM_TIMEOUT_SECS: &str = "UPSTREAM_TIMEOUT_SECS";
pub const ENV_METRICS_ENABLED: &str = "METRICS_ENABLED";

pub const DEFAULT_RATE_LIMIT_PER_MINUTE: usize = 10;
pub const DEFAULT_RATE_LIMIT_SWEEP_THRESHOLD: usize = 1000;

/// HTTP-layer settings. Bad values fall back to defaults instead of failing startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub rate_limit_per_minute: usize,
    pub rate_limit_sweep_threshold: usize,
    /// `None` means permissive CORS.
    pub cors_allowed_origins: Option<Vec<String>>,
    /// Overrides the upstream timeout from the AI config when set.
    pub upstream_timeout: Option<Duration>,
    pub metrics_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            rate_limit_per_minute: DEFAULT_RATE_LIMIT_PER_MINUTE,
            rate_limit_sweep_threshold: DEFAULT_RATE_LIMIT_SWEEP_THRESHOLD,
            cors_allowed_origins: None,
            upstream_timeout: None,
            metrics_enabled: false,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            rate_limit_per_minute: parse_positive(env::var(ENV_RATE_LIMIT_PER_MINUTE).ok())
                .unwrap_or(defaults.rate_limit_per_minute),
            rate_limit_sweep_threshold: parse_positive(
                env::var(ENV_RATE_LIMIT_SWEEP_THRESHOLD).ok(),
            )
            .unwrap_or(defaults.rate_limit_sweep_threshold),
            cors_allowed_origins: parse_origins(env::var(ENV_CORS_ALLOWED_ORIGINS).ok()),
            upstream_timeout: parse_positive(env::var(ENV_UPSTREAM_TIMEOUT_SECS).ok())
                .map(|s| Duration::from_secs(s as u64)),
            metrics_enabled: env::var(ENV_METRICS_ENABLED)
                .map(|v| matches!(v.trim(), "1" | "true" | "TRUE" | "yes"))
                .unwrap_or(false),
        }
    }
}

fn parse_positive(raw: Option<String>) -> Option<usize> {
    raw.and_then(|s| s.trim().parse::<usize>().ok())
        .filter(|v| *v > 0)
}

fn parse_origins(raw: Option<String>) -> Option<Vec<String>> {
    let list: Vec<String> = raw?
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if list.is_empty() {
        None
    } else {
        Some(list)
    }
}
