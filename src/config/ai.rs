// src/config/ai.rs
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{env, fs, path::Path};

pub const ENV_AI_CONFIG_PATH: &str = "AI_CONFIG_PATH";
pub const ENV_AI_PROVIDER: &str = "AI_PROVIDER";
pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";

pub const DEFAULT_PROVIDER: &str = "gemini";
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// Known upstream providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
    OpenAi,
}

impl ProviderKind {
    /// Case-insensitive lookup; `None` for anything unrecognized.
    pub fn parse(id: &str) -> Option<Self> {
        match id.trim().to_ascii_lowercase().as_str() {
            "gemini" => Some(Self::Gemini),
            "openai" => Some(Self::OpenAi),
            _ => None,
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAi => "openai",
        }
    }

    /// Human-readable name used in error messages.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Gemini => "Gemini",
            Self::OpenAi => "OpenAI",
        }
    }

    pub fn api_key_env(self) -> &'static str {
        match self {
            Self::Gemini => ENV_GEMINI_API_KEY,
            Self::OpenAi => ENV_OPENAI_API_KEY,
        }
    }
}

/// Provider selection + credential. Fixed for the lifetime of one gateway.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Provider identifier as configured; may be unrecognized, which the
    /// gateway reports on first use.
    pub provider: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl ProviderConfig {
    pub fn new(provider: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            api_key: api_key.into(),
            timeout: DEFAULT_UPSTREAM_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve from `$AI_CONFIG_PATH` when set, otherwise from plain env vars.
    pub fn from_env() -> anyhow::Result<Self> {
        match env::var(ENV_AI_CONFIG_PATH) {
            Ok(path) if !path.trim().is_empty() => Self::load_from_file(path.trim()),
            _ => {
                let provider = env::var(ENV_AI_PROVIDER)
                    .ok()
                    .filter(|p| !p.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_PROVIDER.to_string());
                let api_key = key_from_env(&provider);
                Ok(Self::new(provider.trim().to_ascii_lowercase(), api_key))
            }
        }
    }

    /// JSON file: `{"provider": "gemini", "api_key": "ENV"}`.
    /// `"ENV"` means read the provider's key variable.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading AI config from {}", path.display()))?;
        let file: AiConfigFile = serde_json::from_str(&data)
            .with_context(|| format!("parsing AI config {}", path.display()))?;

        let provider = file.provider.trim().to_ascii_lowercase();
        let api_key = if file.api_key.trim().eq_ignore_ascii_case("env") {
            key_from_env(&provider)
        } else {
            file.api_key
        };

        let mut cfg = Self::new(provider, api_key);
        if let Some(secs) = file.timeout_secs.filter(|s| *s > 0) {
            cfg.timeout = Duration::from_secs(secs);
        }
        Ok(cfg)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AiConfigFile {
    provider: String,
    #[serde(default)]
    api_key: String,
    #[serde(default)]
    timeout_secs: Option<u64>,
}

/// Unknown providers and unset vars yield an empty key; the gateway factory
/// is the one that rejects it.
fn key_from_env(provider: &str) -> String {
    ProviderKind::parse(provider)
        .and_then(|kind| env::var(kind.api_key_env()).ok())
        .map(|k| k.trim().to_string())
        .unwrap_or_default()
}
