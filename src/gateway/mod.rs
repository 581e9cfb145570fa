// src/gateway/mod.rs
//! Provider gateway: one configured backend, one prompt, one normalized result.
//!
//! Backends are a closed enum and dispatch is a single `match`. The concrete
//! HTTP clients sit behind [`GeminiApi`] / [`OpenAiApi`] so tests can inject
//! canned handles instead of talking to the network.

pub mod gemini;
pub mod openai;

use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use tracing::{info, warn};

use crate::config::{ProviderConfig, ProviderKind};
use crate::error::GenerationError;
use crate::ideas::IdeaRecord;
use crate::normalize::parse_response;
use crate::prompt::build_prompt;
use crate::telemetry::anon_hash;

pub use gemini::{GeminiApi, GeminiClient, GeminiResponse};
pub use openai::{ChatCompletion, OpenAiApi, OpenAiClient};

pub const GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const OPENAI_MODEL: &str = "gpt-4o-mini";

pub(crate) const USER_AGENT: &str = concat!("post-idea-generator/", env!("CARGO_PKG_VERSION"));

/// Sampling parameters sent to either backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

/// Creative enough for varied ideas, low enough to keep the JSON schema.
/// 2048 tokens comfortably fits six entries.
pub const GENERATION_PARAMS: GenerationParams = GenerationParams {
    temperature: 0.8,
    max_output_tokens: 2048,
};

/// Optional pre-built client handles. A supplied handle is used as-is instead
/// of building an HTTP client from the API key.
#[derive(Clone, Default)]
pub struct GatewayClients {
    pub gemini: Option<Arc<dyn GeminiApi>>,
    pub openai: Option<Arc<dyn OpenAiApi>>,
}

enum Backend {
    Gemini(Arc<dyn GeminiApi>),
    OpenAi(Arc<dyn OpenAiApi>),
    /// Reported on every call rather than at construction.
    Unsupported(String),
}

pub struct ProviderGateway {
    backend: Backend,
}

impl ProviderGateway {
    /// Build the gateway with real HTTP clients.
    pub fn new(config: ProviderConfig) -> Result<Self, GenerationError> {
        Self::with_clients(config, GatewayClients::default())
    }

    /// Build the gateway, using injected client handles where given.
    ///
    /// A blank `api_key` is rejected even when the selected client is
    /// injected and would never read it, so a misconfigured deployment
    /// fails the same way with or without test doubles.
    pub fn with_clients(
        config: ProviderConfig,
        clients: GatewayClients,
    ) -> Result<Self, GenerationError> {
        if config.api_key.trim().is_empty() {
            return Err(GenerationError::Configuration(format!(
                "missing API key for provider '{}'",
                config.provider
            )));
        }

        let backend = match ProviderKind::parse(&config.provider) {
            Some(ProviderKind::Gemini) => {
                let client: Arc<dyn GeminiApi> = match clients.gemini {
                    Some(client) => client,
                    None => Arc::new(
                        GeminiClient::new(&config.api_key, config.timeout)
                            .map_err(client_build_error)?,
                    ),
                };
                Backend::Gemini(client)
            }
            Some(ProviderKind::OpenAi) => {
                let client: Arc<dyn OpenAiApi> = match clients.openai {
                    Some(client) => client,
                    None => Arc::new(
                        OpenAiClient::new(&config.api_key, config.timeout)
                            .map_err(client_build_error)?,
                    ),
                };
                Backend::OpenAi(client)
            }
            None => Backend::Unsupported(config.provider.clone()),
        };

        let gateway = Self { backend };
        info!(provider = gateway.provider_id(), "provider gateway ready");
        Ok(gateway)
    }

    /// Identifier of the active backend; `"unsupported"` for unknown ids.
    pub fn provider_id(&self) -> &'static str {
        match &self.backend {
            Backend::Gemini(_) => ProviderKind::Gemini.id(),
            Backend::OpenAi(_) => ProviderKind::OpenAi.id(),
            Backend::Unsupported(_) => "unsupported",
        }
    }

    /// Build the prompt, call the configured provider once, normalize the reply.
    pub async fn generate_ideas(
        &self,
        business_type: &str,
    ) -> Result<Vec<IdeaRecord>, GenerationError> {
        let provider = self.provider_id();
        let id = anon_hash(business_type);
        counter!("ideas_requests_total", "provider" => provider).increment(1);

        let prompt = build_prompt(business_type);
        let started = Instant::now();
        let result = match &self.backend {
            Backend::Gemini(client) => generate_with_gemini(client.as_ref(), &prompt).await,
            Backend::OpenAi(client) => generate_with_openai(client.as_ref(), &prompt).await,
            Backend::Unsupported(other) => Err(GenerationError::Configuration(format!(
                "unsupported AI provider: {other}"
            ))),
        };
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        if !matches!(self.backend, Backend::Unsupported(_)) {
            histogram!("ideas_upstream_duration_ms", "provider" => provider).record(elapsed_ms);
        }

        match &result {
            Ok(ideas) => info!(%id, provider, count = ideas.len(), elapsed_ms, "ideas generated"),
            Err(e) => {
                counter!("ideas_errors_total", "kind" => e.kind()).increment(1);
                warn!(%id, provider, kind = e.kind(), error = %e, elapsed_ms, "idea generation failed");
            }
        }
        result
    }
}

async fn generate_with_gemini(
    client: &dyn GeminiApi,
    prompt: &str,
) -> Result<Vec<IdeaRecord>, GenerationError> {
    let provider = ProviderKind::Gemini.display_name();
    let response = client
        .generate_content(GEMINI_MODEL, prompt, &GENERATION_PARAMS)
        .await
        .map_err(|e| upstream_error(provider, e))?;

    let text = response
        .text
        .filter(|t| !t.trim().is_empty())
        .ok_or(GenerationError::EmptyResponse { provider })?;
    Ok(parse_response(&text)?)
}

async fn generate_with_openai(
    client: &dyn OpenAiApi,
    prompt: &str,
) -> Result<Vec<IdeaRecord>, GenerationError> {
    let provider = ProviderKind::OpenAi.display_name();
    let completion = client
        .create_chat_completion(OPENAI_MODEL, prompt, &GENERATION_PARAMS)
        .await
        .map_err(|e| upstream_error(provider, e))?;

    let text = completion
        .first_content()
        .filter(|t| !t.trim().is_empty())
        .ok_or(GenerationError::EmptyResponse { provider })?;
    Ok(parse_response(text)?)
}

fn upstream_error(provider: &'static str, e: anyhow::Error) -> GenerationError {
    GenerationError::UpstreamUnavailable {
        provider,
        message: format!("{e:#}"),
    }
}

fn client_build_error(e: anyhow::Error) -> GenerationError {
    GenerationError::Configuration(format!("{e:#}"))
}

/// Upstream error bodies can be large; keep the first 300 chars.
pub(crate) fn error_body_snippet(body: &str) -> String {
    body.chars().take(300).collect()
}
