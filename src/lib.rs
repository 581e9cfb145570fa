// src/lib.rs
//! Social post idea generator: a business type in, six structured content
//! ideas out, generated by Gemini or OpenAI and normalized into a fixed shape.

pub mod api;
pub mod config;
pub mod error;
pub mod gateway;
pub mod ideas;
pub mod metrics;
pub mod normalize;
pub mod prompt;
pub mod rate_limit;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::error::{GenerationError, MalformedOutput};
pub use crate::gateway::{GatewayClients, ProviderGateway};
pub use crate::ideas::IdeaRecord;
pub use crate::normalize::parse_response;
pub use crate::prompt::build_prompt;

use std::sync::Arc;

use axum::Router;
use tracing::{error, info};

use crate::api::AppState;
use crate::config::{ProviderConfig, ServerConfig};
use crate::rate_limit::RateLimiter;

/// Assemble shared state. A gateway that fails to build (e.g. missing key)
/// is logged and left out; the API then answers 503 instead of refusing to boot.
pub fn build_state(ai: ProviderConfig, server: &ServerConfig) -> AppState {
    let ai = match server.upstream_timeout {
        Some(timeout) => ai.with_timeout(timeout),
        None => ai,
    };

    let gateway = match ProviderGateway::new(ai) {
        Ok(g) => Some(Arc::new(g)),
        Err(e) => {
            error!(error = %e, "idea generation disabled");
            None
        }
    };

    AppState {
        gateway,
        limiter: Arc::new(RateLimiter::per_minute(
            server.rate_limit_per_minute,
            server.rate_limit_sweep_threshold,
        )),
    }
}

/// Build the full router from process configuration (env / `.env` / `$AI_CONFIG_PATH`).
pub async fn app() -> anyhow::Result<Router> {
    let server = ServerConfig::from_env();
    let ai = ProviderConfig::from_env()?;
    info!(
        provider = %ai.provider,
        key_len = ai.api_key.len(),
        rate_limit = server.rate_limit_per_minute,
        metrics = server.metrics_enabled,
        "configuration loaded"
    );
    let state = build_state(ai, &server);
    Ok(api::create_router(state, &server))
}
