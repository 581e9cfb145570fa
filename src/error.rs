// src/error.rs
//! Classified failures of the idea generation core.

use thiserror::Error;

/// Why model output could not be turned into idea records.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MalformedOutput {
    /// The model ignored the JSON instruction entirely.
    #[error("no JSON found in model response")]
    NoJson,
    /// Something JSON-shaped was found but it does not parse.
    #[error("invalid JSON in model response: {0}")]
    InvalidJson(String),
    #[error("model response is missing the `{0}` array")]
    MissingField(&'static str),
    #[error("no ideas generated")]
    NoIdeas,
}

#[derive(Debug, Error)]
pub enum GenerationError {
    /// Missing credential or unknown provider identifier. Not retryable.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// The provider client call itself failed (network, auth, provider-side limits).
    #[error("{provider} API error: {message}")]
    UpstreamUnavailable {
        provider: &'static str,
        message: String,
    },
    #[error("no response received from {provider} model")]
    EmptyResponse { provider: &'static str },
    #[error(transparent)]
    MalformedOutput(#[from] MalformedOutput),
}

impl GenerationError {
    /// Stable label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationError::Configuration(_) => "configuration",
            GenerationError::UpstreamUnavailable { .. } => "upstream_unavailable",
            GenerationError::EmptyResponse { .. } => "empty_response",
            GenerationError::MalformedOutput(_) => "malformed_output",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_message_names_provider_and_cause() {
        let e = GenerationError::UpstreamUnavailable {
            provider: "Gemini",
            message: "API Timeout".into(),
        };
        assert_eq!(e.to_string(), "Gemini API error: API Timeout");
        assert_eq!(e.kind(), "upstream_unavailable");
    }

    #[test]
    fn malformed_output_is_transparent() {
        let e: GenerationError = MalformedOutput::MissingField("ideas").into();
        assert_eq!(e.to_string(), "model response is missing the `ideas` array");
        assert_eq!(e.kind(), "malformed_output");
    }
}
