// src/api.rs
//! HTTP surface: validation, rate limiting, CORS, request logging and the
//! mapping from generation errors to status codes.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use metrics::counter;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::error::GenerationError;
use crate::gateway::ProviderGateway;
use crate::ideas::IdeaRecord;
use crate::metrics::Metrics;
use crate::rate_limit::{RateDecision, RateLimiter};
use crate::telemetry::anon_hash;

pub const MAX_BUSINESS_TYPE_CHARS: usize = 100;

#[derive(Clone)]
pub struct AppState {
    /// `None` when no provider could be configured at startup.
    pub gateway: Option<Arc<ProviderGateway>>,
    pub limiter: Arc<RateLimiter>,
}

pub fn create_router(state: AppState, server: &ServerConfig) -> Router {
    let generate = Router::new()
        .route("/api/generate-ideas", post(generate_ideas))
        .route_layer(middleware::from_fn_with_state(
            state.limiter.clone(),
            rate_limit,
        ));

    let mut router: Router<AppState> = Router::new()
        .route("/health", get(|| async { "OK" }))
        .merge(generate);

    if server.metrics_enabled {
        router = router.merge(Metrics::init().router::<AppState>());
    }

    router
        .layer(middleware::from_fn(log_requests))
        .layer(cors_layer(server.cors_allowed_origins.as_deref()))
        .with_state(state)
}

fn cors_layer(origins: Option<&[String]>) -> CorsLayer {
    let Some(origins) = origins else {
        return CorsLayer::very_permissive();
    };
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateReq {
    #[serde(default)]
    business_type: Option<String>,
}

#[derive(Serialize)]
struct GenerateResp {
    ideas: Vec<IdeaRecord>,
    provider: &'static str,
}

async fn generate_ideas(
    State(state): State<AppState>,
    payload: Result<Json<GenerateReq>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(p) => p,
        Err(rej) => {
            warn!(error = %rej, "rejected request body");
            return error_response(
                StatusCode::BAD_REQUEST,
                "Request body must be JSON with a businessType string",
            );
        }
    };

    let business_type = match validate_business_type(req.business_type.as_deref()) {
        Ok(b) => b,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, msg),
    };

    let Some(gateway) = state.gateway.as_ref() else {
        return error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "AI service is not configured",
        );
    };

    match gateway.generate_ideas(business_type).await {
        Ok(ideas) => Json(GenerateResp {
            ideas,
            provider: gateway.provider_id(),
        })
        .into_response(),
        Err(e) => {
            let (status, msg) = public_error(&e);
            error_response(status, msg)
        }
    }
}

/// Trimmed, non-empty, at most [`MAX_BUSINESS_TYPE_CHARS`] characters.
pub fn validate_business_type(raw: Option<&str>) -> Result<&str, &'static str> {
    let value = raw.map(str::trim).unwrap_or_default();
    if value.is_empty() {
        return Err("businessType is required");
    }
    if value.chars().count() > MAX_BUSINESS_TYPE_CHARS {
        return Err("businessType must be at most 100 characters");
    }
    Ok(value)
}

/// Caller-facing status and message. Details stay in the logs.
fn public_error(e: &GenerationError) -> (StatusCode, &'static str) {
    match e {
        GenerationError::Configuration(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            "AI service is not configured",
        ),
        GenerationError::UpstreamUnavailable { .. }
        | GenerationError::EmptyResponse { .. }
        | GenerationError::MalformedOutput(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to generate content ideas. Please try again.",
        ),
    }
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    (status, Json(json!({ "error": msg }))).into_response()
}

async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request,
    next: Next,
) -> Response {
    let key = client_key(&req);
    match limiter.check(&key) {
        RateDecision::Allowed { .. } => next.run(req).await,
        RateDecision::Limited { retry_after } => {
            counter!("ideas_rate_limited_total").increment(1);
            warn!(client = %anon_hash(&key), "rate limit exceeded");
            let mut resp = error_response(
                StatusCode::TOO_MANY_REQUESTS,
                "Too many requests, please try again later.",
            );
            resp.headers_mut().insert(
                header::RETRY_AFTER,
                HeaderValue::from(retry_after.as_secs().max(1)),
            );
            resp
        }
    }
}

/// Rightmost `X-Forwarded-For` hop, else `"unknown"`.
///
/// The fronting proxy appends the address it saw, so earlier hops are
/// client-supplied and never used as the key. Shuttle serves the router
/// without connect info, so there is no socket peer to fall back on.
fn client_key(req: &Request) -> String {
    req.headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.rsplit(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map_or_else(|| "unknown".to_string(), str::to_string)
}

async fn log_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();
    let resp = next.run(req).await;
    info!(
        %method,
        %path,
        status = resp.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request"
    );
    resp
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_type_validation() {
        assert_eq!(validate_business_type(Some("  bakery ")), Ok("bakery"));
        assert!(validate_business_type(None).is_err());
        assert!(validate_business_type(Some("   ")).is_err());
        let hundred = "é".repeat(100);
        assert_eq!(validate_business_type(Some(hundred.as_str())), Ok(hundred.as_str()));
        assert!(validate_business_type(Some("a".repeat(101).as_str())).is_err());
    }

    #[test]
    fn status_mapping() {
        let cfg = GenerationError::Configuration("unsupported AI provider: x".into());
        assert_eq!(public_error(&cfg).0, StatusCode::SERVICE_UNAVAILABLE);
        let up = GenerationError::EmptyResponse { provider: "Gemini" };
        assert_eq!(public_error(&up).0, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn client_key_uses_proxy_appended_hop() {
        let req = axum::http::Request::builder()
            .header("x-forwarded-for", "10.0.0.1, 203.0.113.7")
            .body(axum::body::Body::empty())
            .unwrap();
        assert_eq!(client_key(&req), "203.0.113.7");

        let req = axum::http::Request::builder()
            .header("x-forwarded-for", " 198.51.100.4 ")
            .body(axum::body::Body::empty())
            .unwrap();
        assert_eq!(client_key(&req), "198.51.100.4");

        let req = axum::http::Request::builder()
            .body(axum::body::Body::empty())
            .unwrap();
        assert_eq!(client_key(&req), "unknown");
    }
}
