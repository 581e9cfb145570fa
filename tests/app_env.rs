// tests/app_env.rs
//
// Full app() assembly from environment variables, including /metrics.

use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

fn clear_ai_env() {
    for k in [
        "AI_CONFIG_PATH",
        "AI_PROVIDER",
        "GEMINI_API_KEY",
        "OPENAI_API_KEY",
        "UPSTREAM_TIMEOUT_SECS",
    ] {
        std::env::remove_var(k);
    }
}

#[serial_test::serial]
#[tokio::test]
async fn missing_key_boots_but_answers_503() {
    clear_ai_env();
    let app = post_idea_generator::app()
        .await
        .expect("app() should build without a key");

    let req = Request::post("/api/generate-ideas")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"businessType":"florist"}"#))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[serial_test::serial]
#[tokio::test]
async fn metrics_endpoint_lists_rate_limited_series() {
    clear_ai_env();
    std::env::set_var("METRICS_ENABLED", "1");
    std::env::set_var("RATE_LIMIT_PER_MINUTE", "1");
    std::env::set_var("AI_PROVIDER", "openai");
    std::env::set_var("OPENAI_API_KEY", "sk-test");
    let app = post_idea_generator::app()
        .await
        .expect("app() should build Router in tests");
    std::env::remove_var("METRICS_ENABLED");
    std::env::remove_var("RATE_LIMIT_PER_MINUTE");
    clear_ai_env();

    // Empty business types never reach the upstream; the second one trips the limiter.
    let mut statuses = Vec::new();
    for _ in 0..2 {
        let resp = app
            .clone()
            .oneshot(
                Request::post("/api/generate-ideas")
                    .header("content-type", "application/json")
                    .header("x-forwarded-for", "192.0.2.1")
                    .body(Body::from(r#"{"businessType":""}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        statuses.push(resp.status());
    }
    assert_eq!(
        statuses,
        vec![StatusCode::BAD_REQUEST, StatusCode::TOO_MANY_REQUESTS]
    );

    let resp = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body::to_bytes(resp.into_body(), 1_048_576).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(
        text.contains("ideas_rate_limited_total"),
        "metrics exposition missing rate limit counter\n{text}"
    );
}

#[serial_test::serial]
#[tokio::test]
async fn metrics_route_absent_by_default() {
    clear_ai_env();
    std::env::remove_var("METRICS_ENABLED");
    let app = post_idea_generator::app().await.unwrap();
    let resp = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
