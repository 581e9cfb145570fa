//! Post Idea Generator — Binary Entrypoint
//! Boots the Axum HTTP server on the Shuttle runtime.

use shuttle_axum::ShuttleAxum;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    post_idea_generator::telemetry::init_tracing();

    let router = post_idea_generator::app().await?;
    Ok(router.into())
}
