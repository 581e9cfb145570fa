use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing::warn;

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

#[derive(Clone)]
pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder once per process and describe the series.
    pub fn init() -> Self {
        let handle = HANDLE
            .get_or_init(|| {
                let handle = match PrometheusBuilder::new().install_recorder() {
                    Ok(h) => h,
                    Err(e) => {
                        // Another recorder owns the global slot; keep a detached handle
                        // so /metrics still renders.
                        warn!(error = %e, "prometheus recorder not installed");
                        PrometheusBuilder::new().build_recorder().handle()
                    }
                };
                describe();
                handle
            })
            .clone();
        Self { handle }
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router<S>(&self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

fn describe() {
    describe_counter!(
        "ideas_requests_total",
        "Idea generation attempts, by provider."
    );
    describe_counter!(
        "ideas_errors_total",
        "Failed idea generations, by error kind."
    );
    describe_counter!(
        "ideas_fields_defaulted_total",
        "Idea fields replaced by a placeholder during normalization."
    );
    describe_counter!(
        "ideas_rate_limited_total",
        "Requests rejected by the per-address rate tracker."
    );
    describe_histogram!(
        "ideas_upstream_duration_ms",
        "Upstream provider call + normalization time in milliseconds."
    );
}
