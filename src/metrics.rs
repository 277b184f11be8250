use axum::{routing::get, Router};
use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Initialize the Prometheus recorder and describe the request counters.
    pub fn init() -> Self {
        // Use default buckets to avoid API differences across crate versions.
        let builder = PrometheusBuilder::new();

        let handle = builder
            .install_recorder()
            .expect("prometheus: install recorder");

        describe_counter!("predict_requests_total", "Predict requests received");
        describe_counter!("toxic_verdicts_total", "Predict requests judged toxic");

        Self { handle }
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
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

/// Count one predict request and its verdict. No-op when no recorder is
/// installed (unit tests).
pub fn record_predict(is_toxic: bool) {
    counter!("predict_requests_total").increment(1);
    if is_toxic {
        counter!("toxic_verdicts_total").increment(1);
    }
}
