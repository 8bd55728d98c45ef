use anyhow::{anyhow, Result};
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

#[derive(Clone)]
pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder once per process and describe the catalog series.
    /// Later calls reuse the installed recorder.
    pub fn init() -> Result<Self> {
        let handle = HANDLE.get_or_try_init(|| {
            let handle = PrometheusBuilder::new()
                .install_recorder()
                .map_err(|e| anyhow!("prometheus: install recorder: {e}"))?;
            describe();
            Ok::<_, anyhow::Error>(handle)
        })?;
        Ok(Self {
            handle: handle.clone(),
        })
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
    describe_counter!("catalog_queries_total", "Listing queries computed, by kind.");
    describe_counter!(
        "catalog_empty_results_total",
        "Listing queries with no matching records, by kind."
    );
    describe_histogram!("catalog_compute_ms", "Engine time per listing query in milliseconds.");
    describe_gauge!("catalog_records", "Records held in the current snapshot, by kind.");
    describe_counter!(
        "content_fetch_errors_total",
        "Content source fetch/parse failures, by source."
    );
    describe_histogram!("content_parse_ms", "Content source read+parse time in milliseconds.");
}
