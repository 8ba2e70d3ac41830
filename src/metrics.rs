//! Run counters for a single batch invocation.
//!
//! Nothing scrapes a one-shot process, so the registry is rendered once at the
//! end of `main` and logged at `debug`.

use once_cell::sync::Lazy;
use prometheus::{
    histogram_opts, register_histogram_with_registry, register_int_counter_with_registry, Encoder,
    Histogram, IntCounter, Registry, TextEncoder,
};

/// Download sizes range from a one-row JSON reply to the full population
/// parquet file, hence the wide buckets.
const FETCH_BUCKETS: &[f64] = &[0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0];

pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    Registry::new_custom(Some("penang_metrics".into()), None)
        .expect("failed to create Prometheus registry")
});

/// Source requests issued: catalogue queries, parquet download, RSS.
pub static FETCH_COUNTER: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter_with_registry!(
        "sources_fetched_total",
        "Source requests issued during the run",
        REGISTRY
    )
    .expect("register sources_fetched_total")
});

pub static FETCH_HISTOGRAM: Lazy<Histogram> = Lazy::new(|| {
    register_histogram_with_registry!(
        histogram_opts!(
            "fetch_duration_seconds",
            "Time from request to fully received body",
            FETCH_BUCKETS.to_vec()
        ),
        REGISTRY
    )
    .expect("register fetch_duration_seconds")
});

/// Feed items dropped because no category carried a month and year.
pub static ARTICLES_SKIPPED: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter_with_registry!(
        "articles_skipped_total",
        "Feed items without a parseable month category",
        REGISTRY
    )
    .expect("register articles_skipped_total")
});

/// Render the registry in the text exposition format.
pub fn render() -> Result<String, prometheus::Error> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
