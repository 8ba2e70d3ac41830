//! pipeline.rs
//!
//! The two batch stages: metrics (fetch all five sources, normalize, write
//! three files) and the article feed. Nothing is written until every fetch
//! of a stage has succeeded.

use crate::config::Settings;
use crate::errors::MetricsError;
use crate::feed::fetch_articles;
use crate::fetcher::{Fetcher, METRIC_QUERIES};
use crate::normalize::{normalize, MetricRecord, RawRecord};
use crate::population::PopulationFilter;
use crate::writers::{write_articles_yaml, write_metrics_json, write_metrics_tsv, write_metrics_yaml};
use std::path::{Path, PathBuf};
use tracing::info;

/// Fetch the catalogue metrics and population, one request at a time,
/// and return the ordered records.
pub async fn collect_metrics(fetcher: &Fetcher, settings: &Settings) -> Result<Vec<MetricRecord>, MetricsError> {
    let mut responses: Vec<(&str, Vec<RawRecord>)> = Vec::with_capacity(METRIC_QUERIES.len());
    for query in &METRIC_QUERIES {
        let rows = fetcher.fetch_metric(&settings.api_base_url, query).await?;
        responses.push((query.dataset, rows));
    }

    let population = fetcher
        .fetch_population(&settings.population_url, &PopulationFilter::default())
        .await?;

    normalize(
        &population,
        responses.iter().map(|(dataset, rows)| (*dataset, rows.as_slice())),
    )
}

/// Write the TSV, grid YAML and grid JSON files.
pub fn write_metrics(dir: &Path, records: &[MetricRecord]) -> Result<Vec<PathBuf>, MetricsError> {
    Ok(vec![
        write_metrics_tsv(dir, records)?,
        write_metrics_yaml(dir, records)?,
        write_metrics_json(dir, records)?,
    ])
}

pub async fn process_metrics(fetcher: &Fetcher, settings: &Settings) -> Result<Vec<MetricRecord>, MetricsError> {
    let records = collect_metrics(fetcher, settings).await?;
    write_metrics(&settings.output_dir, &records)?;
    info!(records = records.len(), "Metrics stage complete");
    Ok(records)
}

pub async fn process_feed(fetcher: &Fetcher, settings: &Settings) -> Result<PathBuf, MetricsError> {
    let articles = fetch_articles(fetcher, &settings.rss_url).await?;
    write_articles_yaml(&settings.output_dir, &articles)
}
