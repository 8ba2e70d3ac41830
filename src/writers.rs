//! writers.rs
//!
//! Serializers for the normalized metrics and the feed articles. Every
//! writer creates the output directory on demand and overwrites its file.

use crate::errors::MetricsError;
use crate::feed::ArticleRecord;
use crate::normalize::MetricRecord;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

pub const METRICS_TSV: &str = "metrics.tsv";
pub const METRICS_GRID_YAML: &str = "metrics_grid.yaml";
pub const METRICS_GRID_JSON: &str = "metrics_grid.json";
pub const ARTICLES_YAML: &str = "penang-monthly-stats.yaml";

/// Dataset name → dashboard page linked from the grid.
const DASHBOARD_PATHS: [(&str, &str); 5] = [
    ("Population", "dashboards/pop.html"),
    ("GDP growth", "dashboards/gdp.html"),
    ("Median gross household income", "dashboards/hhinc.html"),
    ("CPI inflation, year-on-year", "dashboards/cpi.html"),
    ("Unemployment rate", "dashboards/labour.html"),
];

/// Dashboard path for a dataset, or `""` if it has none.
pub fn dashboard_path(dataset: &str) -> &'static str {
    DASHBOARD_PATHS
        .iter()
        .find(|(name, _)| *name == dataset)
        .map(|(_, path)| *path)
        .unwrap_or("")
}

/// Grid card in `metrics_grid.yaml`; fields in sorted key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridCard {
    pub description: String,
    pub path: String,
    pub subtitle: String,
    pub title: String,
}

impl From<&MetricRecord> for GridCard {
    fn from(record: &MetricRecord) -> Self {
        GridCard {
            description: record.dataset.clone(),
            path: dashboard_path(&record.dataset).to_string(),
            subtitle: record.value.clone(),
            title: record.date_format.clone(),
        }
    }
}

/// Entry in `metrics_grid.json`; no dashboard path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridValue {
    pub description: String,
    pub value: String,
    pub date_format: String,
}

impl From<&MetricRecord> for GridValue {
    fn from(record: &MetricRecord) -> Self {
        GridValue {
            description: record.dataset.clone(),
            value: record.value.clone(),
            date_format: record.date_format.clone(),
        }
    }
}

fn create(dir: &Path, name: &str) -> Result<(PathBuf, BufWriter<File>), MetricsError> {
    fs::create_dir_all(dir).map_err(|e| MetricsError::Io(dir.to_path_buf(), e))?;
    let path = dir.join(name);
    let file = File::create(&path).map_err(|e| MetricsError::Io(path.clone(), e))?;
    Ok((path, BufWriter::new(file)))
}

fn finish(path: PathBuf, mut out: BufWriter<File>, count: usize) -> Result<PathBuf, MetricsError> {
    out.flush().map_err(|e| MetricsError::Io(path.clone(), e))?;
    info!(path = %path.display(), records = count, "Wrote output file");
    Ok(path)
}

/// `metrics.tsv`: header row then one tab-joined row per record.
pub fn write_metrics_tsv(dir: &Path, records: &[MetricRecord]) -> Result<PathBuf, MetricsError> {
    let (path, mut out) = create(dir, METRICS_TSV)?;
    let io_err = |e| MetricsError::Io(path.clone(), e);

    writeln!(out, "dataset\tvalue\tdate_format").map_err(io_err)?;
    for r in records {
        writeln!(out, "{}\t{}\t{}", r.dataset, r.value, r.date_format).map_err(io_err)?;
    }
    finish(path, out, records.len())
}

/// `metrics_grid.yaml`: grid cards including the dashboard link.
pub fn write_metrics_yaml(dir: &Path, records: &[MetricRecord]) -> Result<PathBuf, MetricsError> {
    let cards: Vec<GridCard> = records.iter().map(GridCard::from).collect();
    let (path, mut out) = create(dir, METRICS_GRID_YAML)?;
    serde_yaml::to_writer(&mut out, &cards)?;
    finish(path, out, cards.len())
}

/// `metrics_grid.json`: description, value and date only.
pub fn write_metrics_json(dir: &Path, records: &[MetricRecord]) -> Result<PathBuf, MetricsError> {
    let values: Vec<GridValue> = records.iter().map(GridValue::from).collect();
    let (path, mut out) = create(dir, METRICS_GRID_JSON)?;
    serde_json::to_writer(&mut out, &values)?;
    finish(path, out, values.len())
}

/// `penang-monthly-stats.yaml`: the article list as-is.
pub fn write_articles_yaml(dir: &Path, articles: &[ArticleRecord]) -> Result<PathBuf, MetricsError> {
    let (path, mut out) = create(dir, ARTICLES_YAML)?;
    serde_yaml::to_writer(&mut out, articles)?;
    finish(path, out, articles.len())
}
