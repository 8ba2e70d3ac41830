//! fetcher.rs
//!
//! Remote data access: the four data catalogue queries, the population
//! parquet file and the raw bytes behind the RSS feed.

use crate::errors::MetricsError;
use crate::metrics::{FETCH_COUNTER, FETCH_HISTOGRAM};
use crate::normalize::RawRecord;
use crate::population::{latest_population, PopulationFilter, PopulationRecord};
use bytes::Bytes;
use reqwest::Client;
use std::time::Instant;
use tracing::info;
use url::Url;

/// Fixed query against the data catalogue for one headline metric.
#[derive(Debug, Clone, Copy)]
pub struct MetricQuery {
    /// Display name carried through to every output file
    pub dataset: &'static str,
    pub params: &'static [(&'static str, &'static str)],
}

pub const GDP_GROWTH: MetricQuery = MetricQuery {
    dataset: "GDP growth",
    params: &[
        ("id", "gdp_state_real_supply"),
        ("sort", "-date"),
        ("ifilter", "pulau pinang@state"),
        ("filter", "p0@sector"),
        ("contains", "growth_yoy@series"),
        ("limit", "1"),
        ("include", "date,value"),
    ],
};

pub const HOUSEHOLD_INCOME: MetricQuery = MetricQuery {
    dataset: "Median gross household income",
    params: &[
        ("id", "hh_income_state"),
        ("sort", "-date"),
        ("ifilter", "pulau pinang@state"),
        ("include", "date,income_median"),
        ("limit", "1"),
    ],
};

pub const CPI_INFLATION: MetricQuery = MetricQuery {
    dataset: "CPI inflation, year-on-year",
    params: &[
        ("id", "cpi_state_inflation"),
        ("sort", "-date"),
        ("ifilter", "pulau pinang@state"),
        ("filter", "overall@division"),
        ("include", "date,inflation_yoy"),
        ("limit", "1"),
    ],
};

pub const UNEMPLOYMENT: MetricQuery = MetricQuery {
    dataset: "Unemployment rate",
    params: &[
        ("id", "lfs_qtr_state"),
        ("sort", "-date"),
        ("ifilter", "pulau pinang@state"),
        ("include", "date,u_rate"),
        ("limit", "1"),
    ],
};

/// The catalogue metrics in output order.
pub const METRIC_QUERIES: [MetricQuery; 4] = [GDP_GROWTH, HOUSEHOLD_INCOME, CPI_INFLATION, UNEMPLOYMENT];

/// Build the full request URL for a metric query.
pub fn query_url(base: &str, query: &MetricQuery) -> Result<Url, MetricsError> {
    Url::parse_with_params(base, query.params.iter()).map_err(|e| MetricsError::Url(base.to_string(), e))
}

/// Thin wrapper around a shared `reqwest::Client`.
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(user_agent: &str) -> Result<Self, MetricsError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| MetricsError::Fetch("<client>".to_string(), e))?;
        Ok(Fetcher { client })
    }

    /// GET `url` and return the body. Non-2xx statuses are errors.
    pub async fn fetch_bytes(&self, url: &str) -> Result<Bytes, MetricsError> {
        FETCH_COUNTER.inc();
        let start = Instant::now();

        let bytes = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| MetricsError::Fetch(url.to_string(), e))?
            .bytes()
            .await
            .map_err(|e| MetricsError::Fetch(url.to_string(), e))?;

        let elapsed = start.elapsed().as_secs_f64();
        FETCH_HISTOGRAM.observe(elapsed);
        info!(url, bytes = bytes.len(), duration_s = elapsed, "Fetched source");

        Ok(bytes)
    }

    /// Run one catalogue query and decode its JSON array response.
    pub async fn fetch_metric(&self, base: &str, query: &MetricQuery) -> Result<Vec<RawRecord>, MetricsError> {
        let url = query_url(base, query)?;
        let body = self.fetch_bytes(url.as_str()).await?;
        let rows: Vec<RawRecord> =
            serde_json::from_slice(&body).map_err(|e| MetricsError::Decode(url.to_string(), e))?;

        info!(dataset = query.dataset, rows = rows.len(), "Fetched metric");
        Ok(rows)
    }

    /// Download the population parquet file and select the latest matching row.
    pub async fn fetch_population(
        &self,
        url: &str,
        filter: &PopulationFilter,
    ) -> Result<PopulationRecord, MetricsError> {
        let body = self.fetch_bytes(url).await?;
        let record = latest_population(url, body, filter)?;

        info!(state = %filter.state, date = %record.date, population = record.population, "Fetched population");
        Ok(record)
    }
}
