//! Entrypoint: set up tracing, load settings, then run the metrics stage
//! followed by the Penang Monthly feed stage.
//!
//! Settings come from `config.rs` (`Config.toml` is optional):
//!  - `api_base_url`    – OpenDOSM data catalogue endpoint
//!  - `population_url`  – state population parquet file
//!  - `rss_url`         – Penang Monthly statistics feed
//!  - `output_dir`      – where all output files land

use std::time::Instant;

use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use penang_metrics::config::Settings;
use penang_metrics::errors::MetricsError;
use penang_metrics::fetcher::Fetcher;
use penang_metrics::metrics;
use penang_metrics::pipeline::{process_feed, process_metrics};

/// **Workflow**:
/// 1. Initialise tracing/logging from `RUST_LOG`.
/// 2. Load `Config.toml` (and apply any `APP__…` env-var overrides).
/// 3. Fetch, normalize and write the metrics files.
/// 4. Fetch the RSS feed and write the article list.
///
/// Any error aborts the run with a non-zero exit.
#[tokio::main]
async fn main() -> Result<(), MetricsError> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let settings = Settings::new()?;
    info!(?settings, "Loaded configuration");

    let fetcher = Fetcher::new(&settings.user_agent)?;
    let run_start = Instant::now();

    println!("Processing metrics data...");
    process_metrics(&fetcher, &settings).await?;

    println!("Processing Penang Monthly RSS...");
    process_feed(&fetcher, &settings).await?;

    info!(
        duration_s = run_start.elapsed().as_secs_f64(),
        output_dir = %settings.output_dir.display(),
        "Run complete"
    );
    match metrics::render() {
        Ok(text) => debug!(metrics = %text, "Run metrics"),
        Err(e) => warn!(error = %e, "Failed to render run metrics"),
    }

    println!("Done!");
    Ok(())
}
