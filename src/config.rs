//! Type-safe configuration loader using the `config` crate,
//! with manual environment-variable overrides for the source URLs.
//!
//! Every field has a default pointing at the production sources, so the
//! binary runs without any `Config.toml` on disk.

use config::{Config, ConfigError, File};
use serde::Deserialize;
use std::{env, path::PathBuf};

/// Application settings loaded from `Config.toml` (optional)
/// and then overridden (where applicable) by environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Base URL of the OpenDOSM data catalogue API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Location of the state population parquet file
    #[serde(default = "default_population_url")]
    pub population_url: String,

    /// Penang Monthly statistics RSS feed
    #[serde(default = "default_rss_url")]
    pub rss_url: String,

    /// Directory every output file is written into
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// User-agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_api_base_url() -> String {
    "https://api.data.gov.my/data-catalogue".to_string()
}

fn default_population_url() -> String {
    "https://storage.dosm.gov.my/population/population_state.parquet".to_string()
}

fn default_rss_url() -> String {
    "https://www.penangmonthly.com/tag/statistics/rss".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            api_base_url: default_api_base_url(),
            population_url: default_population_url(),
            rss_url: default_rss_url(),
            output_dir: default_output_dir(),
            user_agent: default_user_agent(),
        }
    }
}

impl Settings {
    /// Load settings from `Config.toml` (if present),
    /// then apply any overrides from these environment variables:
    ///
    /// - `APP__API_BASE_URL`
    /// - `APP__POPULATION_URL`
    /// - `APP__RSS_URL`
    /// - `APP__OUTPUT_DIR`
    pub fn new() -> Result<Self, ConfigError> {
        let cfg = Config::builder()
            .add_source(File::with_name("Config").required(false))
            .build()?;

        let mut settings: Settings = cfg.try_deserialize()?;
        settings.apply_overrides(|key| env::var(key).ok());
        Ok(settings)
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("APP__API_BASE_URL") {
            self.api_base_url = val;
        }
        if let Some(val) = lookup("APP__POPULATION_URL") {
            self.population_url = val;
        }
        if let Some(val) = lookup("APP__RSS_URL") {
            self.rss_url = val;
        }
        if let Some(val) = lookup("APP__OUTPUT_DIR") {
            self.output_dir = PathBuf::from(val);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn empty_source_yields_production_defaults() {
        let cfg = Config::builder()
            .add_source(File::from_str("", FileFormat::Toml))
            .build()
            .unwrap();
        let settings: Settings = cfg.try_deserialize().unwrap();

        assert_eq!(settings.api_base_url, "https://api.data.gov.my/data-catalogue");
        assert_eq!(settings.output_dir, PathBuf::from("output"));
        assert!(settings.population_url.ends_with("population_state.parquet"));
    }

    #[test]
    fn toml_values_override_defaults() {
        let cfg = Config::builder()
            .add_source(File::from_str(
                "rss_url = \"http://localhost/rss\"\noutput_dir = \"build\"",
                FileFormat::Toml,
            ))
            .build()
            .unwrap();
        let settings: Settings = cfg.try_deserialize().unwrap();

        assert_eq!(settings.rss_url, "http://localhost/rss");
        assert_eq!(settings.output_dir, PathBuf::from("build"));
        assert_eq!(settings.api_base_url, default_api_base_url());
    }

    #[test]
    fn env_style_overrides_win() {
        let mut settings = Settings::default();
        settings.apply_overrides(|key| match key {
            "APP__OUTPUT_DIR" => Some("/tmp/out".to_string()),
            "APP__API_BASE_URL" => Some("http://127.0.0.1:9000/api".to_string()),
            _ => None,
        });

        assert_eq!(settings.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(settings.api_base_url, "http://127.0.0.1:9000/api");
        assert_eq!(settings.rss_url, default_rss_url());
    }
}
