//! Library entrypoint: re‑export modules

pub mod config;
pub mod errors;
pub mod feed;
pub mod fetcher;
pub mod metrics;
pub mod normalize;
pub mod pipeline;
pub mod population;
pub mod writers;
