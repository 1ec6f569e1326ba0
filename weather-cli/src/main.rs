//! Binary crate for the `weather-etl` job.
//!
//! This crate focuses on:
//! - Installing the log subscriber
//! - Loading `.env` and configuration once at startup
//! - Running the pipeline over the fixed city list

use anyhow::Context;
use tracing::{info, warn};
use weather_etl_core::{EtlConfig, OpenWeatherProvider, Pipeline, PostgresStore};

mod cities;
mod logging;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Before the logger, so RUST_LOG may come from `.env` too.
    let dotenv = weather_etl_core::config::load_dotenv();
    logging::init_logger();
    match dotenv {
        Ok(Some(path)) => info!(path = %path.display(), "loaded environment file"),
        Ok(None) => {}
        Err(e) => warn!(error = %e, "failed to read .env file"),
    }

    let config = EtlConfig::load().context("Failed to load configuration; check your environment")?;

    let source = OpenWeatherProvider::new(config.api.clone())
        .context("Failed to build the OpenWeather HTTP client")?;
    let store = PostgresStore::new(&config.database);
    let pipeline = Pipeline::new(source, store);

    let summary = pipeline.run(cities::NIGER_CITIES).await;

    info!(
        stored = summary.stored(),
        aborted = summary.aborted(),
        "all ETL processes finished for Niger cities"
    );

    Ok(())
}
