//! Core library for the weather ETL job.
//!
//! This crate defines:
//! - Configuration (environment and optional `config.toml`)
//! - The extract stage: [`WeatherSource`] and the OpenWeather client
//! - The transform stage: [`transform()`] from raw payload to [`WeatherRecord`]
//! - The load stage: [`WeatherStore`] and the Postgres implementation
//! - [`Pipeline`], which chains the three per city
//!
//! The `weather-etl` binary wires these together.

pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod provider;
pub mod store;
pub mod transform;

pub use config::{ApiConfig, DatabaseConfig, EtlConfig};
pub use error::{ConfigError, FetchError, LoadError, PipelineError, TransformError};
pub use model::{RawObservation, WeatherRecord};
pub use pipeline::{CityOutcome, CityReport, Pipeline, PipelineState, RunSummary};
pub use provider::{OpenWeatherProvider, WeatherSource};
pub use store::{PostgresStore, StoreOutcome, WeatherStore};
pub use transform::{kelvin_to_celsius, transform};
