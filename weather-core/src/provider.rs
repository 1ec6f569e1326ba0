use async_trait::async_trait;
use std::fmt::Debug;

use crate::{error::FetchError, model::RawObservation};

pub mod openweather;

pub use openweather::OpenWeatherProvider;

/// The extract stage: anything that can hand back a raw observation for a
/// city name.
#[async_trait]
pub trait WeatherSource: Send + Sync + Debug {
    async fn fetch(&self, city: &str) -> Result<RawObservation, FetchError>;
}
