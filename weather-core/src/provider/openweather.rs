use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, error};

use crate::{config::ApiConfig, error::FetchError, model::RawObservation};

use super::WeatherSource;

/// Current-weather client for the OpenWeather `data/2.5/weather` endpoint.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    config: ApiConfig,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(config: ApiConfig) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(FetchError::from_reqwest)?;

        Ok(Self { config, http })
    }

    async fn fetch_current(&self, city: &str) -> Result<RawObservation, FetchError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(FetchError::Configuration)?;

        debug!(city, url = %self.config.base_url, "requesting current weather");

        let res = self
            .http
            .get(&self.config.base_url)
            .query(&[("q", city), ("appid", api_key)])
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status = res.status();
        let body = res.text().await.map_err(FetchError::from_reqwest)?;

        if !status.is_success() {
            return Err(FetchError::Remote {
                status: status.as_u16(),
                body,
            });
        }

        let value: Value = serde_json::from_str(&body)
            .map_err(|e| FetchError::Unknown(format!("response is not valid JSON: {e}")))?;

        Ok(RawObservation::new(value))
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherProvider {
    async fn fetch(&self, city: &str) -> Result<RawObservation, FetchError> {
        self.fetch_current(city)
            .await
            .inspect_err(|err| log_fetch_failure(city, err))
    }
}

fn log_fetch_failure(city: &str, err: &FetchError) {
    match err {
        FetchError::Configuration => error!(
            city,
            "OPENWEATHER_API_KEY not found in environment variables; check your configuration"
        ),
        FetchError::Remote { status, body } => error!(
            city,
            status,
            body = %truncate_body(body),
            "error fetching data: HTTP error"
        ),
        FetchError::Transport(e) => error!(city, error = %e, "error fetching data: connection error"),
        FetchError::Timeout(e) => error!(city, error = %e, "error fetching data: timeout"),
        FetchError::Unknown(e) => {
            error!(city, error = %e, "an unexpected error occurred while fetching data")
        }
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
