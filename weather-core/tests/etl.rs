//! Whole pipeline against a mock provider and an in-memory store.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use weather_etl_core::{
    ApiConfig, CityOutcome, FetchError, LoadError, OpenWeatherProvider, Pipeline, PipelineError,
    PipelineState, WeatherRecord, WeatherStore,
};
use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Default)]
struct RecordingStore {
    rows: Mutex<Vec<WeatherRecord>>,
}

#[async_trait]
impl WeatherStore for RecordingStore {
    async fn ensure_schema(&self) -> Result<(), LoadError> {
        Ok(())
    }

    async fn insert(&self, record: &WeatherRecord) -> Result<(), LoadError> {
        self.rows.lock().unwrap().push(record.clone());
        Ok(())
    }
}

fn observation(city: &str, temp_k: f64) -> serde_json::Value {
    json!({
        "dt": 1700000000,
        "name": city,
        "coord": { "lat": 13.5, "lon": 2.1 },
        "weather": [{ "main": "Clear", "description": "clear sky" }],
        "main": {
            "temp": temp_k,
            "feels_like": 299.0,
            "temp_min": 298.0,
            "temp_max": 302.0,
            "pressure": 1012,
            "humidity": 40
        },
        "wind": { "speed": 3.2, "deg": 180 },
        "sys": { "sunrise": 1699960000, "sunset": 1700000500 }
    })
}

async fn mock_city(server: &MockServer, city: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(query_param("q", city))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn one_bad_city_does_not_stop_the_rest() {
    let server = MockServer::start().await;
    mock_city(&server, "Niamey", ResponseTemplate::new(200).set_body_json(observation("Niamey", 300.0))).await;
    mock_city(&server, "Atlantis", ResponseTemplate::new(404).set_body_string("city not found")).await;
    mock_city(&server, "Agadez", ResponseTemplate::new(200).set_body_json(observation("Agadez", 310.0))).await;

    let source = OpenWeatherProvider::new(ApiConfig {
        api_key: Some("KEY".into()),
        base_url: format!("{}/data/2.5/weather", server.uri()),
        timeout: Duration::from_secs(2),
    })
    .unwrap();
    let pipeline = Pipeline::new(source, RecordingStore::default());

    let summary = pipeline.run(["Niamey", "Atlantis", "Agadez"]).await;

    assert_eq!(summary.stored(), 2);
    assert!(matches!(
        summary.reports[1].outcome,
        CityOutcome::Aborted {
            reached: PipelineState::Start,
            error: PipelineError::Fetch(FetchError::Remote { status: 404, .. }),
        }
    ));

    let rows = pipeline.store().rows.lock().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].city_name, "Niamey");
    assert_eq!(rows[0].temperature_c, 26.85);
    assert_eq!(rows[0].feels_like_c, 25.85);
    assert_eq!(rows[0].humidity_pct, 40);
    assert_eq!(rows[0].visibility_m, None);
    assert_eq!(rows[1].city_name, "Agadez");
    assert_eq!(rows[1].temperature_c, 36.85);
}

#[tokio::test]
async fn missing_credential_aborts_every_city_before_the_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let source = OpenWeatherProvider::new(ApiConfig {
        api_key: None,
        base_url: format!("{}/data/2.5/weather", server.uri()),
        timeout: Duration::from_secs(2),
    })
    .unwrap();
    let pipeline = Pipeline::new(source, RecordingStore::default());

    let summary = pipeline.run(["Niamey", "Zinder"]).await;

    assert_eq!(summary.aborted(), 2);
    assert!(pipeline.store().rows.lock().unwrap().is_empty());
}
