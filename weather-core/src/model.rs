use chrono::{DateTime, Utc};
use serde_json::Value;

/// Unprocessed provider response for one city.
#[derive(Debug, Clone, PartialEq)]
pub struct RawObservation(Value);

impl RawObservation {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// `true` for `null`, `{}`, `[]` and `""`: there is nothing to extract.
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            Value::Array(items) => items.is_empty(),
            Value::String(s) => s.is_empty(),
            _ => false,
        }
    }
}

/// One normalized observation, ready to become a `weather_table` row.
///
/// Temperatures are degrees Celsius rounded to two decimals. A missing
/// `visibility` stays `None`, it is never coerced to zero.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherRecord {
    pub observed_at: DateTime<Utc>,
    pub city_name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Primary condition group, e.g. "Clear" or "Rain".
    pub condition: String,
    pub description: String,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub min_temperature_c: f64,
    pub max_temperature_c: f64,
    pub pressure_hpa: i32,
    pub humidity_pct: i32,
    pub visibility_m: Option<i32>,
    pub wind_speed_mps: f64,
    pub wind_deg: i32,
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
}
