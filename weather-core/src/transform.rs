//! Normalize an OpenWeather current-weather payload into a [`WeatherRecord`].
//!
//! The payload is first decoded into the `Ow*` structs below. Every field is
//! optional at that level so a missing key comes back as a
//! [`TransformError::MissingField`] naming its dotted path, while a value of
//! the wrong shape fails the decode and becomes
//! [`TransformError::Unexpected`]. Because decoding covers the whole payload
//! first, a wrongly typed value is reported even when a key is also missing.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, error, warn};

use crate::{
    error::TransformError,
    model::{RawObservation, WeatherRecord},
};

const KELVIN_OFFSET: f64 = 273.15;

#[derive(Debug, Deserialize)]
struct OwCoord {
    lat: Option<f64>,
    lon: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OwCondition {
    main: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: Option<f64>,
    feels_like: Option<f64>,
    temp_min: Option<f64>,
    temp_max: Option<f64>,
    pressure: Option<i32>,
    humidity: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: Option<f64>,
    deg: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    sunrise: Option<i64>,
    sunset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    dt: Option<i64>,
    name: Option<String>,
    coord: Option<OwCoord>,
    weather: Option<Vec<OwCondition>>,
    main: Option<OwMain>,
    visibility: Option<i32>,
    wind: Option<OwWind>,
    sys: Option<OwSys>,
}

/// Celsius from Kelvin, rounded to two decimals.
pub fn kelvin_to_celsius(kelvin: f64) -> f64 {
    round_to_cents(kelvin - KELVIN_OFFSET)
}

/// Round the exact binary value of `value` to two decimals, ties to even.
///
/// Scaling by 100 in floating point would round twice, so the scaled value
/// is computed on the integer mantissa instead.
fn round_to_cents(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }

    let bits = value.to_bits();
    let exp_bits = ((bits >> 52) & 0x7ff) as i32;
    let fraction = bits & ((1u64 << 52) - 1);
    let (mantissa, exp) = if exp_bits == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1u64 << 52), exp_bits - 1075)
    };

    // Integral already.
    if exp >= 0 {
        return value;
    }

    let shift = -exp as u32;
    let scaled = u128::from(mantissa) * 100;
    // `scaled` < 2^60, so anything shifted further is below half a cent.
    let cents = if shift > 64 {
        0
    } else {
        let quotient = scaled >> shift;
        let remainder = scaled & ((1u128 << shift) - 1);
        let half = 1u128 << (shift - 1);
        if remainder > half || (remainder == half && quotient % 2 == 1) {
            quotient + 1
        } else {
            quotient
        }
    };

    (cents as f64 / 100.0).copysign(value)
}

/// Turn a raw observation into a record, or explain why it can't be done.
///
/// `None` and empty payloads short-circuit with [`TransformError::NoData`].
/// No partially filled record is ever returned.
pub fn transform(raw: Option<&RawObservation>) -> Result<WeatherRecord, TransformError> {
    let raw = match raw {
        Some(raw) if !raw.is_empty() => raw,
        _ => {
            warn!("no raw data provided for transformation");
            return Err(TransformError::NoData);
        }
    };

    normalize(raw).inspect_err(|err| {
        match err {
            TransformError::MissingField(key) => {
                error!(key = %key, "missing expected data key during transformation")
            }
            other => error!(error = %other, "unexpected error during data transformation"),
        }
        debug!(raw = %raw.as_value(), "raw payload that failed to transform");
    })
}

fn normalize(raw: &RawObservation) -> Result<WeatherRecord, TransformError> {
    let ow = OwCurrentResponse::deserialize(raw.as_value())
        .map_err(|e| TransformError::Unexpected(e.to_string()))?;

    let observed_at = utc(required(ow.dt, "dt")?, "dt")?;
    let city_name = required(ow.name, "name")?;

    let coord = required(ow.coord, "coord")?;
    let latitude = required(coord.lat, "coord.lat")?;
    let longitude = required(coord.lon, "coord.lon")?;

    let conditions = required(ow.weather, "weather")?;
    let primary = conditions
        .into_iter()
        .next()
        .ok_or_else(|| TransformError::Unexpected("`weather` list is empty".into()))?;
    let condition = required(primary.main, "weather[0].main")?;
    let description = required(primary.description, "weather[0].description")?;

    let main = required(ow.main, "main")?;
    let temperature_c = kelvin_to_celsius(required(main.temp, "main.temp")?);
    let feels_like_c = kelvin_to_celsius(required(main.feels_like, "main.feels_like")?);
    let min_temperature_c = kelvin_to_celsius(required(main.temp_min, "main.temp_min")?);
    let max_temperature_c = kelvin_to_celsius(required(main.temp_max, "main.temp_max")?);
    let pressure_hpa = required(main.pressure, "main.pressure")?;
    let humidity_pct = required(main.humidity, "main.humidity")?;

    let wind = required(ow.wind, "wind")?;
    let wind_speed_mps = required(wind.speed, "wind.speed")?;
    let wind_deg = required(wind.deg, "wind.deg")?;

    let sys = required(ow.sys, "sys")?;
    let sunrise = utc(required(sys.sunrise, "sys.sunrise")?, "sys.sunrise")?;
    let sunset = utc(required(sys.sunset, "sys.sunset")?, "sys.sunset")?;

    Ok(WeatherRecord {
        observed_at,
        city_name,
        latitude,
        longitude,
        condition,
        description,
        temperature_c,
        feels_like_c,
        min_temperature_c,
        max_temperature_c,
        pressure_hpa,
        humidity_pct,
        visibility_m: ow.visibility,
        wind_speed_mps,
        wind_deg,
        sunrise,
        sunset,
    })
}

fn required<T>(value: Option<T>, key: &str) -> Result<T, TransformError> {
    value.ok_or_else(|| TransformError::MissingField(key.to_string()))
}

fn utc(ts: i64, key: &str) -> Result<DateTime<Utc>, TransformError> {
    DateTime::from_timestamp(ts, 0)
        .ok_or_else(|| TransformError::Unexpected(format!("`{key}` timestamp {ts} is out of range")))
}
