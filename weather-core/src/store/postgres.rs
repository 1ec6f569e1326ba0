use async_trait::async_trait;
use tokio_postgres::{Client, Config, NoTls};
use tracing::{debug, error, info, warn};

use crate::{config::DatabaseConfig, error::LoadError, model::WeatherRecord};

use super::WeatherStore;

pub const TABLE_NAME: &str = "weather_table";

// Mixed-case column names are quoted so Postgres keeps them as written.
const CREATE_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS weather_table (
    id SERIAL PRIMARY KEY,
    "Datetime" TIMESTAMP,
    "City_name" VARCHAR,
    "Latitude" DOUBLE PRECISION,
    "Longitude" DOUBLE PRECISION,
    main VARCHAR,
    description VARCHAR,
    temperature DOUBLE PRECISION,
    feels_like DOUBLE PRECISION,
    min_temperature DOUBLE PRECISION,
    max_temperature DOUBLE PRECISION,
    pressure INTEGER,
    humidity INTEGER,
    visibility INTEGER,
    wind_speed DOUBLE PRECISION,
    wind_deg INTEGER,
    sunrise TIMESTAMP,
    sunset TIMESTAMP
)"#;

const INSERT_SQL: &str = r#"
INSERT INTO weather_table (
    "Datetime", "City_name", "Latitude", "Longitude", main, description,
    temperature, feels_like, min_temperature, max_temperature,
    pressure, humidity, visibility, wind_speed, wind_deg, sunrise, sunset
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)"#;

/// Writes records into `weather_table`.
///
/// A fresh connection is opened for every operation and dropped when the
/// operation returns, so nothing is held between cities.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    config: Config,
}

impl PostgresStore {
    pub fn new(database: &DatabaseConfig) -> Self {
        Self {
            config: database.to_pg_config(),
        }
    }

    async fn connect(&self) -> Result<Client, tokio_postgres::Error> {
        let (client, connection) = self.config.connect(NoTls).await?;

        // The connection future drives the socket; it finishes once `client` is dropped.
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                warn!(error = %e, "postgres connection closed with error");
            }
        });

        Ok(client)
    }
}

#[async_trait]
impl WeatherStore for PostgresStore {
    async fn ensure_schema(&self) -> Result<(), LoadError> {
        let result = async {
            let client = self.connect().await?;
            client.batch_execute(CREATE_TABLE_SQL).await
        }
        .await;

        match result {
            Ok(()) => {
                info!(table = TABLE_NAME, "table ensured to exist");
                Ok(())
            }
            Err(e) => {
                let err = LoadError::Schema(describe(&e));
                error!(table = TABLE_NAME, error = %err, "error creating table");
                Err(err)
            }
        }
    }

    async fn insert(&self, record: &WeatherRecord) -> Result<(), LoadError> {
        let observed_at = record.observed_at.naive_utc();
        let sunrise = record.sunrise.naive_utc();
        let sunset = record.sunset.naive_utc();

        let mut client = self.connect().await.map_err(store_error)?;

        // Dropping an uncommitted transaction rolls it back.
        let tx = client.transaction().await.map_err(store_error)?;
        let rows = tx
            .execute(
                INSERT_SQL,
                &[
                    &observed_at,
                    &record.city_name,
                    &record.latitude,
                    &record.longitude,
                    &record.condition,
                    &record.description,
                    &record.temperature_c,
                    &record.feels_like_c,
                    &record.min_temperature_c,
                    &record.max_temperature_c,
                    &record.pressure_hpa,
                    &record.humidity_pct,
                    &record.visibility_m,
                    &record.wind_speed_mps,
                    &record.wind_deg,
                    &sunrise,
                    &sunset,
                ],
            )
            .await
            .map_err(store_error)?;
        tx.commit().await.map_err(store_error)?;

        debug!(rows, city = %record.city_name, "insert committed");
        Ok(())
    }
}

fn describe(err: &tokio_postgres::Error) -> String {
    match err.as_db_error() {
        Some(db) => db.to_string(),
        None => err.to_string(),
    }
}

fn store_error(err: tokio_postgres::Error) -> LoadError {
    LoadError::Store(describe(&err))
}
