use async_trait::async_trait;
use std::fmt::Debug;
use tracing::{error, info};

use crate::{error::LoadError, model::WeatherRecord};

pub mod postgres;

pub use postgres::PostgresStore;

/// What [`WeatherStore::store`] did with its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    Inserted,
    /// Nothing to write; not an error.
    Skipped,
}

/// The load stage.
#[async_trait]
pub trait WeatherStore: Send + Sync + Debug {
    /// Create the destination table if it is absent. Safe to call repeatedly.
    async fn ensure_schema(&self) -> Result<(), LoadError>;

    /// Append exactly one row. Never upserts.
    async fn insert(&self, record: &WeatherRecord) -> Result<(), LoadError>;

    async fn store(&self, record: Option<&WeatherRecord>) -> Result<StoreOutcome, LoadError> {
        let Some(record) = record else {
            info!("no data to load");
            return Ok(StoreOutcome::Skipped);
        };

        match self.insert(record).await {
            Ok(()) => {
                info!(city = %record.city_name, "data inserted successfully");
                Ok(StoreOutcome::Inserted)
            }
            Err(err) => {
                error!(city = %record.city_name, error = %err, "failed to insert weather data");
                Err(err)
            }
        }
    }
}
