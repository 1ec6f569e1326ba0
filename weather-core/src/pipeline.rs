//! Per-city extract → transform → load orchestration.
//!
//! Cities run one after another. Each city walks
//! `Start → Fetched → Transformed → SchemaReady → Stored`; the first failing
//! stage aborts that city only and the loop moves on.

use std::fmt;
use tracing::{error, info};

use crate::{
    error::PipelineError,
    provider::WeatherSource,
    store::WeatherStore,
    transform::transform,
};

/// How far a city got through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Start,
    Fetched,
    Transformed,
    SchemaReady,
    Stored,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Start => "start",
            PipelineState::Fetched => "fetched",
            PipelineState::Transformed => "transformed",
            PipelineState::SchemaReady => "schema ready",
            PipelineState::Stored => "stored",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub enum CityOutcome {
    Stored,
    /// `reached` is the last state entered before `error` stopped the run.
    Aborted {
        reached: PipelineState,
        error: PipelineError,
    },
}

impl CityOutcome {
    pub fn is_stored(&self) -> bool {
        matches!(self, CityOutcome::Stored)
    }
}

#[derive(Debug)]
pub struct CityReport {
    pub city: String,
    pub outcome: CityOutcome,
}

/// Outcome of one pass over a city list, in input order.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub reports: Vec<CityReport>,
}

impl RunSummary {
    pub fn stored(&self) -> usize {
        self.reports.iter().filter(|r| r.outcome.is_stored()).count()
    }

    pub fn aborted(&self) -> usize {
        self.reports.len() - self.stored()
    }
}

#[derive(Debug)]
pub struct Pipeline<S, D> {
    source: S,
    store: D,
}

impl<S, D> Pipeline<S, D>
where
    S: WeatherSource,
    D: WeatherStore,
{
    pub fn new(source: S, store: D) -> Self {
        Self { source, store }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn store(&self) -> &D {
        &self.store
    }

    /// Run every city in order. Never fails: each city's error is recorded in
    /// its report.
    pub async fn run<I, C>(&self, cities: I) -> RunSummary
    where
        I: IntoIterator<Item = C>,
        C: AsRef<str>,
    {
        let mut summary = RunSummary::default();
        for city in cities {
            let city = city.as_ref();
            let outcome = self.run_city(city).await;
            summary.reports.push(CityReport {
                city: city.to_string(),
                outcome,
            });
        }
        summary
    }

    pub async fn run_city(&self, city: &str) -> CityOutcome {
        info!(city, "starting ETL");

        let mut reached = PipelineState::Start;
        match self.stages(city, &mut reached).await {
            Ok(()) => {
                info!(city, "ETL complete");
                CityOutcome::Stored
            }
            Err(error) => {
                error!(city, %reached, %error, "aborting ETL");
                CityOutcome::Aborted { reached, error }
            }
        }
    }

    async fn stages(&self, city: &str, reached: &mut PipelineState) -> Result<(), PipelineError> {
        info!(city, "1. extracting raw data");
        let raw = self.source.fetch(city).await?;
        *reached = PipelineState::Fetched;

        info!(city, "2. transforming raw data");
        let record = transform(Some(&raw))?;
        *reached = PipelineState::Transformed;

        info!(city, "3. ensuring database table exists");
        self.store.ensure_schema().await?;
        *reached = PipelineState::SchemaReady;

        info!(city, "4. loading transformed data into database");
        self.store.store(Some(&record)).await?;
        *reached = PipelineState::Stored;

        Ok(())
    }
}
