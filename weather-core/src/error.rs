//! Failure types for each pipeline stage.
//!
//! Every stage returns its own error enum; [`PipelineError`] tags which stage
//! produced it so the orchestrator can report and move on.

use thiserror::Error;

/// Failures while building an [`EtlConfig`](crate::EtlConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing database setting `{0}`; set it in the environment or config.toml")]
    MissingDatabaseSetting(&'static str),

    #[error("invalid value for `{key}`: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

/// Extract stage failures.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("OPENWEATHER_API_KEY is not configured")]
    Configuration,

    #[error("provider returned HTTP {status}: {body}")]
    Remote { status: u16, body: String },

    #[error("connection error: {0}")]
    Transport(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("unexpected fetch error: {0}")]
    Unknown(String),
}

impl FetchError {
    /// Sort a reqwest failure into the fetch taxonomy.
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(err.to_string())
        } else if err.is_connect() {
            FetchError::Transport(err.to_string())
        } else {
            FetchError::Unknown(err.to_string())
        }
    }
}

/// Transform stage failures.
#[derive(Debug, Error, PartialEq)]
pub enum TransformError {
    #[error("no raw data provided for transformation")]
    NoData,

    #[error("missing expected field `{0}`")]
    MissingField(String),

    #[error("unexpected transformation error: {0}")]
    Unexpected(String),
}

/// Load stage failures.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to create/ensure table existence: {0}")]
    Schema(String),

    #[error("database error during insertion: {0}")]
    Store(String),
}

/// A stage failure as seen by the orchestrator.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("extraction failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("transformation failed: {0}")]
    Transform(#[from] TransformError),

    #[error("load failed: {0}")]
    Load(#[from] LoadError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_error_mentions_status_and_body() {
        let err = FetchError::Remote {
            status: 404,
            body: r#"{"cod":"404","message":"city not found"}"#.into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("404"));
        assert!(msg.contains("city not found"));
    }

    #[test]
    fn pipeline_error_keeps_stage_prefix() {
        let err = PipelineError::from(TransformError::MissingField("main.temp".into()));
        assert_eq!(
            err.to_string(),
            "transformation failed: missing expected field `main.temp`"
        );
    }
}
