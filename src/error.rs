//! Unified error types for the hotel rating API.

use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Process-level error type (startup, configuration, CLI commands).
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Configuration loaded but failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Predictor construction error.
    #[error("predictor error: {0}")]
    Predictor(#[from] PredictorError),

    /// Prometheus exporter could not be installed.
    #[error("metrics exporter error: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    /// JSON serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Form decoding errors on the prediction endpoint.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required form field was not sent.
    #[error("missing form field `{field}`")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },

    /// A form field could not be parsed as a finite number.
    #[error("form field `{field}` is not a valid number: {value:?}")]
    InvalidNumber {
        /// Name of the offending field.
        field: &'static str,
        /// Raw value as received.
        value: String,
    },

    /// The body could not be decoded as a form at all.
    #[error("request body is not a readable form: {0}")]
    UnreadableBody(String),
}

/// Errors raised by a rating predictor.
#[derive(Error, Debug)]
pub enum PredictorError {
    /// The hotel data set could not be opened or parsed.
    #[error("failed to read hotel data from {}: {source}", .path.display())]
    DataRead {
        /// Data set path.
        path: PathBuf,
        /// Underlying CSV error.
        #[source]
        source: csv::Error,
    },

    /// A row of the data set holds an unusable value.
    #[error("invalid hotel record at line {line}: {reason}")]
    InvalidRecord {
        /// 1-based line number in the data file.
        line: u64,
        /// What was wrong with it.
        reason: String,
    },

    /// The data set has no rows.
    #[error("hotel data set {} has no records", .path.display())]
    EmptyDataSet {
        /// Data set path.
        path: PathBuf,
    },

    /// Coordinates the model cannot work with.
    #[error("invalid prediction input: {0}")]
    InvalidInput(String),

    /// Unknown predictor kind in configuration.
    #[error("unknown predictor kind: {0}")]
    UnknownKind(String),

    /// The blocking prediction task panicked or was cancelled.
    #[error("prediction task failed: {0}")]
    TaskFailed(String),

    /// Model failure reported by the predictor itself.
    #[error("model failure: {0}")]
    Model(String),
}

/// Request-level error returned by HTTP handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Client sent an unusable form.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The predictor failed.
    #[error("prediction failed: {0}")]
    Upstream(#[from] PredictorError),
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable message.
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Upstream details stay in the logs.
        let error = match &self {
            ApiError::Validation(e) => e.to_string(),
            ApiError::Upstream(_) => "prediction failed".to_string(),
        };

        (self.status(), Json(ErrorResponse { error })).into_response()
    }
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_bad_request() {
        let err = ApiError::from(ValidationError::MissingField { field: "latitude" });
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "missing form field `latitude`");
    }

    #[test]
    fn upstream_maps_to_internal_error() {
        let err = ApiError::from(PredictorError::Model("boom".to_string()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn invalid_number_quotes_raw_value() {
        let err = ValidationError::InvalidNumber {
            field: "longtitude",
            value: "abc".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "form field `longtitude` is not a valid number: \"abc\""
        );
    }
}
