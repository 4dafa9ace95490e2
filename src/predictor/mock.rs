//! Mock predictor for unit testing.
//!
//! Returns a canned result (or failure) and records every call so tests can
//! assert on what the HTTP layer forwarded.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::PredictorError;

use super::{PredictionResult, RatingPredictor};

/// Mock predictor for testing.
#[derive(Debug, Clone)]
pub struct MockPredictor {
    /// Result returned on success.
    result: PredictionResult,
    /// Failure message, if the mock should fail.
    failure: Option<String>,
    /// Simulated model latency.
    latency: Duration,
    /// Recorded `(longitude, latitude)` calls.
    calls: Arc<Mutex<Vec<(f64, f64)>>>,
}

impl MockPredictor {
    /// Mock that always returns `result`.
    pub fn returning(result: impl Into<PredictionResult>) -> Self {
        Self {
            result: result.into(),
            failure: None,
            latency: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Mock that always fails with a model error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::returning(serde_json::Value::Null)
        }
    }

    /// Add simulated latency to every call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Calls received so far.
    pub fn calls(&self) -> Vec<(f64, f64)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of calls received so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or_default()
    }
}

impl RatingPredictor for MockPredictor {
    fn predict_rating(
        &self,
        longitude: f64,
        latitude: f64,
    ) -> Result<PredictionResult, PredictorError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((longitude, latitude));
        }

        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }

        match &self.failure {
            Some(message) => Err(PredictorError::Model(message.clone())),
            None => Ok(self.result.clone()),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
