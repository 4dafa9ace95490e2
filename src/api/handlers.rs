//! HTTP API handlers.

use std::fmt;
use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;
use tracing::{debug, error};

use crate::error::{ApiError, AppError, PredictorError};
use crate::metrics;
use crate::predictor::{PredictionResult, SharedPredictor};

use super::form::CoordinateForm;

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Rating predictor, built once at startup.
    pub predictor: SharedPredictor,
}

impl AppState {
    /// Create new app state.
    pub fn new(predictor: SharedPredictor) -> Self {
        Self { predictor }
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("predictor", &self.predictor.name())
            .finish()
    }
}

/// Hello response.
#[derive(Debug, Serialize)]
pub struct HelloResponse {
    /// Greeting.
    pub message: &'static str,
}

/// Prediction response.
#[derive(Debug, Serialize)]
pub struct PredictResponse {
    /// Predictor output, unchanged.
    pub data: PredictionResult,
}

/// Root handler - liveness text.
pub async fn root() -> &'static str {
    "API is running!"
}

/// Hello handler.
pub async fn hello() -> Json<HelloResponse> {
    Json(HelloResponse {
        message: "Hello, World!",
    })
}

/// Run one prediction on the blocking pool.
pub async fn run_prediction(
    predictor: &SharedPredictor,
    longitude: f64,
    latitude: f64,
) -> Result<PredictionResult, PredictorError> {
    let predictor = Arc::clone(predictor);
    let timer = metrics::timer_prediction();

    let outcome = tokio::task::spawn_blocking(move || predictor.predict_rating(longitude, latitude))
        .await
        .map_err(|e| PredictorError::TaskFailed(e.to_string()))
        .and_then(|result| result);

    debug!(
        elapsed_ms = timer.elapsed_ms(),
        ok = outcome.is_ok(),
        "Prediction finished"
    );
    outcome
}

/// Run one prediction and render the same JSON body the HTTP endpoint returns.
pub async fn predict_line(
    predictor: &SharedPredictor,
    longitude: f64,
    latitude: f64,
) -> Result<String, AppError> {
    let data = run_prediction(predictor, longitude, latitude).await?;
    Ok(serde_json::to_string(&PredictResponse { data })?)
}

/// Prediction handler - parses the form, delegates, wraps the result in `data`.
pub async fn predict_hotel(
    State(state): State<AppState>,
    form: CoordinateForm,
) -> Result<Json<PredictResponse>, ApiError> {
    let CoordinateForm {
        longitude,
        latitude,
    } = form;

    match run_prediction(&state.predictor, longitude, latitude).await {
        Ok(data) => {
            metrics::inc_predictions();
            debug!(longitude, latitude, result = ?data, "Prediction served");
            Ok(Json(PredictResponse { data }))
        }
        Err(e) => {
            metrics::inc_predictions_failed();
            error!(
                error = %e,
                longitude,
                latitude,
                predictor = state.predictor.name(),
                "Prediction failed"
            );
            Err(ApiError::Upstream(e))
        }
    }
}
