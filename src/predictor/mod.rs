//! Rating predictors.
//!
//! This module handles:
//! - The [`RatingPredictor`] seam the HTTP layer calls into
//! - A nearest-neighbour model over a hotel data set
//! - Mock predictor for testing

pub mod knn;
pub mod mock;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::info;

use crate::config::Config;
use crate::error::PredictorError;

pub use knn::{Hotel, KnnPredictor};
pub use mock::MockPredictor;

/// Opaque prediction output, serialized verbatim under `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PredictionResult(pub serde_json::Value);

impl From<f64> for PredictionResult {
    fn from(value: f64) -> Self {
        Self(serde_json::Value::from(value))
    }
}

impl From<serde_json::Value> for PredictionResult {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

/// Something that turns a coordinate pair into a hotel rating.
///
/// Calls are synchronous and may take arbitrarily long; the HTTP layer runs
/// them on the blocking pool.
pub trait RatingPredictor: Send + Sync {
    /// Predict the rating for a location.
    fn predict_rating(&self, longitude: f64, latitude: f64)
        -> Result<PredictionResult, PredictorError>;

    /// Short name for logs.
    fn name(&self) -> &str;
}

/// Shared predictor handle.
pub type SharedPredictor = Arc<dyn RatingPredictor>;

/// Predictor implementations selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum PredictorKind {
    /// Inverse-distance-weighted k nearest hotels.
    #[strum(serialize = "knn", serialize = "KNN")]
    Knn,
}

/// Build the configured predictor.
pub fn build_predictor(config: &Config) -> Result<SharedPredictor, PredictorError> {
    let kind = config
        .predictor_kind()
        .map_err(|_| PredictorError::UnknownKind(config.predictor.clone()))?;

    let predictor: SharedPredictor = match kind {
        PredictorKind::Knn => {
            let model = KnnPredictor::from_path(&config.hotels_path, config.knn_neighbors)?;
            info!(
                hotels = model.len(),
                k = model.neighbors(),
                path = %config.hotels_path.display(),
                "Loaded hotel data set"
            );
            Arc::new(model)
        }
    };

    Ok(predictor)
}
