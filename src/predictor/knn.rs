//! Nearest-neighbour hotel rating model.
//!
//! The rating at a location is the inverse-distance-weighted mean of the `k`
//! closest hotels' ratings, with great-circle distances:
//!
//! ```text
//! rating = Σ(r_i / d_i) / Σ(1 / d_i)
//! ```
//!
//! A query that lands exactly on one or more hotels returns their mean rating.

use std::path::Path;

use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::PredictorError;

use super::{PredictionResult, RatingPredictor};

/// Mean Earth radius in kilometres (IUGG).
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Distances below this are treated as the same spot.
const SAME_SPOT_KM: f64 = 1e-9;

/// One row of the hotel data set.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Hotel {
    /// Hotel name (informational).
    #[serde(default)]
    pub name: String,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Observed rating.
    pub rating: f64,
}

/// k-nearest-neighbour rating model.
#[derive(Debug, Clone)]
pub struct KnnPredictor {
    hotels: Vec<Hotel>,
    k: usize,
}

impl KnnPredictor {
    /// Build a model from in-memory hotels.
    pub fn new(hotels: Vec<Hotel>, k: usize) -> Result<Self, PredictorError> {
        if k == 0 {
            return Err(PredictorError::InvalidInput(
                "neighbour count must be at least 1".to_string(),
            ));
        }

        for (idx, hotel) in hotels.iter().enumerate() {
            // Header is line 1.
            validate_hotel(hotel, idx as u64 + 2)?;
        }

        Ok(Self { hotels, k })
    }

    /// Load a model from a CSV file with a `name,longitude,latitude,rating` header.
    pub fn from_path(path: impl AsRef<Path>, k: usize) -> Result<Self, PredictorError> {
        let path = path.as_ref();
        let data_err = |source| PredictorError::DataRead {
            path: path.to_path_buf(),
            source,
        };

        let mut reader = csv::Reader::from_path(path).map_err(data_err)?;
        let headers = reader.headers().map_err(data_err)?.clone();

        let mut hotels = Vec::new();
        let mut record = csv::StringRecord::new();
        while reader
            .read_record(&mut record)
            .map_err(|e| record_error(path, e))?
        {
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            let hotel: Hotel = record
                .deserialize(Some(&headers))
                .map_err(|e| PredictorError::InvalidRecord {
                    line,
                    reason: e.to_string(),
                })?;
            validate_hotel(&hotel, line)?;
            hotels.push(hotel);
        }

        if hotels.is_empty() {
            return Err(PredictorError::EmptyDataSet {
                path: path.to_path_buf(),
            });
        }

        Self::new(hotels, k)
    }

    /// Number of hotels in the data set.
    pub fn len(&self) -> usize {
        self.hotels.len()
    }

    /// Whether the data set is empty.
    pub fn is_empty(&self) -> bool {
        self.hotels.is_empty()
    }

    /// Effective neighbour count.
    pub fn neighbors(&self) -> usize {
        self.k.min(self.hotels.len())
    }

    /// Raw (unrounded) rating estimate.
    pub fn estimate(&self, longitude: f64, latitude: f64) -> Result<f64, PredictorError> {
        if !longitude.is_finite() || !latitude.is_finite() {
            return Err(PredictorError::InvalidInput(format!(
                "coordinates must be finite, got ({}, {})",
                longitude, latitude
            )));
        }

        if self.hotels.is_empty() {
            return Err(PredictorError::Model("no hotels loaded".to_string()));
        }

        let mut distances: Vec<(f64, f64)> = self
            .hotels
            .iter()
            .map(|h| (haversine_km(longitude, latitude, h.longitude, h.latitude), h.rating))
            .collect();

        // Stable sort keeps file order on equal distances.
        distances.sort_by(|a, b| a.0.total_cmp(&b.0));
        distances.truncate(self.neighbors());

        let exact: Vec<f64> = distances
            .iter()
            .filter(|(d, _)| *d < SAME_SPOT_KM)
            .map(|(_, r)| *r)
            .collect();
        if !exact.is_empty() {
            return Ok(exact.iter().sum::<f64>() / exact.len() as f64);
        }

        let (weighted, weights) = distances
            .iter()
            .fold((0.0, 0.0), |(num, den), (d, r)| (num + r / d, den + 1.0 / d));

        Ok(weighted / weights)
    }
}

impl RatingPredictor for KnnPredictor {
    #[instrument(skip(self), fields(k = self.neighbors()))]
    fn predict_rating(
        &self,
        longitude: f64,
        latitude: f64,
    ) -> Result<PredictionResult, PredictorError> {
        let rating = round2(self.estimate(longitude, latitude)?);
        debug!(rating, "Predicted rating");
        Ok(PredictionResult::from(rating))
    }

    fn name(&self) -> &str {
        "knn"
    }
}

/// Row-shape errors carry a line number like value errors do.
fn record_error(path: &Path, err: csv::Error) -> PredictorError {
    if let csv::ErrorKind::UnequalLengths {
        pos,
        expected_len,
        len,
    } = err.kind()
    {
        return PredictorError::InvalidRecord {
            line: pos.as_ref().map(|p| p.line()).unwrap_or(0),
            reason: format!("expected {} fields, found {}", expected_len, len),
        };
    }

    PredictorError::DataRead {
        path: path.to_path_buf(),
        source: err,
    }
}

fn validate_hotel(hotel: &Hotel, line: u64) -> Result<(), PredictorError> {
    let fields = [
        ("longitude", hotel.longitude),
        ("latitude", hotel.latitude),
        ("rating", hotel.rating),
    ];
    for (field, value) in fields {
        if !value.is_finite() {
            return Err(PredictorError::InvalidRecord {
                line,
                reason: format!("{} is not finite", field),
            });
        }
    }
    Ok(())
}

/// Great-circle distance between two points given in degrees.
pub fn haversine_km(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    // Clamp guards against a > 1 from rounding on antipodal points.
    2.0 * EARTH_RADIUS_KM * a.sqrt().min(1.0).asin()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
