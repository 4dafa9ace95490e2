//! Coordinate form decoding for the prediction endpoint.
//!
//! Accepts `application/x-www-form-urlencoded` and `multipart/form-data`
//! bodies. Existing clients send the longitude under the misspelled name
//! `longtitude`; the corrected `longitude` is accepted when it is absent.

use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
    Form,
};
use tracing::warn;

use crate::error::{ApiError, ValidationError};
use crate::metrics;

/// Canonical longitude field name on the wire.
pub const LONGITUDE_FIELD: &str = "longtitude";
/// Corrected spelling, accepted as a fallback.
pub const LONGITUDE_FIELD_ALIAS: &str = "longitude";
/// Latitude field name.
pub const LATITUDE_FIELD: &str = "latitude";

/// Coordinates decoded from a prediction form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateForm {
    /// Longitude in degrees, unchecked range.
    pub longitude: f64,
    /// Latitude in degrees, unchecked range.
    pub latitude: f64,
}

impl CoordinateForm {
    /// Build from decoded `(name, value)` pairs. The first occurrence of a name wins.
    pub fn from_fields(fields: &[(String, String)]) -> Result<Self, ValidationError> {
        let lookup = |name: &str| {
            fields
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str())
        };

        let longitude = match [LONGITUDE_FIELD, LONGITUDE_FIELD_ALIAS]
            .into_iter()
            .find_map(|name| lookup(name).map(|raw| (name, raw)))
        {
            Some((name, raw)) => parse_coordinate(name, raw)?,
            None => {
                return Err(ValidationError::MissingField {
                    field: LONGITUDE_FIELD,
                })
            }
        };

        let latitude = match lookup(LATITUDE_FIELD) {
            Some(raw) => parse_coordinate(LATITUDE_FIELD, raw)?,
            None => {
                return Err(ValidationError::MissingField {
                    field: LATITUDE_FIELD,
                })
            }
        };

        Ok(Self {
            longitude,
            latitude,
        })
    }
}

/// Parse one coordinate. Whitespace is trimmed; NaN and infinities are rejected.
pub fn parse_coordinate(field: &'static str, raw: &str) -> Result<f64, ValidationError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ValidationError::InvalidNumber {
            field,
            value: raw.to_string(),
        })
}

async fn read_fields<S>(req: Request, state: &S) -> Result<Vec<(String, String)>, ValidationError>
where
    S: Send + Sync,
{
    let is_multipart = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("multipart/form-data"))
        .unwrap_or(false);

    if !is_multipart {
        let Form(fields) = Form::<Vec<(String, String)>>::from_request(req, state)
            .await
            .map_err(|e| ValidationError::UnreadableBody(e.body_text()))?;
        return Ok(fields);
    }

    let mut multipart = Multipart::from_request(req, state)
        .await
        .map_err(|e| ValidationError::UnreadableBody(e.body_text()))?;

    let mut fields = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ValidationError::UnreadableBody(e.body_text()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let value = field
            .text()
            .await
            .map_err(|e| ValidationError::UnreadableBody(e.body_text()))?;
        fields.push((name, value));
    }

    Ok(fields)
}

#[async_trait]
impl<S> FromRequest<S> for CoordinateForm
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let decoded = match read_fields(req, state).await {
            Ok(fields) => CoordinateForm::from_fields(&fields),
            Err(e) => Err(e),
        };

        decoded.map_err(|e| {
            metrics::inc_validation_failures();
            warn!(error = %e, "Rejected prediction form");
            ApiError::Validation(e)
        })
    }
}
