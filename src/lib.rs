//! Hotel rating prediction API.
//!
//! A small HTTP service that estimates a hotel rating for a pair of
//! geographic coordinates.
//!
//! ```text
//! GET  /                  -> "API is running!"
//! GET  /api/hello         -> {"message": "Hello, World!"}
//! POST /api/predictHotel  -> {"data": <prediction>}
//!      form: longtitude=<f64>&latitude=<f64>
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`predictor`]: Rating predictors (nearest-neighbour model, mock)
//! - [`api`]: HTTP routes, handlers and form decoding
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod predictor;
pub mod utils;

pub use config::Config;
pub use error::{AppError, Result};
