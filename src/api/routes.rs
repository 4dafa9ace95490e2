//! HTTP API route definitions.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::metrics::track_http;

use super::handlers::{hello, predict_hotel, root, AppState};

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/hello", get(hello))
        .route("/api/predictHotel", post(predict_hotel))
        .route_layer(middleware::from_fn(track_http))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
