//! HTTP API module: root, hello, and hotel rating prediction endpoints.

pub mod form;
pub mod handlers;
pub mod routes;

pub use form::CoordinateForm;
pub use handlers::AppState;
pub use routes::create_router;
