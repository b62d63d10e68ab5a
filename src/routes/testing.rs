use crate::{AppState, handlers};
use axum::{Router, routing::post};

/// Testing Router Module
///
/// Mounted only when the service runs with `APP_ENV=test`.
pub fn testing_routes() -> Router<AppState> {
    Router::new().route("/api/testing/reset", post(handlers::reset_database))
}
