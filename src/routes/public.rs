use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Registration, login and the read-only post listing. None of these look at
/// the bearer token.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // GET /api/users lists users; POST /api/users registers one.
        .route(
            "/api/users",
            get(handlers::get_users).post(handlers::create_user),
        )
        // POST /api/login
        // Exchanges username and password for a bearer token.
        .route("/api/login", post(handlers::login))
        // GET /api/blogs
        // Lists every post with its owner populated.
        .route("/api/blogs", get(handlers::get_blogs))
}
