use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{post, put},
};

/// Authenticated Router Module
///
/// Post-mutating endpoints. Each handler takes `AuthUser` as its first
/// argument, so the shared precondition (token present, verifiable, naming an
/// existing user) runs before the path id is cast or the body is parsed.
pub fn authenticated_routes() -> Router<AppState> {
    Router::new()
        // POST /api/blogs
        .route("/api/blogs", post(handlers::create_blog))
        // PUT /api/blogs/{id} updates, DELETE /api/blogs/{id} removes.
        .route(
            "/api/blogs/{id}",
            put(handlers::update_blog).delete(handlers::delete_blog),
        )
        // POST /api/blogs/{id}/comments
        .route("/api/blogs/{id}/comments", post(handlers::add_comment))
}
