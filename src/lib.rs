use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod list_helper;
pub mod memory;
pub mod models;
pub mod password;
pub mod repository;
pub mod validation;

// Routing grouped by required authorization (public, authenticated, testing).
pub mod routes;
use routes::{authenticated, public, testing};

// --- Public Re-exports ---

pub use auth::TokenService;
pub use config::{AppConfig, Env};
pub use errors::ApiError;
pub use memory::MemoryRepository;
pub use repository::{PostgresRepository, RepositoryState};

/// ApiDoc
///
/// OpenAPI document for the API, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::create_user, handlers::get_users, handlers::login,
        handlers::get_blogs, handlers::create_blog, handlers::update_blog,
        handlers::delete_blog, handlers::add_comment
    ),
    components(
        schemas(
            models::RegisterUserRequest, models::LoginRequest, models::BlogPayload,
            models::CommentRequest, models::UserView, models::OwnerView, models::BlogView,
            models::BlogSummary, models::UserWithBlogs, models::LoginResponse,
            models::ErrorBody,
        )
    ),
    modifiers(&BearerSecurity),
    tags(
        (name = "bloglist", description = "Blog list API")
    )
)]
struct ApiDoc;

struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

/// AppState
///
/// Single, cloneable container for everything a request needs: the document
/// store, the token service and the loaded configuration.
#[derive(Clone)]
pub struct AppState {
    /// Document store (Postgres or in-memory).
    pub repo: RepositoryState,
    /// Signs and verifies bearer tokens with the configured secret.
    pub tokens: TokenService,
    /// The loaded, immutable configuration.
    pub config: AppConfig,
}

impl AppState {
    /// Builds the state from a store and a configuration, deriving the token
    /// service from the configured secret.
    pub fn new(repo: RepositoryState, config: AppConfig) -> Self {
        Self {
            repo,
            tokens: TokenService::from_config(&config),
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for TokenService {
    fn from_ref(app_state: &AppState) -> TokenService {
        app_state.tokens.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the routing structure, the token extractor, the fallback and
/// the observability layers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let mut api = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(authenticated::authenticated_routes());

    if state.config.env == Env::Test {
        api = api.merge(testing::testing_routes());
    }

    let router = api
        .fallback(handlers::fallback)
        // Runs for every request; never rejects.
        .layer(middleware::from_fn(auth::token_extractor))
        .with_state(state);

    router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for `TraceLayer`: method, uri and the request id, so every log line
/// of a request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
