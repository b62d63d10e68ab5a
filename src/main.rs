use bloglist::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    memory::MemoryRepository,
    repository::{PostgresRepository, RepositoryState},
};
use sqlx::postgres::PgPoolOptions;
use std::{error::Error, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Entry point: configuration, logging, store connection, then the HTTP server.
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // 1. Configuration
    // `.env` is loaded before the environment is read. Production refuses to
    // start without its secret and database URL.
    dotenv::dotenv().ok();
    let config = AppConfig::load()?;

    // 2. Logging
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "bloglist=debug,tower_http=info".into());

    match config.env {
        Env::Local | Env::Test => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 3. Document store
    let repo: RepositoryState = match config.db_url.as_deref() {
        Some(db_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(db_url)
                .await
                .inspect_err(|e| tracing::error!(error = %e, "failed to connect to Postgres"))?;
            let repo = PostgresRepository::new(pool);
            repo.init_schema().await?;
            tracing::info!("connected to Postgres");
            Arc::new(repo)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using the in-memory store");
            Arc::new(MemoryRepository::new())
        }
    };

    // 4. Router and server
    let port = config.port;
    let app = create_router(AppState::new(repo, config));

    let listener = TcpListener::bind(("0.0.0.0", port)).await?;

    tracing::info!("Listening on 0.0.0.0:{port}");
    tracing::info!("API Documentation (Swagger UI) available at: http://localhost:{port}/swagger-ui");

    axum::serve(listener, app).await?;
    Ok(())
}
