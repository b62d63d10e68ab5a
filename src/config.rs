use std::{env, path::PathBuf};

use thiserror::Error;

/// Development-only signing secret. Never accepted in `Env::Production`.
const LOCAL_JWT_SECRET: &str = "bloglist-local-development-secret";

/// AppConfig
///
/// Holds the application's entire configuration state. Built once at process start
/// and shared through `AppState`; handlers, the token service and the store
/// connectors receive it by value or reference, never from ambient globals.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. `Env::Test` mounts the testing router.
    pub env: Env,
    // TCP port the HTTP server binds to.
    pub port: u16,
    // Postgres connection string. `None` selects the in-memory store.
    pub db_url: Option<String>,
    // Secret used to sign and verify bearer tokens.
    pub jwt_secret: String,
    // bcrypt cost factor applied to new password digests.
    pub password_cost: u32,
    // Directory holding the bundled single-page app shell.
    pub static_dir: PathBuf,
}

/// Env
///
/// Defines the runtime context. `Test` mirrors the original `NODE_ENV=test`
/// switch: a separate database URL and the `/api/testing` reset endpoint.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Env {
    Local,
    Test,
    Production,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set in production")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

impl Default for AppConfig {
    /// default
    ///
    /// Safe, non-panicking configuration for test scaffolding. Uses the lowest
    /// bcrypt cost so hashing does not dominate test run time.
    fn default() -> Self {
        Self {
            env: Env::Test,
            port: 3003,
            db_url: None,
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            password_cost: 4,
            static_dir: PathBuf::from("build"),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads all parameters from environment variables. Production is fail-fast:
    /// a missing `SECRET` or `DATABASE_URL` aborts start-up instead of silently
    /// running on the development defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            Ok("test") => Env::Test,
            _ => Env::Local,
        };

        let jwt_secret = match (env, env::var("SECRET")) {
            (_, Ok(secret)) => secret,
            (Env::Production, Err(_)) => return Err(ConfigError::Missing("SECRET")),
            (_, Err(_)) => LOCAL_JWT_SECRET.to_string(),
        };

        let db_url = match env {
            Env::Test => env::var("TEST_DATABASE_URL")
                .or_else(|_| env::var("DATABASE_URL"))
                .ok(),
            _ => env::var("DATABASE_URL").ok(),
        };
        if env == Env::Production && db_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        Ok(Self {
            env,
            port: parse_var("PORT", 3003)?,
            db_url,
            jwt_secret,
            password_cost: parse_var("BCRYPT_COST", 10)?,
            static_dir: env::var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("build")),
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}
