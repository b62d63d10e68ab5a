use axum::{
    extract::{FromRef, FromRequestParts, Request},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use thiserror::Error;
use uuid::Uuid;

use crate::{config::AppConfig, errors::ApiError, models::UserRecord, repository::RepositoryState};

/// Claims
///
/// The identity claim signed into every token. No `exp` or `iat` is set, so a
/// token stays valid for as long as the secret does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub username: String,
    pub id: String,
}

/// Claims as read back during verification. Both fields may be absent in a
/// token signed by someone else with the same secret.
#[derive(Debug, Deserialize)]
struct IncomingClaims {
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error(transparent)]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("token carries no usable id claim")]
    MissingId,
}

/// TokenService
///
/// Issues and verifies HS256 bearer tokens over a server-held secret. Built
/// once from `AppConfig` and shared through `AppState`.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Tokens carry no expiry; nothing beyond the signature is required.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.jwt_secret)
    }

    /// issue
    ///
    /// Signs `{username, id}`. The output is deterministic for a given user and secret.
    pub fn issue(&self, user: &UserRecord) -> Result<String, TokenError> {
        let claims = Claims {
            username: user.username.clone(),
            id: user.id.to_string(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// verify
    ///
    /// Fails on a bad signature, a malformed token, or a missing / non-UUID `id` claim.
    pub fn verify(&self, token: &str) -> Result<Uuid, TokenError> {
        let data = decode::<IncomingClaims>(token, &self.decoding, &self.validation)?;
        data.claims
            .id
            .as_deref()
            .and_then(|id| Uuid::parse_str(id).ok())
            .ok_or(TokenError::MissingId)
    }
}

/// BearerToken
///
/// The token extracted from `Authorization: Bearer <token>`, if any. Produced
/// by [`token_extractor`] for every request; absence is not an error here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BearerToken(pub Option<String>);

impl BearerToken {
    /// Accepts the scheme case-insensitively; the token is everything after
    /// the first seven bytes (`"bearer "`).
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let token = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .filter(|value| {
                value
                    .get(..7)
                    .is_some_and(|scheme| scheme.eq_ignore_ascii_case("bearer "))
            })
            .map(|value| value[7..].to_string());
        BearerToken(token)
    }
}

/// token_extractor
///
/// Global middleware: attaches the request's [`BearerToken`] to its extensions
/// and always forwards the request.
pub async fn token_extractor(mut request: Request, next: Next) -> Response {
    let token = BearerToken::from_headers(request.headers());
    request.extensions_mut().insert(token);
    next.run(request).await
}

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<BearerToken>().cloned().unwrap_or_default())
    }
}

/// AuthUser
///
/// The resolved requester of a post-mutating call. Extraction is the shared
/// authorization precondition:
/// 1. no token,
/// 2. a token that does not verify,
/// 3. a verified id naming no stored user
///
/// all reject with the same `ApiError::InvalidToken`, so callers cannot tell
/// the cases apart.
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserRecord);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    TokenService: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let tokens = TokenService::from_ref(state);

        let BearerToken(token) = BearerToken::from_request_parts(parts, state)
            .await
            .unwrap_or_default();
        let token = token.ok_or(ApiError::InvalidToken)?;

        let user_id = tokens.verify(&token)?;

        let user = repo
            .find_user(user_id)
            .await?
            .ok_or(ApiError::InvalidToken)?;

        Ok(AuthUser(user))
    }
}
