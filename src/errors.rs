use axum::{
    Json,
    body::Bytes,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::{auth::TokenError, models::ErrorBody, repository::StoreError};

/// ApiError
///
/// The closed failure taxonomy of the API and the single translation point to
/// HTTP. Handlers propagate these with `?`; none of them are caught on the way
/// out.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed, missing or duplicate input.
    #[error("{0}")]
    Validation(String),
    /// Missing, invalid or wrong credentials.
    #[error("{0}")]
    Authorization(String),
    /// Authenticated, but not entitled to the resource.
    #[error("{0}")]
    Permission(String),
    /// Target absent.
    #[error("{0}")]
    Resource(String),
    /// A path id the store could not cast.
    #[error("malformatted id")]
    MalformattedId,
    /// Token absent, unverifiable, or naming no existing user.
    #[error("token missing or invalid")]
    InvalidToken,
    /// Anything unexpected. The detail is logged, never returned.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::MalformattedId => StatusCode::BAD_REQUEST,
            ApiError::Authorization(_) | ApiError::InvalidToken => StatusCode::UNAUTHORIZED,
            ApiError::Permission(_) => StatusCode::FORBIDDEN,
            ApiError::Resource(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_client_error(&self) -> bool {
        !matches!(self, ApiError::Internal(_))
    }

    pub fn unknown_endpoint() -> Self {
        ApiError::Resource("unknown endpoint".to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = if self.is_client_error() {
            tracing::warn!(status = status.as_u16(), "{}", self);
            self.to_string()
        } else {
            tracing::error!(error = %self, "request failed");
            "internal server error".to_string()
        };

        (status, Json(ErrorBody { error })).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Cast(_) => ApiError::MalformattedId,
            StoreError::Validation(message) => ApiError::Validation(message),
            StoreError::Database(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(_: TokenError) -> Self {
        ApiError::InvalidToken
    }
}

/// JsonBody
///
/// Lenient `Json<T>`: a request without a JSON content type, or with an empty
/// body, yields `T::default()`, so handlers see an empty payload rather than a
/// rejection. A JSON body that fails to parse or has a wrongly-typed field is
/// a 400 `ValidationError`.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Default,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !has_json_content_type(req.headers()) {
            return Ok(JsonBody(T::default()));
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::Validation(rejection.body_text()))?;
        if bytes.is_empty() {
            return Ok(JsonBody(T::default()));
        }

        match Json::<T>::from_bytes(&bytes) {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

fn has_json_content_type(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    ApiError::Validation(rejection.body_text())
}
