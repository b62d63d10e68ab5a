use axum::{
    extract::FromRequestParts,
    http::{HeaderValue, Method, Request, header, request::Parts},
};
use bloglist::{
    ApiError, AppConfig, AppState, TokenService,
    auth::{AuthUser, BearerToken, Claims},
    memory::MemoryRepository,
    models::UserRecord,
};
use jsonwebtoken::{EncodingKey, Header, encode};
use std::sync::Arc;
use uuid::Uuid;

const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";

fn test_user() -> UserRecord {
    UserRecord {
        id: Uuid::from_u128(1),
        username: "root".to_string(),
        name: Some("Superuser".to_string()),
        password_hash: "$2b$04$placeholderplaceholderplaceholderplaceholderpla".to_string(),
        blogs: vec![],
    }
}

async fn create_app_state(users: Vec<UserRecord>) -> AppState {
    let repo = MemoryRepository::new();
    repo.seed(users, vec![]).await;

    let config = AppConfig {
        jwt_secret: TEST_JWT_SECRET.to_string(),
        ..AppConfig::default()
    };
    AppState::new(Arc::new(repo), config)
}

/// Builds request parts the way the router does: headers set, then the token
/// extractor's output attached to the extensions.
fn request_parts(authorization: Option<&str>) -> Parts {
    let mut builder = Request::builder().method(Method::POST).uri("/api/blogs");
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    let (mut parts, _) = builder.body(axum::body::Body::empty()).unwrap().into_parts();
    let token = BearerToken::from_headers(&parts.headers);
    parts.extensions.insert(token);
    parts
}

// --- Token Service ---

#[test]
fn test_issued_token_verifies_to_user_id() {
    let tokens = TokenService::new(TEST_JWT_SECRET);
    let user = test_user();

    let token = tokens.issue(&user).unwrap();
    assert_eq!(tokens.verify(&token).unwrap(), user.id);
}

#[test]
fn test_issue_is_deterministic() {
    let tokens = TokenService::new(TEST_JWT_SECRET);
    let user = test_user();
    assert_eq!(tokens.issue(&user).unwrap(), tokens.issue(&user).unwrap());
}

#[test]
fn test_token_signed_with_other_secret_fails() {
    let token = TokenService::new("another-secret").issue(&test_user()).unwrap();
    assert!(TokenService::new(TEST_JWT_SECRET).verify(&token).is_err());
}

#[test]
fn test_malformed_token_fails() {
    let tokens = TokenService::new(TEST_JWT_SECRET);
    assert!(tokens.verify("definitely.not.ajwt").is_err());
    assert!(tokens.verify("").is_err());
}

#[test]
fn test_token_without_id_claim_fails() {
    #[derive(serde::Serialize)]
    struct UsernameOnly {
        username: String,
    }
    let token = encode(
        &Header::default(),
        &UsernameOnly {
            username: "root".to_string(),
        },
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .unwrap();

    assert!(TokenService::new(TEST_JWT_SECRET).verify(&token).is_err());
}

#[test]
fn test_token_without_expiry_is_accepted() {
    let claims = Claims {
        username: "root".to_string(),
        id: Uuid::from_u128(7).to_string(),
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .unwrap();

    assert_eq!(
        TokenService::new(TEST_JWT_SECRET).verify(&token).unwrap(),
        Uuid::from_u128(7)
    );
}

// --- Bearer Token Extraction ---

#[test]
fn test_bearer_token_extraction() {
    let cases = [
        (Some("Bearer abc.def"), Some("abc.def")),
        (Some("bearer abc.def"), Some("abc.def")),
        (Some("BEARER abc.def"), Some("abc.def")),
        (Some("Basic dXNlcjpwYXNz"), None),
        (Some("Bearer"), None),
        (None, None),
    ];

    for (header_value, expected) in cases {
        let parts = request_parts(header_value);
        assert_eq!(
            BearerToken::from_headers(&parts.headers),
            BearerToken(expected.map(str::to_string)),
            "header {:?}",
            header_value
        );
    }
}

#[test]
fn test_non_ascii_authorization_header_yields_no_token() {
    let mut parts = request_parts(None);
    parts.headers.insert(
        header::AUTHORIZATION,
        HeaderValue::from_bytes(b"Bearer \xfftoken").unwrap(),
    );
    assert_eq!(BearerToken::from_headers(&parts.headers), BearerToken(None));
}

// --- AuthUser precondition ---

#[tokio::test]
async fn test_auth_success_with_valid_token() {
    let user = test_user();
    let state = create_app_state(vec![user.clone()]).await;
    let token = state.tokens.issue(&user).unwrap();

    let mut parts = request_parts(Some(&format!("Bearer {}", token)));
    let AuthUser(resolved) = AuthUser::from_request_parts(&mut parts, &state)
        .await
        .unwrap();

    assert_eq!(resolved, user);
}

#[tokio::test]
async fn test_auth_failure_with_missing_header() {
    let state = create_app_state(vec![test_user()]).await;
    let mut parts = request_parts(None);

    let result = AuthUser::from_request_parts(&mut parts, &state).await;
    assert!(matches!(result, Err(ApiError::InvalidToken)));
}

#[tokio::test]
async fn test_auth_failure_with_invalid_token() {
    let state = create_app_state(vec![test_user()]).await;
    let mut parts = request_parts(Some("Bearer abc.def.ghi"));

    let result = AuthUser::from_request_parts(&mut parts, &state).await;
    assert!(matches!(result, Err(ApiError::InvalidToken)));
}

#[tokio::test]
async fn test_auth_failure_when_user_no_longer_exists() {
    let state = create_app_state(vec![]).await;
    let token = state.tokens.issue(&test_user()).unwrap();
    let mut parts = request_parts(Some(&format!("Bearer {}", token)));

    let result = AuthUser::from_request_parts(&mut parts, &state).await;
    assert!(matches!(result, Err(ApiError::InvalidToken)));
}

#[test]
fn test_all_precondition_failures_share_status_and_message() {
    let errors = [
        ApiError::InvalidToken,
        ApiError::from(bloglist::auth::TokenError::MissingId),
    ];
    for error in errors {
        assert_eq!(error.status(), 401);
        assert_eq!(error.to_string(), "token missing or invalid");
    }
}
