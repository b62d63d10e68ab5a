use crate::errors::ApiError;

/// Computes a salted bcrypt digest on the blocking pool.
pub async fn hash_password(password: String, cost: u32) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| ApiError::Internal(format!("password hashing task failed: {e}")))?
        .map_err(|e| ApiError::Internal(format!("failed to hash password: {e}")))
}

/// Compares a candidate password against a stored digest on the blocking pool.
pub async fn verify_password(password: String, digest: String) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &digest))
        .await
        .map_err(|e| ApiError::Internal(format!("password verification task failed: {e}")))?
        .map_err(|e| ApiError::Internal(format!("failed to verify password: {e}")))
}
