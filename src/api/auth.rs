use anyhow::Result;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use rand::Rng;
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::config::AuthConfig;
use crate::db::{Admin, DbPool, LoginRequest, LoginResponse, Session};
use crate::AppState;

use super::error::ApiError;

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Generate a random token
fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    hex::encode(bytes)
}

/// Hash a token for storage
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Extract the bearer token from request headers
fn extract_token(headers: &axum::http::HeaderMap) -> Option<String> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.to_string())
}

/// Idempotent bootstrap: seed the singleton admin credential if none exists.
/// Runs once at startup, so the login path never creates accounts.
pub async fn ensure_default_admin(db: &DbPool, auth: &AuthConfig) -> Result<()> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM admins")
        .fetch_one(db)
        .await?;
    if count.0 > 0 {
        return Ok(());
    }

    let password_hash = hash_password(&auth.default_admin_password)
        .map_err(|e| anyhow::anyhow!("Failed to hash default admin password: {}", e))?;
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query("INSERT INTO admins (password_hash, created_at, updated_at) VALUES (?, ?, ?)")
        .bind(&password_hash)
        .bind(&now)
        .bind(&now)
        .execute(db)
        .await?;

    tracing::info!("Seeded default admin credential");
    Ok(())
}

/// Login endpoint
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let admin: Option<Admin> = sqlx::query_as("SELECT * FROM admins ORDER BY id LIMIT 1")
        .fetch_optional(&state.db)
        .await?;

    // A missing credential row answers the same way as a wrong password
    let admin = admin.ok_or_else(ApiError::invalid_credentials)?;

    if !verify_password(&request.password, &admin.password_hash) {
        return Err(ApiError::invalid_credentials());
    }

    let token = generate_token();
    let token_hash = hash_token(&token);
    let expires_at = (chrono::Utc::now()
        + chrono::Duration::days(state.config.auth.session_ttl_days))
    .to_rfc3339();

    let session_id = uuid::Uuid::new_v4().to_string();
    sqlx::query("INSERT INTO sessions (id, admin_id, token_hash, expires_at) VALUES (?, ?, ?, ?)")
        .bind(&session_id)
        .bind(admin.id)
        .bind(&token_hash)
        .bind(&expires_at)
        .execute(&state.db)
        .await?;

    tracing::info!("Admin logged in");

    Ok(Json(LoginResponse { token, expires_at }))
}

/// Validate token endpoint
pub async fn validate(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
) -> impl IntoResponse {
    let token = match extract_token(request.headers()) {
        Some(t) => t,
        None => return StatusCode::UNAUTHORIZED,
    };

    match lookup_session(&state.db, &token).await {
        Ok(Some(_)) => StatusCode::OK,
        _ => StatusCode::UNAUTHORIZED,
    }
}

/// Logout endpoint - revokes the presented session
pub async fn logout(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
) -> Result<StatusCode, ApiError> {
    let token = extract_token(request.headers())
        .ok_or_else(|| ApiError::unauthorized("Missing bearer token"))?;

    let token_hash = hash_token(&token);
    sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
        .bind(&token_hash)
        .execute(&state.db)
        .await?;

    tracing::info!("Admin logged out");

    Ok(StatusCode::NO_CONTENT)
}

/// Look up an unexpired session for a raw token
async fn lookup_session(db: &DbPool, token: &str) -> Result<Option<Session>, sqlx::Error> {
    let token_hash = hash_token(token);
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query_as("SELECT * FROM sessions WHERE token_hash = ? AND expires_at > ?")
        .bind(&token_hash)
        .bind(&now)
        .fetch_optional(db)
        .await
}

/// Auth middleware that validates bearer tokens
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = extract_token(request.headers()).ok_or(StatusCode::UNAUTHORIZED)?;

    let session = lookup_session(&state.db, &token)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    match session {
        Some(_) => Ok(next.run(request).await),
        None => Err(StatusCode::UNAUTHORIZED),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    #[test]
    fn password_hash_roundtrip() {
        let hash = hash_password("4568").unwrap();
        assert!(verify_password("4568", &hash));
        assert!(!verify_password("wrong", &hash));
    }

    #[test]
    fn verify_rejects_garbage_hash() {
        assert!(!verify_password("4568", "not-a-phc-string"));
    }

    #[test]
    fn tokens_are_unique_and_hashes_stable() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
        assert_eq!(hash_token(&a), hash_token(&a));
        assert_ne!(hash_token(&a), hash_token(&b));
    }

    #[tokio::test]
    async fn bootstrap_is_idempotent() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::db::run_migrations(&pool).await.unwrap();

        let auth = AuthConfig::default();
        ensure_default_admin(&pool, &auth).await.unwrap();
        ensure_default_admin(&pool, &auth).await.unwrap();

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM admins")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count.0, 1);

        let admin: Admin = sqlx::query_as("SELECT * FROM admins")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert!(verify_password("4568", &admin.password_hash));
    }
}
