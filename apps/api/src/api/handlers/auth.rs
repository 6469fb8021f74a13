use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::users::{clearable, UserResponse};
use crate::api::errors::ApiError;
use crate::api::middleware::{ApiJson, AuthUser};
use crate::auth::jwt::{create_access_token, create_refresh_token, verify_token, TokenType};
use crate::auth::password::{hash_password, validate_new_password, verify_password};
use crate::config::Config;
use crate::domain::repositories::user_repository::{User, UserRepository, UserUpdate};
use crate::domain::user::{Email, Role, Username};
use crate::infrastructure::db;
use crate::infrastructure::repositories::PostgresUserRepository;

/// Request body for citizen self-registration
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password2: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Request body for obtaining tokens; `username` may also be an email
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access: String,
    pub refresh: String,
    pub user_id: Uuid,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access: String,
}

/// Own-profile update; role and activation are not accepted here
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Register a new citizen account
///
/// POST /api/auth/register
pub async fn register(
    State(pool): State<PgPool>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let username = Username::new(req.username).map_err(ApiError::bad_request)?;
    let email = Email::new(req.email).map_err(ApiError::bad_request)?;
    validate_new_password(&req.password, Some(&req.password2)).map_err(ApiError::bad_request)?;

    let user_repo = PostgresUserRepository::new(pool);
    if user_repo.email_taken(&email, None).await? {
        return Err(ApiError::bad_request("A user with that email already exists."));
    }

    let password_hash = hash_password(&req.password)
        .map_err(|e| ApiError::internal_server_error(format!("Failed to hash password: {}", e)))?;

    let mut user = User::new(username, email, password_hash, Role::Citizen);
    user.first_name = req.first_name.unwrap_or_default().trim().to_string();
    user.last_name = req.last_name.unwrap_or_default().trim().to_string();

    let user_id = user_repo.create(user.clone()).await?;
    tracing::info!(user_id = %user_id, "citizen registered");

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// Exchange credentials for an access/refresh token pair
///
/// POST /api/auth/token
pub async fn token(
    State(pool): State<PgPool>,
    State(config): State<Arc<Config>>,
    ApiJson(req): ApiJson<TokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let invalid = || ApiError::unauthorized("No active account found with the given credentials");

    let user_repo = PostgresUserRepository::new(pool);
    let user = user_repo
        .find_by_login(&req.username)
        .await?
        .ok_or_else(invalid)?;

    if !user.is_active {
        return Err(invalid());
    }

    let valid = verify_password(&req.password, &user.password_hash).map_err(|e| {
        ApiError::internal_server_error(format!("Password verification failed: {}", e))
    })?;

    if !valid {
        return Err(invalid());
    }

    if let Err(e) = user_repo.update_last_login(user.id).await {
        tracing::warn!(user_id = %user.id, error = %e, "failed to update last login");
    }

    let access = create_access_token(
        user.id,
        user.role,
        config.access_token_ttl_minutes,
        &config.jwt_secret,
    )
    .map_err(|e| ApiError::internal_server_error(format!("Failed to create token: {}", e)))?;
    let refresh = create_refresh_token(
        user.id,
        user.role,
        config.refresh_token_ttl_hours,
        &config.jwt_secret,
    )
    .map_err(|e| ApiError::internal_server_error(format!("Failed to create token: {}", e)))?;

    tracing::info!(user_id = %user.id, role = %user.role, "tokens issued");

    Ok(Json(TokenResponse {
        access,
        refresh,
        user_id: user.id,
        role: user.role,
    }))
}

/// Mint a new access token from a refresh token
///
/// The role is re-read so that role changes apply on the next refresh.
///
/// POST /api/auth/token/refresh
pub async fn refresh(
    State(pool): State<PgPool>,
    State(config): State<Arc<Config>>,
    ApiJson(req): ApiJson<RefreshRequest>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let claims = verify_token(&req.refresh, &config.jwt_secret, TokenType::Refresh)
        .map_err(|e| ApiError::unauthorized(format!("Invalid token: {}", e)))?;

    let user = PostgresUserRepository::new(pool)
        .find_by_id(claims.sub)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| ApiError::unauthorized("User not found or inactive"))?;

    let access = create_access_token(
        user.id,
        user.role,
        config.access_token_ttl_minutes,
        &config.jwt_secret,
    )
    .map_err(|e| ApiError::internal_server_error(format!("Failed to create token: {}", e)))?;

    Ok(Json(RefreshResponse { access }))
}

/// GET /api/auth/me
pub async fn me(
    user: AuthUser,
    State(pool): State<PgPool>,
) -> Result<Json<UserResponse>, ApiError> {
    let found = PostgresUserRepository::new(pool)
        .find_by_id(user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(UserResponse::from(&found)))
}

/// PATCH /api/auth/me
pub async fn update_me(
    user: AuthUser,
    State(pool): State<PgPool>,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let repo = PostgresUserRepository::new(pool);

    let mut update = UserUpdate {
        first_name: req.first_name.map(|v| v.trim().to_string()),
        last_name: req.last_name.map(|v| v.trim().to_string()),
        phone: clearable(req.phone),
        address: clearable(req.address),
        ..Default::default()
    };

    if let Some(email) = req.email {
        let email = Email::new(email).map_err(ApiError::bad_request)?;
        if repo.email_taken(&email, Some(user.id)).await? {
            return Err(ApiError::bad_request("A user with that email already exists."));
        }
        update.email = Some(email);
    }

    let updated = if update.is_empty() {
        repo.find_by_id(user.id)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))?
    } else {
        repo.update(user.id, &update).await?
    };

    Ok(Json(UserResponse::from(&updated)))
}

/// Health check endpoint
///
/// GET /health
pub async fn health_check() -> &'static str {
    "OK"
}

/// Database reachability
///
/// GET /health/db
pub async fn db_health_check(State(pool): State<PgPool>) -> Result<&'static str, ApiError> {
    if db::health_check(&pool).await {
        Ok("OK")
    } else {
        Err(ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "Database unavailable",
        ))
    }
}
