use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::auth::jwt::{verify_token, TokenType};
use crate::config::Config;
use crate::domain::repositories::UserRepository;
use crate::domain::user::Role;
use crate::infrastructure::repositories::PostgresUserRepository;

/// Authenticated caller, taken from a bearer access token
///
/// The account is reloaded on every request: deactivated or deleted users
/// are rejected with 401 and the role is the stored one, not the token claim.
///
/// Usage:
/// ```rust,ignore
/// async fn protected_handler(user: AuthUser) -> Result<String, ApiError> {
///     user.require_staff()?;
///     Ok(format!("Hello user {}", user.id))
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

impl AuthUser {
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.role.is_admin() {
            Ok(())
        } else {
            Err(ApiError::forbidden(
                "You do not have permission to perform this action.",
            ))
        }
    }

    /// Officers and admins
    pub fn require_staff(&self) -> Result<(), ApiError> {
        if self.role.is_staff() {
            Ok(())
        } else {
            Err(ApiError::forbidden(
                "You do not have permission to perform this action.",
            ))
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    Arc<Config>: FromRef<S>,
    PgPool: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Missing authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::unauthorized("Invalid authorization format. Use: Bearer <token>"))?;

        let config = Arc::<Config>::from_ref(state);
        let claims = verify_token(token, &config.jwt_secret, TokenType::Access)
            .map_err(|e| ApiError::unauthorized(format!("Invalid token: {}", e)))?;

        let pool = PgPool::from_ref(state);
        let account = PostgresUserRepository::new(pool)
            .find_by_id(claims.sub)
            .await?
            .filter(|account| account.is_active)
            .ok_or_else(|| ApiError::unauthorized("User not found or inactive"))?;

        Ok(AuthUser {
            id: account.id,
            role: account.role,
        })
    }
}
