// JWT token creation and verification
// Access tokens authenticate requests; refresh tokens only mint new access tokens

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::user::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims structure
///
/// # Fields
/// * `sub` - Subject (user_id)
/// * `role` - Role at issue time, used for route authorization
/// * `token_type` - Access or refresh
/// * `exp` - Expiry time (seconds since epoch)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub token_type: TokenType,
    pub exp: usize,
}

fn create_token(
    user_id: Uuid,
    role: Role,
    token_type: TokenType,
    ttl: Duration,
    secret: &str,
) -> Result<String, String> {
    let expiry = Utc::now() + ttl;
    let claims = Claims {
        sub: user_id,
        role,
        token_type,
        exp: expiry.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .map_err(|e| e.to_string())
}

/// Creates an access token valid for `ttl_minutes`
///
/// # Example
/// ```
/// use grievance_portal_api::auth::jwt::{create_access_token, verify_token, TokenType};
/// use grievance_portal_api::domain::user::Role;
/// use uuid::Uuid;
///
/// let user_id = Uuid::new_v4();
/// let token = create_access_token(user_id, Role::Officer, 60, "secret").unwrap();
/// let claims = verify_token(&token, "secret", TokenType::Access).unwrap();
/// assert_eq!(claims.sub, user_id);
/// assert_eq!(claims.role, Role::Officer);
/// ```
pub fn create_access_token(
    user_id: Uuid,
    role: Role,
    ttl_minutes: i64,
    secret: &str,
) -> Result<String, String> {
    create_token(
        user_id,
        role,
        TokenType::Access,
        Duration::minutes(ttl_minutes),
        secret,
    )
}

/// Creates a refresh token valid for `ttl_hours`
pub fn create_refresh_token(
    user_id: Uuid,
    role: Role,
    ttl_hours: i64,
    secret: &str,
) -> Result<String, String> {
    create_token(
        user_id,
        role,
        TokenType::Refresh,
        Duration::hours(ttl_hours),
        secret,
    )
}

/// Verifies a token's signature and expiry and that it is of the `expected` type
pub fn verify_token(token: &str, secret: &str, expected: TokenType) -> Result<Claims, String> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())?;

    if claims.token_type != expected {
        return Err(format!(
            "expected {} token",
            match expected {
                TokenType::Access => "an access",
                TokenType::Refresh => "a refresh",
            }
        ));
    }

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "test-secret-key-for-unit-tests";

    #[test]
    fn create_and_verify_access_token() {
        let user_id = Uuid::new_v4();
        let token = create_access_token(user_id, Role::Admin, 480, TEST_SECRET).expect("valid token");

        let claims = verify_token(&token, TEST_SECRET, TokenType::Access).expect("valid verification");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.token_type, TokenType::Access);
    }

    #[test]
    fn token_type_is_enforced() {
        let user_id = Uuid::new_v4();
        let access = create_access_token(user_id, Role::Citizen, 480, TEST_SECRET).unwrap();
        let refresh = create_refresh_token(user_id, Role::Citizen, 24, TEST_SECRET).unwrap();

        assert!(verify_token(&access, TEST_SECRET, TokenType::Refresh).is_err());
        assert!(verify_token(&refresh, TEST_SECRET, TokenType::Access).is_err());
        assert!(verify_token(&refresh, TEST_SECRET, TokenType::Refresh).is_ok());
    }

    #[test]
    fn wrong_secret_fails() {
        let token = create_access_token(Uuid::new_v4(), Role::Citizen, 480, TEST_SECRET).unwrap();
        assert!(verify_token(&token, "wrong-secret", TokenType::Access).is_err());
    }

    #[test]
    fn invalid_token_fails() {
        assert!(verify_token("invalid.token.string", TEST_SECRET, TokenType::Access).is_err());
    }

    #[test]
    fn expired_token_fails() {
        // beyond the default 60 second leeway
        let token = create_token(
            Uuid::new_v4(),
            Role::Citizen,
            TokenType::Access,
            Duration::minutes(-5),
            TEST_SECRET,
        )
        .unwrap();
        assert!(verify_token(&token, TEST_SECRET, TokenType::Access).is_err());
    }

    #[test]
    fn token_expiry_set() {
        let token = create_access_token(Uuid::new_v4(), Role::Officer, 480, TEST_SECRET).unwrap();

        let claims = verify_token(&token, TEST_SECRET, TokenType::Access).unwrap();
        let expiry_time = claims.exp as i64;
        let now = Utc::now().timestamp();
        let in_8_hours = (Utc::now() + Duration::hours(8)).timestamp();

        assert!(expiry_time > now);
        assert!(expiry_time <= in_8_hours + 10);
    }
}
