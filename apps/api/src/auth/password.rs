// Password hashing and policy

use bcrypt::{hash, verify, DEFAULT_COST};

pub const MIN_PASSWORD_LEN: usize = 8;

/// Hashes a password using bcrypt
///
/// # Example
/// ```
/// use grievance_portal_api::auth::password::{hash_password, verify_password};
///
/// let hash = hash_password("my_password").unwrap();
/// assert!(verify_password("my_password", &hash).unwrap());
/// ```
pub fn hash_password(password: &str) -> Result<String, String> {
    hash(password, DEFAULT_COST).map_err(|e| e.to_string())
}

/// Verifies a password against a bcrypt hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, String> {
    verify(password, hash).map_err(|e| e.to_string())
}

/// Checks length and, when given, the confirmation field
pub fn validate_new_password(password: &str, confirmation: Option<&str>) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        ));
    }
    if let Some(confirmation) = confirmation {
        if confirmation != password {
            return Err("Password fields didn't match.".to_string());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_password() {
        let password = "test_password_123";
        let hash = hash_password(password).expect("valid hash");

        assert!(verify_password(password, &hash).expect("valid verification"));
        assert!(!verify_password("wrong_password", &hash).expect("valid verification"));
    }

    #[test]
    fn hash_different_outputs() {
        let password = "test_password_123";
        let hash1 = hash_password(password).expect("valid hash");
        let hash2 = hash_password(password).expect("valid hash");

        // salted
        assert_ne!(hash1, hash2);
        assert!(verify_password(password, &hash1).unwrap());
        assert!(verify_password(password, &hash2).unwrap());
    }

    #[test]
    fn password_policy() {
        assert!(validate_new_password("short", None).is_err());
        assert!(validate_new_password("long enough", None).is_ok());
        assert!(validate_new_password("long enough", Some("long enough")).is_ok());
        assert_eq!(
            validate_new_password("long enough", Some("different!")),
            Err("Password fields didn't match.".to_string())
        );
    }
}
