use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Email value object representing a valid email address
///
/// # Invariants
/// - Must contain '@' character
/// - Must be at least 3 characters long
/// - Surrounding whitespace is trimmed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    /// Creates a new Email value object
    ///
    /// # Example
    /// ```
    /// use grievance_portal_api::domain::user::value_objects::Email;
    ///
    /// let email = Email::new("citizen@example.com").expect("valid email");
    /// assert_eq!(email.as_str(), "citizen@example.com");
    /// ```
    pub fn new(email: impl Into<String>) -> Result<Self, String> {
        let email = email.into().trim().to_string();
        if Self::is_valid(&email) {
            Ok(Email(email))
        } else {
            Err(format!("Invalid email: {}", email))
        }
    }

    fn is_valid(email: &str) -> bool {
        email.contains('@') && email.len() >= 3
    }

    /// Returns the email as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Login name of a user
///
/// # Invariants
/// - 3 to 150 characters
/// - Letters, digits and `@ . + - _` only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Username(String);

impl Username {
    pub const MIN_LEN: usize = 3;
    pub const MAX_LEN: usize = 150;

    /// Creates a new Username value object
    ///
    /// # Example
    /// ```
    /// use grievance_portal_api::domain::user::value_objects::Username;
    ///
    /// assert!(Username::new("asha.k").is_ok());
    /// assert!(Username::new("no spaces").is_err());
    /// ```
    pub fn new(username: impl Into<String>) -> Result<Self, String> {
        let username = username.into().trim().to_string();
        let len = username.chars().count();
        if len < Self::MIN_LEN || len > Self::MAX_LEN {
            return Err(format!(
                "Username must be between {} and {} characters",
                Self::MIN_LEN,
                Self::MAX_LEN
            ));
        }
        if !username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
        {
            return Err("Username may only contain letters, digits and @/./+/-/_".to_string());
        }
        Ok(Username(username))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Portal role of a user
///
/// Officers and admins together are "staff".
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Files grievances and rates their resolution
    #[default]
    Citizen,
    /// Works on assigned grievances
    Officer,
    /// Manages users, catalog and assignments
    Admin,
}

impl Role {
    pub fn is_citizen(&self) -> bool {
        *self == Role::Citizen
    }

    pub fn is_officer(&self) -> bool {
        *self == Role::Officer
    }

    pub fn is_admin(&self) -> bool {
        *self == Role::Admin
    }

    /// Officers and admins
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Officer | Role::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Citizen => "citizen",
            Role::Officer => "officer",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "citizen" => Ok(Role::Citizen),
            "officer" => Ok(Role::Officer),
            "admin" => Ok(Role::Admin),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}
