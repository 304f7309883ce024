//! Authenticated user identity.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A user resolved from credentials or a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub role: UserRole,
}

/// Coarse authorization role. Anything unrecognised is treated as [`UserRole::User`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    #[default]
    User,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Admin => write!(f, "admin"),
            UserRole::User => write!(f, "user"),
        }
    }
}

impl FromStr for UserRole {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "admin" => UserRole::Admin,
            _ => UserRole::User,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_role_falls_back_to_user() {
        assert_eq!("ADMIN".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert_eq!("editor".parse::<UserRole>().unwrap(), UserRole::User);
        assert_eq!("".parse::<UserRole>().unwrap(), UserRole::User);
    }
}
