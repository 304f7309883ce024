//! Credential validation and signed session tokens.
//!
//! Users come from a static `username:password:role` list. Sessions are
//! HS256 JWTs carrying `username`, `role`, `iat` and `exp`. Signature
//! checking is delegated to `jsonwebtoken`; expiry is checked here against
//! an explicit timestamp so tests can move the clock.

use std::collections::HashSet;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use agentforge_types::auth::{User, UserRole};

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "session";

/// Session lifetime: 7 days.
pub const SESSION_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Credentials used when none are configured.
pub const DEFAULT_USERS: &str = "admin:admin123:admin,user:user123:user";

/// Signing secret used when none is configured. Not for production.
pub const DEFAULT_SECRET: &str = "agentforge-secret-key-change-in-production";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("failed to sign session token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// JWT claims of a session token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub username: String,
    pub role: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// One configured login.
pub struct UserRecord {
    username: String,
    password: SecretString,
    role: UserRole,
}

/// Parse a `user:pass:role,user:pass:role` list.
///
/// A missing role means [`UserRole::User`]. Entries without a password are
/// skipped with a warning.
pub fn parse_users(spec: &str) -> Vec<UserRecord> {
    spec.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| {
            let mut parts = entry.splitn(3, ':');
            let username = parts.next().unwrap_or_default();
            let password = parts.next().unwrap_or_default();
            if username.is_empty() || password.is_empty() {
                tracing::warn!(entry = %username, "ignoring malformed user entry");
                return None;
            }
            let role = parts
                .next()
                .map(|r| r.parse::<UserRole>().unwrap_or_default())
                .unwrap_or_default();
            Some(UserRecord {
                username: username.to_string(),
                password: SecretString::from(password.to_string()),
                role,
            })
        })
        .collect()
}

/// Validates logins and issues/verifies session tokens.
pub struct CredentialStore {
    users: Vec<UserRecord>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl CredentialStore {
    pub fn new(users: Vec<UserRecord>, secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            users,
            encoding_key: EncodingKey::from_secret(bytes),
            decoding_key: DecodingKey::from_secret(bytes),
        }
    }

    /// Check a username/password pair against the configured list.
    pub fn validate(&self, username: &str, password: &str) -> Option<User> {
        self.users
            .iter()
            .find(|u| u.username == username && u.password.expose_secret() == password)
            .map(|u| User {
                username: u.username.clone(),
                role: u.role,
            })
    }

    /// Issue a session token valid for [`SESSION_TTL_SECS`].
    pub fn issue(&self, user: &User) -> Result<String, AuthError> {
        self.issue_at(user, chrono::Utc::now().timestamp())
    }

    pub fn issue_at(&self, user: &User, now: i64) -> Result<String, AuthError> {
        let claims = SessionClaims {
            username: user.username.clone(),
            role: user.role.to_string(),
            iat: now,
            exp: now + SESSION_TTL_SECS,
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?)
    }

    /// Resolve a session token. Any failure (bad signature, malformed,
    /// expired) yields `None`.
    pub fn verify(&self, token: &str) -> Option<User> {
        self.verify_at(token, chrono::Utc::now().timestamp())
    }

    pub fn verify_at(&self, token: &str, now: i64) -> Option<User> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.required_spec_claims = HashSet::from(["exp".to_string()]);

        let claims = match decode::<SessionClaims>(token, &self.decoding_key, &validation) {
            Ok(data) => data.claims,
            Err(e) => {
                tracing::debug!(error = %e, "rejected session token");
                return None;
            }
        };

        if claims.exp <= now {
            tracing::debug!(username = %claims.username, "session token expired");
            return None;
        }

        Some(User {
            username: claims.username,
            role: claims.role.parse().unwrap_or_default(),
        })
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("users", &self.users.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> CredentialStore {
        CredentialStore::new(
            parse_users(DEFAULT_USERS),
            &SecretString::from("test-secret".to_string()),
        )
    }

    #[test]
    fn test_parse_users() {
        let users = parse_users(" alice:pw:admin , bob:secret ,broken, :nopass:user,carol:x:wizard");
        let summary: Vec<(&str, UserRole)> =
            users.iter().map(|u| (u.username.as_str(), u.role)).collect();
        assert_eq!(
            summary,
            vec![
                ("alice", UserRole::Admin),
                ("bob", UserRole::User),
                ("carol", UserRole::User),
            ]
        );
    }

    #[test]
    fn test_validate() {
        let store = store();
        let admin = store.validate("admin", "admin123").unwrap();
        assert_eq!(admin.role, UserRole::Admin);
        assert_eq!(store.validate("user", "user123").unwrap().role, UserRole::User);
        assert!(store.validate("admin", "wrong").is_none());
        assert!(store.validate("nobody", "admin123").is_none());
    }

    #[test]
    fn test_issue_and_verify() {
        let store = store();
        let user = store.validate("admin", "admin123").unwrap();
        let token = store.issue_at(&user, 1_700_000_000).unwrap();

        assert_eq!(store.verify_at(&token, 1_700_000_001), Some(user));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let store = store();
        let user = store.validate("user", "user123").unwrap();
        let issued = 1_700_000_000;
        let token = store.issue_at(&user, issued).unwrap();

        assert!(store.verify_at(&token, issued + SESSION_TTL_SECS - 1).is_some());
        assert!(store.verify_at(&token, issued + SESSION_TTL_SECS).is_none());
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let store = store();
        let user = store.validate("user", "user123").unwrap();
        let token = store.issue(&user).unwrap();

        // Flip a character in the payload segment.
        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        let payload = parts[1].clone();
        let flipped = if payload.starts_with('e') { 'f' } else { 'e' };
        parts[1] = format!("{flipped}{}", &payload[1..]);
        assert!(store.verify(&parts.join(".")).is_none());

        assert!(store.verify("not-a-token").is_none());
    }

    #[test]
    fn test_token_from_other_secret_is_rejected() {
        let other = CredentialStore::new(
            parse_users(DEFAULT_USERS),
            &SecretString::from("another-secret".to_string()),
        );
        let user = other.validate("admin", "admin123").unwrap();
        let token = other.issue(&user).unwrap();

        assert!(store().verify(&token).is_none());
    }

    #[test]
    fn test_debug_hides_credentials() {
        let rendered = format!("{:?}", store());
        assert!(!rendered.contains("admin123"));
        assert!(!rendered.contains("test-secret"));
    }
}
