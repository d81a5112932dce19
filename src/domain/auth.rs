//! Authentication primitives: login credentials, session claims, actors.
//!
//! Keep inbound payload parsing outside the domain by exposing constructors
//! that validate string inputs before a handler talks to a port or service.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::domain::user::{DeviceType, Role, User, UserId};

/// Lifetime of an interactive login session.
pub fn session_lifetime() -> Duration {
    Duration::hours(12)
}

/// Lifetime of a remember-me session.
pub fn remember_me_lifetime() -> Duration {
    Duration::days(7)
}

/// Domain error returned when login payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginValidationError {
    /// Email was missing or blank once trimmed.
    EmptyEmail,
    /// Password was blank.
    EmptyPassword,
}

impl fmt::Display for LoginValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
        }
    }
}

impl std::error::Error for LoginValidationError {}

/// Validated login credentials used by the identity service.
///
/// ## Invariants
/// - `email` is trimmed and lowercased, and must not be empty after trimming.
/// - `password` is required to be non-empty but retains caller-provided
///   whitespace to avoid surprising credential comparisons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, LoginValidationError> {
        let normalized = email.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(LoginValidationError::EmptyEmail);
        }

        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }

        Ok(Self {
            email: normalized,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Email string suitable for user lookups.
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Password string provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Claims persisted in the signed session cookie.
///
/// Every request revalidates `expires_at`; expired claims are treated the
/// same as missing ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    pub user_id: UserId,
    pub role: Role,
    pub name: String,
    pub expires_at: DateTime<Utc>,
}

impl SessionClaims {
    /// Issue claims for a user, with the remember-me flag extending the
    /// lifetime from 12 hours to 7 days.
    pub fn issue(user: &User, remember: bool) -> Self {
        let lifetime = if remember {
            remember_me_lifetime()
        } else {
            session_lifetime()
        };
        Self {
            user_id: user.id(),
            role: user.role(),
            name: user.name().to_owned(),
            expires_at: Utc::now() + lifetime,
        }
    }

    /// Whether the claims are past their expiry instant.
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// The authenticated identity performing an operation, carrying role and
/// allowed-device-type claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: UserId,
    pub role: Role,
    pub name: String,
    pub allowed_device_types: BTreeSet<DeviceType>,
}

impl Actor {
    /// Derive an actor from a freshly loaded user record.
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id(),
            role: user.role(),
            name: user.name().to_owned(),
            allowed_device_types: user.allowed_device_types().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::{EmailAddress, NewUser};
    use rstest::rstest;

    fn user(role: Role) -> User {
        User::create(NewUser {
            name: "Sara".into(),
            email: EmailAddress::new("sara@example.com").expect("valid email"),
            phone: "0912".into(),
            role,
            allowed_device_types: BTreeSet::from([DeviceType::Pos]),
            password_hash: "$2b$10$hash".into(),
        })
        .expect("valid draft")
    }

    #[rstest]
    #[case("  Sara@Example.com ", "pw", Ok(()))]
    #[case("   ", "pw", Err(LoginValidationError::EmptyEmail))]
    #[case("sara@example.com", "", Err(LoginValidationError::EmptyPassword))]
    fn credential_validation(
        #[case] email: &str,
        #[case] password: &str,
        #[case] expected: Result<(), LoginValidationError>,
    ) {
        let result = LoginCredentials::try_from_parts(email, password).map(|_| ());
        assert_eq!(result, expected);
    }

    #[test]
    fn credentials_normalise_email() {
        let creds =
            LoginCredentials::try_from_parts("  Sara@Example.com ", "pw").expect("valid creds");
        assert_eq!(creds.email(), "sara@example.com");
        assert_eq!(creds.password(), "pw");
    }

    #[test]
    fn remember_me_extends_the_session() {
        let user = user(Role::Agent);
        let short = SessionClaims::issue(&user, false);
        let long = SessionClaims::issue(&user, true);
        assert!(long.expires_at > short.expires_at);
        assert!(!short.is_expired());
    }

    #[test]
    fn actor_carries_the_user_scope() {
        let user = user(Role::Expert);
        let actor = Actor::from_user(&user);
        assert_eq!(actor.id, user.id());
        assert_eq!(actor.role, Role::Expert);
        assert_eq!(actor.allowed_device_types.len(), 1);
    }
}
