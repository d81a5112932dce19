//! Identity service: credential checks and actor resolution.

use std::sync::Arc;

use tracing::warn;

use crate::domain::auth::{Actor, LoginCredentials, SessionClaims};
use crate::domain::error::Error;
use crate::domain::ports::{PasswordHashError, PasswordHasher, RepositoryError, UserRepository};
use crate::domain::user::{User, UserId};

pub(crate) fn map_repository_error(error: RepositoryError) -> Error {
    match error {
        RepositoryError::Connection { message } => {
            Error::service_unavailable(format!("store unavailable: {message}"))
        }
        RepositoryError::Query { message } => Error::internal(format!("store error: {message}")),
        RepositoryError::Duplicate { field } => {
            Error::conflict(format!("a record with this {field} already exists"))
        }
    }
}

fn map_hash_error(error: PasswordHashError) -> Error {
    Error::internal(format!("credential check failed: {error}"))
}

/// Outcome of a successful login: claims for the session cookie plus the
/// authenticated user for profile rendering.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub claims: SessionClaims,
    pub user: User,
}

/// Checks credentials and resolves session claims back into actors.
#[derive(Clone)]
pub struct IdentityService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
}

impl IdentityService {
    pub fn new(users: Arc<dyn UserRepository>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { users, hasher }
    }

    /// Verify credentials and issue session claims.
    ///
    /// An unknown email and a wrong password produce the same error, so the
    /// response does not reveal which addresses hold accounts.
    pub async fn authenticate(
        &self,
        credentials: &LoginCredentials,
        remember: bool,
    ) -> Result<AuthenticatedUser, Error> {
        let rejection = || Error::unauthorized("invalid email or password");

        let user = self
            .users
            .find_by_email(credentials.email())
            .await
            .map_err(map_repository_error)?
            .ok_or_else(rejection)?;

        let verified = self
            .hasher
            .verify(credentials.password(), user.password_hash())
            .map_err(map_hash_error)?;
        if !verified {
            warn!(email = credentials.email(), "login rejected");
            return Err(rejection());
        }

        Ok(AuthenticatedUser {
            claims: SessionClaims::issue(&user, remember),
            user,
        })
    }

    /// Re-read the user behind a set of session claims and build the actor
    /// for this request. Deleted accounts invalidate outstanding sessions.
    pub async fn resolve_actor(&self, claims: &SessionClaims) -> Result<Actor, Error> {
        if claims.is_expired() {
            return Err(Error::unauthorized("session has expired"));
        }
        let user = self
            .users
            .find_by_id(&claims.user_id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::unauthorized("session user no longer exists"))?;
        Ok(Actor::from_user(&user))
    }

    /// Fetch the full profile for an authenticated user.
    pub async fn profile(&self, id: &UserId) -> Result<User, Error> {
        self.users
            .find_by_id(id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found("user not found"))
    }
}

#[cfg(test)]
#[path = "identity_service_tests.rs"]
mod tests;
