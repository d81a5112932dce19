//! Port abstraction for user persistence adapters.

use async_trait::async_trait;

use crate::domain::{User, UserId};

use super::RepositoryError;

/// Port for reading and writing user accounts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Persist a new user. Fails with [`RepositoryError::Duplicate`] when the
    /// email address is already registered.
    async fn insert(&self, user: &User) -> Result<(), RepositoryError>;

    /// Replace an existing user record.
    async fn update(&self, user: &User) -> Result<(), RepositoryError>;

    /// Remove a user record. Removing an absent id is not an error.
    async fn delete(&self, id: &UserId) -> Result<(), RepositoryError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError>;

    /// Fetch a user by normalised email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;

    /// List every user account.
    async fn list(&self) -> Result<Vec<User>, RepositoryError>;
}
