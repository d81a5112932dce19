//! In-process user repository with a unique-email constraint.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::ports::{RepositoryError, UserRepository};
use crate::domain::{User, UserId};

/// Map-backed [`UserRepository`].
#[derive(Debug, Default)]
pub struct MemoryUserRepository {
    records: RwLock<HashMap<UserId, User>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> RepositoryError {
    RepositoryError::connection("user store lock poisoned")
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn insert(&self, user: &User) -> Result<(), RepositoryError> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        if records
            .values()
            .any(|existing| existing.email() == user.email())
        {
            return Err(RepositoryError::duplicate("email"));
        }
        records.insert(user.id(), user.clone());
        Ok(())
    }

    async fn update(&self, user: &User) -> Result<(), RepositoryError> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        if records
            .values()
            .any(|existing| existing.id() != user.id() && existing.email() == user.email())
        {
            return Err(RepositoryError::duplicate("email"));
        }
        records.insert(user.id(), user.clone());
        Ok(())
    }

    async fn delete(&self, id: &UserId) -> Result<(), RepositoryError> {
        let mut records = self.records.write().map_err(|_| poisoned())?;
        records.remove(id);
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        let records = self.records.read().map_err(|_| poisoned())?;
        Ok(records.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let records = self.records.read().map_err(|_| poisoned())?;
        Ok(records
            .values()
            .find(|user| user.email().as_ref() == email)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let records = self.records.read().map_err(|_| poisoned())?;
        let mut users: Vec<_> = records.values().cloned().collect();
        users.sort_by_key(User::created_at);
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::domain::{DeviceType, EmailAddress, NewUser, Role};

    fn user(email: &str) -> User {
        User::create(NewUser {
            name: "Sara".into(),
            email: EmailAddress::new(email).expect("valid email"),
            phone: "0912".into(),
            role: Role::Agent,
            allowed_device_types: BTreeSet::from([DeviceType::Pos]),
            password_hash: "$2b$10$hash".into(),
        })
        .expect("valid draft")
    }

    #[actix_rt::test]
    async fn insert_rejects_duplicate_emails() {
        let repo = MemoryUserRepository::new();
        repo.insert(&user("sara@example.com")).await.expect("first insert");
        let err = repo
            .insert(&user("sara@example.com"))
            .await
            .expect_err("duplicate rejected");
        assert_eq!(err, RepositoryError::duplicate("email"));
    }

    #[actix_rt::test]
    async fn update_allows_keeping_ones_own_email() {
        let repo = MemoryUserRepository::new();
        let mut stored = user("sara@example.com");
        repo.insert(&stored).await.expect("insert");
        stored.set_phone("0935".into()).expect("valid phone");
        repo.update(&stored).await.expect("update succeeds");
        let reloaded = repo
            .find_by_id(&stored.id())
            .await
            .expect("read")
            .expect("present");
        assert_eq!(reloaded.phone(), "0935");
    }

    #[actix_rt::test]
    async fn find_by_email_matches_normalised_addresses() {
        let repo = MemoryUserRepository::new();
        let stored = user("sara@example.com");
        repo.insert(&stored).await.expect("insert");
        let found = repo
            .find_by_email("sara@example.com")
            .await
            .expect("read");
        assert_eq!(found.map(|u| u.id()), Some(stored.id()));
    }

    #[actix_rt::test]
    async fn delete_is_idempotent() {
        let repo = MemoryUserRepository::new();
        let stored = user("sara@example.com");
        repo.insert(&stored).await.expect("insert");
        repo.delete(&stored.id()).await.expect("first delete");
        repo.delete(&stored.id()).await.expect("second delete");
        assert!(repo.find_by_id(&stored.id()).await.expect("read").is_none());
    }
}
