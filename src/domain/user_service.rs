//! User directory service: account CRUD under the authorization engine.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::info;

use crate::domain::auth::Actor;
use crate::domain::authz::{self, UserEditScope, UserListScope};
use crate::domain::error::Error;
use crate::domain::identity_service::map_repository_error;
use crate::domain::ports::{PasswordHasher, UserRepository};
use crate::domain::user::{DeviceType, EmailAddress, NewUser, Role, User, UserId};

fn map_validation(err: crate::domain::user::UserValidationError) -> Error {
    Error::invalid_request(err.to_string())
}

/// Inputs for creating an account.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub email: EmailAddress,
    pub phone: String,
    pub role: Role,
    pub allowed_device_types: BTreeSet<DeviceType>,
    pub password: String,
}

/// Full-record update. Clients send every field; the edit scope decides
/// which of them may differ from the stored record. `password` is optional
/// and leaves the stored hash untouched when absent or blank.
#[derive(Debug, Clone)]
pub struct UpdateUser {
    pub name: String,
    pub email: EmailAddress,
    pub phone: String,
    pub role: Role,
    pub allowed_device_types: BTreeSet<DeviceType>,
    pub password: Option<String>,
}

/// Account CRUD behind the authorization engine.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { users, hasher }
    }

    /// List the slice of the directory the actor may see.
    pub async fn list(&self, actor: &Actor) -> Result<Vec<User>, Error> {
        let all = self.users.list().await.map_err(map_repository_error)?;
        let visible = match authz::user_list_scope(actor) {
            UserListScope::All => all,
            UserListScope::SelfAndSubordinates => all
                .into_iter()
                .filter(|u| u.id() == actor.id || authz::is_subordinate(actor, u))
                .collect(),
            UserListScope::SelfOnly => all.into_iter().filter(|u| u.id() == actor.id).collect(),
        };
        Ok(visible)
    }

    /// Fetch one account, subject to the same visibility as listing.
    pub async fn get(&self, actor: &Actor, id: &UserId) -> Result<User, Error> {
        let user = self.find_required(id).await?;
        let visible = match authz::user_list_scope(actor) {
            UserListScope::All => true,
            UserListScope::SelfAndSubordinates => {
                user.id() == actor.id || authz::is_subordinate(actor, &user)
            }
            UserListScope::SelfOnly => user.id() == actor.id,
        };
        if visible {
            Ok(user)
        } else {
            Err(Error::forbidden("you may not view this user"))
        }
    }

    /// Create an account on behalf of a manager.
    pub async fn create(&self, actor: &Actor, request: CreateUser) -> Result<User, Error> {
        authz::can_create_user(actor, request.role, &request.allowed_device_types)?;
        if request.password.is_empty() {
            return Err(Error::invalid_request("password must not be empty"));
        }
        let password_hash = self
            .hasher
            .hash(&request.password)
            .map_err(|err| Error::internal(format!("password hashing failed: {err}")))?;
        let user = User::create(NewUser {
            name: request.name,
            email: request.email,
            phone: request.phone,
            role: request.role,
            allowed_device_types: request.allowed_device_types,
            password_hash,
        })
        .map_err(map_validation)?;
        self.users
            .insert(&user)
            .await
            .map_err(map_repository_error)?;
        info!(user_id = %user.id(), role = %user.role(), "user created");
        Ok(user)
    }

    /// Apply a full-record update within the actor's edit scope.
    ///
    /// Fields outside the scope must match the stored record; a differing
    /// out-of-scope field is a denial rather than a silent no-op.
    pub async fn update(
        &self,
        actor: &Actor,
        id: &UserId,
        request: UpdateUser,
    ) -> Result<User, Error> {
        let mut user = self.find_required(id).await?;
        let scope = authz::user_edit_scope(actor, &user)?;

        let role_writable = matches!(scope, UserEditScope::Full);
        if !role_writable && request.role != user.role() {
            return Err(Error::forbidden("you may not change this user's role"));
        }
        let profile_writable =
            matches!(scope, UserEditScope::Full | UserEditScope::FullExceptOwnRole);
        let contact_writable = profile_writable || scope == UserEditScope::ContactAndPassword;
        if !profile_writable
            && (request.name != user.name()
                || request.allowed_device_types != *user.allowed_device_types())
        {
            return Err(Error::forbidden(
                "you may not change this user's name or device types",
            ));
        }
        if !contact_writable
            && (request.email != *user.email() || request.phone != user.phone())
        {
            return Err(Error::forbidden(
                "you may not change this user's contact details",
            ));
        }

        if profile_writable {
            user.set_name(request.name).map_err(map_validation)?;
            user.set_allowed_device_types(request.allowed_device_types);
        }
        if role_writable {
            user.set_role(request.role);
        }
        if contact_writable {
            user.set_email(request.email);
            user.set_phone(request.phone).map_err(map_validation)?;
        }
        if let Some(password) = request.password.filter(|p| !p.is_empty()) {
            let hash = self
                .hasher
                .hash(&password)
                .map_err(|err| Error::internal(format!("password hashing failed: {err}")))?;
            user.set_password_hash(hash).map_err(map_validation)?;
        }

        self.users
            .update(&user)
            .await
            .map_err(map_repository_error)?;
        Ok(user)
    }

    /// Delete an account. Self-deletion is always denied.
    pub async fn delete(&self, actor: &Actor, id: &UserId) -> Result<(), Error> {
        let user = self.find_required(id).await?;
        authz::can_delete_user(actor, &user)?;
        self.users.delete(id).await.map_err(map_repository_error)?;
        info!(user_id = %id, "user deleted");
        Ok(())
    }

    async fn find_required(&self, id: &UserId) -> Result<User, Error> {
        self.users
            .find_by_id(id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found("user not found"))
    }
}

#[cfg(test)]
#[path = "user_service_tests.rs"]
mod tests;
