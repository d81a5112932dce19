//! User identity model: roles, device-type scopes, and the user aggregate.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Stable user identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
#[schema(value_type = String, example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
pub struct UserId(Uuid);

impl UserId {
    /// Generate a new random [`UserId`].
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Privilege tier and function of a user.
///
/// `Superadmin` outranks `Admin`; `Expert`, `Agent`, and `Acceptor` are
/// peers differentiated by function, not seniority.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Superadmin,
    Admin,
    Expert,
    Agent,
    Acceptor,
}

impl Role {
    /// Managers may create, edit, and delete devices.
    pub fn is_manager(self) -> bool {
        matches!(self, Self::Superadmin | Self::Admin)
    }

    /// Staff roles an admin may administer, given a device-type overlap.
    pub fn is_staff(self) -> bool {
        matches!(self, Self::Expert | Self::Agent | Self::Acceptor)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Superadmin => "superadmin",
            Self::Admin => "admin",
            Self::Expert => "expert",
            Self::Agent => "agent",
            Self::Acceptor => "acceptor",
        };
        f.write_str(name)
    }
}

/// Kind of payment terminal an actor may be scoped to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
pub enum DeviceType {
    #[serde(rename = "POS")]
    Pos,
    #[serde(rename = "ATM")]
    Atm,
    #[serde(rename = "Cashless")]
    Cashless,
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pos => "POS",
            Self::Atm => "ATM",
            Self::Cashless => "Cashless",
        };
        f.write_str(name)
    }
}

/// Returns true when two device-type scopes share at least one type.
pub fn device_types_overlap(a: &BTreeSet<DeviceType>, b: &BTreeSet<DeviceType>) -> bool {
    a.intersection(b).next().is_some()
}

/// Validation errors returned by the user constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyName,
    EmptyEmail,
    InvalidEmail,
    EmptyPhone,
    EmptyPasswordHash,
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "name must not be empty"),
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::InvalidEmail => write!(f, "email must contain a single '@' with a domain"),
            Self::EmptyPhone => write!(f, "phone must not be empty"),
            Self::EmptyPasswordHash => write!(f, "password hash must not be empty"),
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Lowercased, trimmed email address.
///
/// ## Invariants
/// - Non-empty once trimmed.
/// - Exactly one `@` with non-empty local part and domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate and normalise an email address.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let normalized = raw.as_ref().trim().to_lowercase();
        if normalized.is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        let mut parts = normalized.split('@');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(local), Some(domain), None) if !local.is_empty() && domain.contains('.') => {
                Ok(Self(normalized))
            }
            _ => Err(UserValidationError::InvalidEmail),
        }
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Inputs for creating a user record.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: EmailAddress,
    pub phone: String,
    pub role: Role,
    pub allowed_device_types: BTreeSet<DeviceType>,
    pub password_hash: String,
}

/// Application user.
///
/// ## Invariants
/// - `name` and `phone` are non-empty once trimmed.
/// - `password_hash` is never empty and never leaves the domain layer.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    id: UserId,
    name: String,
    email: EmailAddress,
    phone: String,
    role: Role,
    allowed_device_types: BTreeSet<DeviceType>,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl User {
    /// Build a user with a fresh id and creation timestamp.
    pub fn create(draft: NewUser) -> Result<Self, UserValidationError> {
        let name = non_empty(draft.name, UserValidationError::EmptyName)?;
        let phone = non_empty(draft.phone, UserValidationError::EmptyPhone)?;
        if draft.password_hash.is_empty() {
            return Err(UserValidationError::EmptyPasswordHash);
        }
        Ok(Self {
            id: UserId::random(),
            name,
            email: draft.email,
            phone,
            role: draft.role,
            allowed_device_types: draft.allowed_device_types,
            password_hash: draft.password_hash,
            created_at: Utc::now(),
        })
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    pub fn phone(&self) -> &str {
        self.phone.as_str()
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn allowed_device_types(&self) -> &BTreeSet<DeviceType> {
        &self.allowed_device_types
    }

    pub fn password_hash(&self) -> &str {
        self.password_hash.as_str()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn set_name(&mut self, name: String) -> Result<(), UserValidationError> {
        self.name = non_empty(name, UserValidationError::EmptyName)?;
        Ok(())
    }

    pub fn set_email(&mut self, email: EmailAddress) {
        self.email = email;
    }

    pub fn set_phone(&mut self, phone: String) -> Result<(), UserValidationError> {
        self.phone = non_empty(phone, UserValidationError::EmptyPhone)?;
        Ok(())
    }

    pub fn set_role(&mut self, role: Role) {
        self.role = role;
    }

    pub fn set_allowed_device_types(&mut self, types: BTreeSet<DeviceType>) {
        self.allowed_device_types = types;
    }

    pub fn set_password_hash(&mut self, hash: String) -> Result<(), UserValidationError> {
        if hash.is_empty() {
            return Err(UserValidationError::EmptyPasswordHash);
        }
        self.password_hash = hash;
        Ok(())
    }
}

fn non_empty(value: String, err: UserValidationError) -> Result<String, UserValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(err);
    }
    Ok(trimmed.to_owned())
}
