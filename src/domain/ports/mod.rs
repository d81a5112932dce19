//! Domain ports and supporting types for the hexagonal boundary.

mod blob_store;
mod device_repository;
mod notifier;
mod password_hasher;
mod ticket_repository;
mod user_repository;

pub use blob_store::{BlobStore, BlobStoreError, FileUpload};
pub use device_repository::DeviceRepository;
pub use notifier::Notifier;
pub use password_hasher::{PasswordHashError, PasswordHasher};
pub use ticket_repository::TicketRepository;
pub use user_repository::UserRepository;

#[cfg(test)]
pub use blob_store::MockBlobStore;
#[cfg(test)]
pub use device_repository::MockDeviceRepository;
#[cfg(test)]
pub use notifier::MockNotifier;
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
#[cfg(test)]
pub use ticket_repository::MockTicketRepository;
#[cfg(test)]
pub use user_repository::MockUserRepository;

/// Errors raised by repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    /// Store connection could not be established.
    #[error("repository connection failed: {message}")]
    Connection { message: String },
    /// Query or mutation failed during execution.
    #[error("repository query failed: {message}")]
    Query { message: String },
    /// A unique field already holds the submitted value.
    #[error("duplicate value for unique field `{field}`")]
    Duplicate { field: String },
}

impl RepositoryError {
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>) -> Self {
        Self::Duplicate {
            field: field.into(),
        }
    }
}
