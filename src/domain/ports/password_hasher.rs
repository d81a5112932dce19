//! Port abstraction for password hashing adapters.

/// Errors raised by password hashing adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PasswordHashError {
    /// The hashing backend rejected the input or failed internally.
    #[error("password hashing failed: {message}")]
    Backend { message: String },
}

impl PasswordHashError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}

/// Port for deriving and verifying password hashes.
///
/// Hashing is CPU-bound, so the trait is synchronous; callers on async
/// executors should move calls onto a blocking pool when latency matters.
#[cfg_attr(test, mockall::automock)]
pub trait PasswordHasher: Send + Sync {
    /// Derive a storable hash from a cleartext password.
    fn hash(&self, password: &str) -> Result<String, PasswordHashError>;

    /// Check a cleartext password against a stored hash.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordHashError>;
}
