//! bcrypt-backed implementation of the password hashing port.

use crate::domain::ports::{PasswordHashError, PasswordHasher};

/// Password hasher using bcrypt.
///
/// Stored hashes carry their own cost factor, so lowering the cost (as the
/// test constructor does) never invalidates existing credentials.
#[derive(Debug, Clone, Copy)]
pub struct BcryptPasswordHasher {
    cost: u32,
}

impl BcryptPasswordHasher {
    /// Production hasher at bcrypt's default cost.
    pub fn new() -> Self {
        Self {
            cost: bcrypt::DEFAULT_COST,
        }
    }

    /// Hasher with an explicit cost. Tests use the bcrypt minimum to keep
    /// suites fast.
    pub fn with_cost(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptPasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordHasher for BcryptPasswordHasher {
    fn hash(&self, password: &str) -> Result<String, PasswordHashError> {
        bcrypt::hash(password, self.cost)
            .map_err(|err| PasswordHashError::backend(err.to_string()))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordHashError> {
        bcrypt::verify(password, hash).map_err(|err| PasswordHashError::backend(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // bcrypt's minimum cost factor, which the crate does not export.
    const TEST_COST: u32 = 4;

    #[test]
    fn hash_and_verify_round_trip() {
        let hasher = BcryptPasswordHasher::with_cost(TEST_COST);
        let hash = hasher.hash("secret").expect("hashing succeeds");
        assert!(hasher.verify("secret", &hash).expect("verify succeeds"));
        assert!(!hasher.verify("other", &hash).expect("verify succeeds"));
    }

    #[test]
    fn malformed_hashes_are_backend_errors() {
        let hasher = BcryptPasswordHasher::with_cost(TEST_COST);
        assert!(hasher.verify("secret", "not-a-hash").is_err());
    }
}
