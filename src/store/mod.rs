//! Credential store interface for authcore.
//!
//! The durable (identity, password-hash) store is an external collaborator;
//! this module defines the narrow trait the flows consume plus the record
//! types that cross it. Implementations must make each operation atomic at
//! the record level.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use thiserror::Error;

/// An identity known to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Unique identity id.
    pub id: i64,
    /// Email address (unique, stored lowercased).
    pub email: String,
    /// Display name.
    pub name: String,
}

/// An identity together with its stored password hash.
///
/// The hash is always PasswordHasher output, never a plaintext password.
#[derive(Debug, Clone)]
pub struct CredentialRecord {
    /// The identity this credential belongs to.
    pub identity: Identity,
    /// PHC-formatted password hash.
    pub password_hash: String,
}

/// Profile fields for creating a new identity.
#[derive(Debug, Clone)]
pub struct NewIdentity {
    /// Email address.
    pub email: String,
    /// Display name.
    pub name: String,
}

impl NewIdentity {
    /// Create a new identity request.
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
        }
    }
}

/// Store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store could not be reached. Retryable.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// An identity with the given email already exists.
    #[error("email already registered")]
    DuplicateEmail,

    /// No identity with the given id exists.
    #[error("identity not found")]
    NotFound,
}

/// Normalize an email for storage and lookup.
///
/// Email comparison is case-insensitive throughout the crate.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Lookup and update of durable credential records.
///
/// Operations for the same identity are serialized by the implementation's
/// own transactional guarantee; the flows never hold locks across calls.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Find a credential record by email (case-insensitive).
    async fn find_by_email(&self, email: &str) -> Result<Option<CredentialRecord>, StoreError>;

    /// Find a credential record by identity id.
    async fn find_by_id(&self, id: i64) -> Result<Option<CredentialRecord>, StoreError>;

    /// Atomically create an identity with its credential.
    ///
    /// Fails with `DuplicateEmail` if the email is already registered,
    /// including under concurrent registration of the same email.
    async fn create(
        &self,
        profile: NewIdentity,
        password_hash: String,
    ) -> Result<Identity, StoreError>;

    /// Replace the stored hash for an identity.
    async fn update_hash(&self, id: i64, new_hash: String) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("A@X.Com"), "a@x.com");
        assert_eq!(normalize_email("  a@x.com "), "a@x.com");
    }

    #[test]
    fn test_store_error_display() {
        assert_eq!(
            StoreError::Unavailable("timeout".to_string()).to_string(),
            "store unavailable: timeout"
        );
        assert_eq!(
            StoreError::DuplicateEmail.to_string(),
            "email already registered"
        );
        assert_eq!(StoreError::NotFound.to_string(), "identity not found");
    }
}
