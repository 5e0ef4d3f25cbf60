//! Error types for authcore.

use thiserror::Error;

/// Crate-level error type exposed by the authentication flows.
///
/// Security-sensitive distinctions (unknown email vs. wrong password,
/// expired vs. forged token) are collapsed into a single variant here;
/// the precise internal kind is logged, never returned.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Wrong password or unknown email. Deliberately indistinguishable.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Registration attempted with an email that is already taken.
    #[error("identity already exists")]
    DuplicateIdentity,

    /// Reset token failed verification, was already consumed, or named
    /// an identity that no longer exists.
    #[error("invalid or expired reset token")]
    InvalidResetToken,

    /// Session token failed verification.
    #[error("unauthorized")]
    Unauthorized,

    /// The credential store was unreachable or timed out. Retryable.
    #[error("credential store unavailable: {0}")]
    StoreUnavailable(String),

    /// A stored password hash could not be parsed. Data integrity
    /// problem, not retryable and not the caller's fault.
    #[error("stored credential hash is malformed")]
    MalformedStoredHash,

    /// Submitted password failed the length policy.
    #[error("password policy violation: {0}")]
    PasswordPolicy(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Unexpected internal failure (e.g. token encoding).
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Whether the caller may retry the operation unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AuthError::StoreUnavailable(_))
    }
}

/// Result type alias for authcore operations.
pub type Result<T> = std::result::Result<T, AuthError>;
