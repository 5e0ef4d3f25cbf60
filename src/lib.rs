//! authcore - credential and session-token lifecycle
//!
//! Verifies submitted passwords against stored credentials, mints and
//! verifies signed bearer tokens, and drives the forgot/reset password
//! flow. Durable storage and token delivery are external collaborators
//! behind the [`store::CredentialStore`] and [`delivery::ResetDelivery`]
//! traits.

pub mod auth;
pub mod config;
pub mod delivery;
pub mod error;
pub mod logging;
pub mod store;

pub use auth::{
    validate_password, AuthService, Claims, ConsumedTokenSet, IssuedToken, PasswordError,
    PasswordHasher, RegisterRequest, TokenCodec, TokenError, TokenPurpose,
    MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH,
};
pub use config::Config;
pub use delivery::{DeliveryError, LogDelivery, ResetDelivery};
pub use error::{AuthError, Result};
pub use store::{
    normalize_email, CredentialRecord, CredentialStore, Identity, MemoryStore, NewIdentity,
    StoreError,
};
