//! Authentication module for authcore.
//!
//! This module provides password hashing, signed bearer tokens, and the
//! login / register / forgot / reset flows.

mod password;
mod service;
mod token;

pub use password::{
    validate_password, PasswordError, PasswordHasher, MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH,
};
pub use service::{AuthService, ConsumedTokenSet, IssuedToken, RegisterRequest};
pub use token::{Claims, TokenCodec, TokenError, TokenPurpose};
