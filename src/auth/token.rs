//! Signed bearer tokens for authcore.
//!
//! Tokens are compact, URL-safe JWS strings (HS256). Each token purpose
//! carries its own issuer/audience pair, so a reset token can never be
//! accepted where a session token is expected and vice versa.

use std::time::Duration;

use jsonwebtoken::{
    decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::store::Identity;

/// Token verification and issuance errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TokenError {
    /// Signature does not match the token contents.
    #[error("invalid token signature")]
    InvalidSignature,

    /// The token's expiry is in the past.
    #[error("token expired")]
    Expired,

    /// The token was issued by a different issuer than expected.
    #[error("token issuer mismatch")]
    IssuerMismatch,

    /// The token was issued for a different audience than expected.
    #[error("token audience mismatch")]
    AudienceMismatch,

    /// The token is not a well-formed JWS or lacks required claims.
    #[error("malformed token")]
    Malformed,

    /// Token encoding failed.
    #[error("token encoding failed: {0}")]
    Encoding(String),
}

/// Token purpose.
///
/// Determines the issuer/audience pair embedded in the token, scoping it to
/// exactly one use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPurpose {
    /// Authenticated session (bearer token for API access).
    Session,
    /// Password reset (single-use, short-lived).
    Reset,
}

impl TokenPurpose {
    /// Issuer claim value for this purpose.
    pub fn issuer(&self) -> &'static str {
        match self {
            TokenPurpose::Session => "login",
            TokenPurpose::Reset => "reset",
        }
    }

    /// Audience claim value for this purpose.
    pub fn audience(&self) -> &'static str {
        match self {
            TokenPurpose::Session => "users",
            TokenPurpose::Reset => "recovery",
        }
    }
}

/// Claims carried by an issued token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Identity id.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Subject (identity id as string).
    pub sub: String,
    /// Issuer.
    pub iss: String,
    /// Audience.
    pub aud: String,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: u64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: u64,
    /// Token ID (unique per token; the single-use nonce for reset tokens).
    pub jti: String,
}

/// Signs and verifies tokens with a process-wide secret.
///
/// The key material is loaded once at startup and never logged. All
/// operations are pure in-memory computation.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenCodec {
    /// Create a codec from the configured signing secret.
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issue a token for an identity, scoped to a purpose, valid for `ttl`.
    pub fn issue(
        &self,
        identity: &Identity,
        purpose: TokenPurpose,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        let now = chrono::Utc::now().timestamp() as u64;
        let claims = Claims {
            id: identity.id,
            name: identity.name.clone(),
            email: identity.email.clone(),
            sub: identity.id.to_string(),
            iss: purpose.issuer().to_string(),
            aud: purpose.audience().to_string(),
            iat: now,
            exp: now + ttl.as_secs(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Verify a token against the expected purpose.
    ///
    /// Returns the embedded claims on success. Verification depends only on
    /// the token, the signing key, and the current time.
    pub fn verify(&self, token: &str, purpose: TokenPurpose) -> Result<Claims, TokenError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[purpose.issuer()]);
        validation.set_audience(&[purpose.audience()]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        // Exact expiry; the default 60s leeway would keep expired
        // reset tokens alive past their window.
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidIssuer => TokenError::IssuerMismatch,
                ErrorKind::InvalidAudience => TokenError::AudienceMismatch,
                _ => TokenError::Malformed,
            }
        })?;

        Ok(data.claims)
    }

    /// Convenience wrapper that swallows all verification failures.
    pub fn is_valid(&self, token: &str, purpose: TokenPurpose) -> bool {
        self.verify(token, purpose).is_ok()
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Key material must never leak through Debug output
        f.debug_struct("TokenCodec").finish()
    }
}
