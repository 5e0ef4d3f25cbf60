//! Authentication flows for authcore.
//!
//! `AuthService` orchestrates login, registration, and the forgot/reset
//! password flow on top of the password hasher, the token codec, and the
//! credential store. Each operation is a short-lived request-scoped
//! computation; the only shared mutable state is the consumed-token set.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::password::{PasswordError, PasswordHasher};
use crate::auth::token::{Claims, TokenCodec, TokenPurpose};
use crate::config::Config;
use crate::delivery::ResetDelivery;
use crate::error::{AuthError, Result};
use crate::store::{normalize_email, CredentialStore, Identity, NewIdentity, StoreError};

/// A freshly issued session token.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    /// Signed bearer token.
    pub access_token: String,
    /// Seconds until the token expires.
    pub expires_in: u64,
}

/// Registration request data.
#[derive(Debug, Clone)]
pub struct RegisterRequest {
    /// Email address (unique, case-insensitive).
    pub email: String,
    /// Plaintext password (8-128 characters).
    pub password: String,
    /// Display name.
    pub name: String,
}

impl RegisterRequest {
    /// Create a new registration request.
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            name: name.into(),
        }
    }
}

/// Set of consumed reset-token nonces.
///
/// Reset tokens are stateless, so single use is enforced by remembering each
/// consumed `jti` until the token's own expiry. Expired entries are swept on
/// access, bounding the set by the number of resets within one token TTL.
#[derive(Debug, Default)]
pub struct ConsumedTokenSet {
    inner: Mutex<HashMap<String, u64>>,
}

impl ConsumedTokenSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a nonce as consumed.
    ///
    /// Returns true on first consumption, false when the nonce was already
    /// used and its token has not yet expired.
    pub fn consume(&self, jti: &str, expires_at: u64) -> bool {
        let now = chrono::Utc::now().timestamp() as u64;
        let mut set = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        set.retain(|_, exp| *exp > now);
        if set.contains_key(jti) {
            return false;
        }
        set.insert(jti.to_string(), expires_at);
        true
    }

    /// Number of live consumed entries.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Whether no live consumed entries exist.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Orchestrates the credential and token lifecycle.
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    delivery: Arc<dyn ResetDelivery>,
    hasher: PasswordHasher,
    codec: TokenCodec,
    session_ttl: Duration,
    reset_ttl: Duration,
    store_timeout: Duration,
    consumed: ConsumedTokenSet,
    /// Verified against when the email is unknown, so both login failure
    /// paths pay the same hashing cost.
    dummy_hash: String,
}

impl AuthService {
    /// Create a service from validated configuration and its collaborators.
    pub fn new(
        config: &Config,
        store: Arc<dyn CredentialStore>,
        delivery: Arc<dyn ResetDelivery>,
    ) -> Result<Self> {
        config.validate()?;
        let hasher = PasswordHasher::new(&config.password)
            .map_err(|e| AuthError::Config(e.to_string()))?;
        let codec = TokenCodec::new(&config.token.secret);

        let dummy_hash = hasher
            .hash(&Uuid::new_v4().to_string())
            .map_err(|e| AuthError::Internal(format!("dummy hash: {e}")))?;

        Ok(Self {
            store,
            delivery,
            hasher,
            codec,
            session_ttl: Duration::from_secs(config.token.session_ttl_days * 24 * 60 * 60),
            reset_ttl: Duration::from_secs(config.token.reset_ttl_minutes * 60),
            store_timeout: Duration::from_secs(config.store.timeout_secs),
            consumed: ConsumedTokenSet::new(),
            dummy_hash,
        })
    }

    /// Authenticate an email/password pair and issue a session token.
    ///
    /// Unknown email and wrong password both fail with `InvalidCredentials`,
    /// with matching timing, so accounts cannot be enumerated.
    pub async fn login(&self, email: &str, password: &str) -> Result<IssuedToken> {
        let email = normalize_email(email);
        let record = self
            .store_call(self.store.find_by_email(&email))
            .await?
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;

        let record = match record {
            Some(r) => r,
            None => {
                let _ = self
                    .verify_password(password.to_string(), self.dummy_hash.clone())
                    .await;
                debug!("login failed: unknown email");
                return Err(AuthError::InvalidCredentials);
            }
        };

        match self
            .verify_password(password.to_string(), record.password_hash.clone())
            .await
        {
            Ok(()) => {}
            Err(PasswordError::InvalidHash) => {
                warn!(user_id = record.identity.id, "stored hash is malformed");
                return Err(AuthError::MalformedStoredHash);
            }
            Err(_) => {
                debug!(user_id = record.identity.id, "login failed: wrong password");
                return Err(AuthError::InvalidCredentials);
            }
        }

        if self.hasher.needs_rehash(&record.password_hash) {
            self.upgrade_hash(record.identity.id, password).await;
        }

        info!(user_id = record.identity.id, "login successful");
        self.issue_session(&record.identity)
    }

    /// Create an identity with its credential and issue a session token.
    ///
    /// Registration implies an authenticated session, exactly as login.
    pub async fn register(&self, request: RegisterRequest) -> Result<IssuedToken> {
        let password_hash = self
            .hash_password(request.password)
            .await
            .map_err(map_hash_error)?;

        let profile = NewIdentity::new(normalize_email(&request.email), request.name);
        let identity = match self.store_call(self.store.create(profile, password_hash)).await? {
            Ok(identity) => identity,
            Err(StoreError::DuplicateEmail) => {
                debug!("registration rejected: email already registered");
                return Err(AuthError::DuplicateIdentity);
            }
            Err(e) => return Err(AuthError::StoreUnavailable(e.to_string())),
        };

        info!(user_id = identity.id, "identity registered");
        self.issue_session(&identity)
    }

    /// Start the reset flow for an email.
    ///
    /// The acknowledgement is identical whether or not the email is
    /// registered; when it is, a short-lived reset token is minted and
    /// handed to the delivery collaborator.
    pub async fn forgot(&self, email: &str) -> Result<()> {
        let email = normalize_email(email);
        let record = self
            .store_call(self.store.find_by_email(&email))
            .await?
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;

        let Some(record) = record else {
            debug!("reset requested for unknown email");
            return Ok(());
        };

        // Failures past this point are logged, not returned, to keep the
        // acknowledgement uniform.
        match self
            .codec
            .issue(&record.identity, TokenPurpose::Reset, self.reset_ttl)
        {
            Ok(token) => match self.delivery.send(&record.identity, &token).await {
                Ok(()) => info!(user_id = record.identity.id, "reset token issued"),
                Err(e) => warn!(
                    user_id = record.identity.id,
                    error = %e,
                    "reset token delivery failed"
                ),
            },
            Err(e) => warn!(user_id = record.identity.id, error = %e, "reset token minting failed"),
        }

        Ok(())
    }

    /// Complete the reset flow: verify the reset token, store a new hash for
    /// the identity it names, and issue a fresh session token.
    ///
    /// The identity comes from the token's claims, never from the caller.
    /// Each reset token is single-use.
    pub async fn reset(&self, new_password: &str, token: &str) -> Result<IssuedToken> {
        let claims = match self.codec.verify(token, TokenPurpose::Reset) {
            Ok(claims) => claims,
            Err(e) => {
                debug!(kind = %e, "reset token rejected");
                return Err(AuthError::InvalidResetToken);
            }
        };

        // Consumed before the store write; a failed write burns the token
        // rather than leaving it replayable.
        if !self.consumed.consume(&claims.jti, claims.exp) {
            debug!(user_id = claims.id, "reset token already consumed");
            return Err(AuthError::InvalidResetToken);
        }

        let new_hash = self
            .hash_password(new_password.to_string())
            .await
            .map_err(map_hash_error)?;

        match self
            .store_call(self.store.update_hash(claims.id, new_hash))
            .await?
        {
            Ok(()) => {}
            Err(StoreError::NotFound) => {
                debug!(user_id = claims.id, "reset failed: identity no longer exists");
                return Err(AuthError::InvalidResetToken);
            }
            Err(e) => return Err(AuthError::StoreUnavailable(e.to_string())),
        }

        let identity = Identity {
            id: claims.id,
            email: claims.email,
            name: claims.name,
        };
        info!(user_id = identity.id, "password reset completed");
        self.issue_session(&identity)
    }

    /// Verify a session token for downstream request authorization.
    ///
    /// All verification failures collapse to `Unauthorized`; the precise
    /// kind is logged at debug level.
    pub fn verify_session(&self, token: &str) -> Result<Claims> {
        self.codec.verify(token, TokenPurpose::Session).map_err(|e| {
            debug!(kind = %e, "session token rejected");
            AuthError::Unauthorized
        })
    }

    fn issue_session(&self, identity: &Identity) -> Result<IssuedToken> {
        let access_token = self
            .codec
            .issue(identity, TokenPurpose::Session, self.session_ttl)
            .map_err(|e| AuthError::Internal(format!("token encoding failed: {e}")))?;
        Ok(IssuedToken {
            access_token,
            expires_in: self.session_ttl.as_secs(),
        })
    }

    /// Re-hash under the current parameters after a successful login.
    /// Best effort; the login itself already succeeded.
    async fn upgrade_hash(&self, user_id: i64, password: &str) {
        debug!(user_id, "stored hash uses outdated parameters, upgrading");
        let new_hash = match self.hash_password(password.to_string()).await {
            Ok(h) => h,
            Err(e) => {
                warn!(user_id, error = %e, "hash upgrade failed");
                return;
            }
        };
        match self.store_call(self.store.update_hash(user_id, new_hash)).await {
            Ok(Ok(())) => debug!(user_id, "hash upgraded"),
            Ok(Err(e)) => warn!(user_id, error = %e, "hash upgrade not persisted"),
            Err(e) => warn!(user_id, error = %e, "hash upgrade not persisted"),
        }
    }

    /// Run a store call under the configured timeout. A timed-out or
    /// unreachable store maps to the retryable `StoreUnavailable`; domain
    /// errors are returned for the caller to interpret.
    async fn store_call<T, F>(&self, fut: F) -> Result<std::result::Result<T, StoreError>>
    where
        F: Future<Output = std::result::Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.store_timeout, fut).await {
            Ok(Ok(value)) => Ok(Ok(value)),
            Ok(Err(StoreError::Unavailable(m))) => Err(AuthError::StoreUnavailable(m)),
            Ok(Err(e)) => Ok(Err(e)),
            Err(_) => Err(AuthError::StoreUnavailable(
                "store call timed out".to_string(),
            )),
        }
    }

    /// Hashing is CPU-bound by design; keep it off the async workers.
    async fn hash_password(
        &self,
        password: String,
    ) -> std::result::Result<String, PasswordError> {
        let hasher = self.hasher.clone();
        match tokio::task::spawn_blocking(move || hasher.hash(&password)).await {
            Ok(result) => result,
            Err(e) => Err(PasswordError::HashError(format!("hashing task failed: {e}"))),
        }
    }

    async fn verify_password(
        &self,
        password: String,
        hash: String,
    ) -> std::result::Result<(), PasswordError> {
        let hasher = self.hasher.clone();
        match tokio::task::spawn_blocking(move || hasher.verify(&password, &hash)).await {
            Ok(result) => result,
            Err(e) => Err(PasswordError::HashError(format!("hashing task failed: {e}"))),
        }
    }
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("session_ttl", &self.session_ttl)
            .field("reset_ttl", &self.reset_ttl)
            .field("store_timeout", &self.store_timeout)
            .finish()
    }
}

fn map_hash_error(e: PasswordError) -> AuthError {
    match e {
        PasswordError::TooShort | PasswordError::TooLong => {
            AuthError::PasswordPolicy(e.to_string())
        }
        PasswordError::InvalidHash => AuthError::MalformedStoredHash,
        other => AuthError::Internal(other.to_string()),
    }
}
