//! End-to-end authentication flow tests.
//!
//! Exercises the full login / register / forgot / reset lifecycle against
//! the in-memory credential store, the way an embedding application layer
//! would drive it.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use authcore::config::PasswordConfig;
use authcore::{
    AuthError, AuthService, Config, DeliveryError, Identity, MemoryStore, RegisterRequest,
    ResetDelivery,
};

/// Delivery stub that captures issued reset tokens.
#[derive(Default)]
struct Outbox {
    sent: Mutex<Vec<(i64, String)>>,
}

impl Outbox {
    fn last_token(&self) -> Option<String> {
        self.sent.lock().unwrap().last().map(|(_, t)| t.clone())
    }

    fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl ResetDelivery for Outbox {
    async fn send(&self, identity: &Identity, token: &str) -> Result<(), DeliveryError> {
        self.sent
            .lock()
            .unwrap()
            .push((identity.id, token.to_string()));
        Ok(())
    }
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.token.secret = "e2e-test-secret".to_string();
    // Fast hashing so the suite stays quick
    config.password = PasswordConfig {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    };
    config
}

fn create_service() -> (AuthService, Arc<MemoryStore>, Arc<Outbox>) {
    let store = Arc::new(MemoryStore::new());
    let outbox = Arc::new(Outbox::default());
    let service = AuthService::new(&test_config(), store.clone(), outbox.clone())
        .expect("service construction");
    (service, store, outbox)
}

#[tokio::test]
async fn register_login_and_authorize() {
    let (service, _, _) = create_service();

    let issued = service
        .register(RegisterRequest::new("a@x.com", "correct_horse", "Ada"))
        .await
        .unwrap();

    // Registration implies an authenticated session
    let claims = service.verify_session(&issued.access_token).unwrap();
    assert_eq!(claims.email, "a@x.com");
    assert_eq!(claims.name, "Ada");
    assert_eq!(claims.sub, claims.id.to_string());
    assert_eq!(issued.expires_in, 7 * 24 * 60 * 60);

    // A later login issues another valid session token
    let issued = service.login("a@x.com", "correct_horse").await.unwrap();
    let claims = service.verify_session(&issued.access_token).unwrap();
    assert_eq!(claims.email, "a@x.com");
}

#[tokio::test]
async fn login_rejections_are_uniform() {
    let (service, _, _) = create_service();
    service
        .register(RegisterRequest::new("a@x.com", "correct_horse", "Ada"))
        .await
        .unwrap();

    let wrong = service.login("a@x.com", "battery_staple").await.unwrap_err();
    let unknown = service.login("b@x.com", "correct_horse").await.unwrap_err();
    assert_eq!(wrong.to_string(), unknown.to_string());
    assert!(matches!(wrong, AuthError::InvalidCredentials));
    assert!(matches!(unknown, AuthError::InvalidCredentials));
}

#[tokio::test]
async fn duplicate_registration_rejected() {
    let (service, store, _) = create_service();
    service
        .register(RegisterRequest::new("a@x.com", "correct_horse", "Ada"))
        .await
        .unwrap();

    let result = service
        .register(RegisterRequest::new("A@x.com", "other_password", "Eve"))
        .await;
    assert!(matches!(result, Err(AuthError::DuplicateIdentity)));
    assert_eq!(store.len().await, 1);

    // Original credentials still work
    assert!(service.login("a@x.com", "correct_horse").await.is_ok());
}

#[tokio::test]
async fn full_forgot_reset_cycle() {
    let (service, _, outbox) = create_service();
    service
        .register(RegisterRequest::new("a@x.com", "old_password", "Ada"))
        .await
        .unwrap();

    // Request a reset; the acknowledgement is uniform but only the real
    // account receives a token
    service.forgot("a@x.com").await.unwrap();
    service.forgot("nobody@x.com").await.unwrap();
    assert_eq!(outbox.count(), 1);
    let token = outbox.last_token().unwrap();

    // Reset with the delivered token; the identity comes from the token
    let issued = service.reset("new_password", &token).await.unwrap();
    assert!(service.verify_session(&issued.access_token).is_ok());

    // New password works, old one does not
    assert!(service.login("a@x.com", "new_password").await.is_ok());
    assert!(matches!(
        service.login("a@x.com", "old_password").await,
        Err(AuthError::InvalidCredentials)
    ));

    // The token is single-use
    assert!(matches!(
        service.reset("sneaky_password", &token).await,
        Err(AuthError::InvalidResetToken)
    ));
    // And the reset after the replay attempt left the password unchanged
    assert!(service.login("a@x.com", "new_password").await.is_ok());
}

#[tokio::test]
async fn token_purposes_are_not_interchangeable() {
    let (service, _, outbox) = create_service();
    let issued = service
        .register(RegisterRequest::new("a@x.com", "correct_horse", "Ada"))
        .await
        .unwrap();
    service.forgot("a@x.com").await.unwrap();
    let reset_token = outbox.last_token().unwrap();

    // A session token cannot drive a password reset
    assert!(matches!(
        service.reset("new_password", &issued.access_token).await,
        Err(AuthError::InvalidResetToken)
    ));

    // A reset token cannot authorize a session
    assert!(matches!(
        service.verify_session(&reset_token),
        Err(AuthError::Unauthorized)
    ));
}

#[tokio::test]
async fn tampered_session_token_rejected() {
    let (service, _, _) = create_service();
    let issued = service
        .register(RegisterRequest::new("a@x.com", "correct_horse", "Ada"))
        .await
        .unwrap();

    let token = issued.access_token;
    let flipped = if token.ends_with('x') { 'y' } else { 'x' };
    let mut tampered = token[..token.len() - 1].to_string();
    tampered.push(flipped);

    assert!(matches!(
        service.verify_session(&tampered),
        Err(AuthError::Unauthorized)
    ));
}
