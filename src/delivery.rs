//! Out-of-band delivery of reset tokens.
//!
//! Actual delivery (email, SMS, push) is an external collaborator; the flows
//! only require the narrow [`ResetDelivery`] seam. Delivery failures are
//! never surfaced to the requesting caller, so they cannot be used to probe
//! whether an email is registered.

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::store::Identity;

/// Delivery errors.
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// The delivery channel rejected or failed to accept the message.
    #[error("delivery failed: {0}")]
    Failed(String),
}

/// Hands a freshly minted reset token to the delivery channel.
#[async_trait]
pub trait ResetDelivery: Send + Sync {
    /// Deliver a reset token to the identity's registered contact.
    async fn send(&self, identity: &Identity, token: &str) -> Result<(), DeliveryError>;
}

/// Delivery stub that records only that a token was issued.
///
/// Logs the identity id at debug level; the token itself is never logged.
#[derive(Debug, Default)]
pub struct LogDelivery;

#[async_trait]
impl ResetDelivery for LogDelivery {
    async fn send(&self, identity: &Identity, _token: &str) -> Result<(), DeliveryError> {
        debug!(user_id = identity.id, "reset token issued");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_delivery_accepts() {
        let identity = Identity {
            id: 1,
            email: "a@x.com".to_string(),
            name: "Ada".to_string(),
        };
        assert!(LogDelivery.send(&identity, "token").await.is_ok());
    }

    #[test]
    fn test_delivery_error_display() {
        assert_eq!(
            DeliveryError::Failed("smtp down".to_string()).to_string(),
            "delivery failed: smtp down"
        );
    }
}
