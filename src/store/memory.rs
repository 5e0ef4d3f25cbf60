//! In-memory credential store.
//!
//! Backs the crate's own tests and small embedded deployments. A real
//! deployment would implement `CredentialStore` over its database.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{normalize_email, CredentialRecord, CredentialStore, Identity, NewIdentity, StoreError};

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    /// Records keyed by identity id; emails are an index into it.
    records: HashMap<i64, CredentialRecord>,
    /// Lowercased email -> identity id.
    by_email: HashMap<String, i64>,
}

/// Thread-safe in-memory implementation of [`CredentialStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored identities.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.records.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.records.is_empty()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<CredentialRecord>, StoreError> {
        let inner = self.inner.lock().await;
        let id = inner.by_email.get(&normalize_email(email));
        Ok(id.and_then(|id| inner.records.get(id)).cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<CredentialRecord>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.records.get(&id).cloned())
    }

    async fn create(
        &self,
        profile: NewIdentity,
        password_hash: String,
    ) -> Result<Identity, StoreError> {
        let mut inner = self.inner.lock().await;
        let email = normalize_email(&profile.email);
        if inner.by_email.contains_key(&email) {
            return Err(StoreError::DuplicateEmail);
        }

        inner.next_id += 1;
        let identity = Identity {
            id: inner.next_id,
            email: email.clone(),
            name: profile.name,
        };
        inner.by_email.insert(email, identity.id);
        inner.records.insert(
            identity.id,
            CredentialRecord {
                identity: identity.clone(),
                password_hash,
            },
        );
        Ok(identity)
    }

    async fn update_hash(&self, id: i64, new_hash: String) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        match inner.records.get_mut(&id) {
            Some(record) => {
                record.password_hash = new_hash;
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_find() {
        let store = MemoryStore::new();
        let identity = store
            .create(NewIdentity::new("a@x.com", "Ada"), "hash1".to_string())
            .await
            .unwrap();
        assert_eq!(identity.id, 1);

        let record = store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(record.identity, identity);
        assert_eq!(record.password_hash, "hash1");

        let record = store.find_by_id(1).await.unwrap().unwrap();
        assert_eq!(record.identity.email, "a@x.com");
    }

    #[tokio::test]
    async fn test_find_by_email_case_insensitive() {
        let store = MemoryStore::new();
        store
            .create(NewIdentity::new("Ada@X.com", "Ada"), "hash".to_string())
            .await
            .unwrap();

        assert!(store.find_by_email("ada@x.com").await.unwrap().is_some());
        assert!(store.find_by_email("ADA@X.COM").await.unwrap().is_some());
        assert!(store.find_by_email("other@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_duplicate_email() {
        let store = MemoryStore::new();
        store
            .create(NewIdentity::new("a@x.com", "Ada"), "hash1".to_string())
            .await
            .unwrap();

        let result = store
            .create(NewIdentity::new("A@X.com", "Imposter"), "hash2".to_string())
            .await;
        assert!(matches!(result, Err(StoreError::DuplicateEmail)));

        // Existing record untouched
        let record = store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(record.identity.name, "Ada");
        assert_eq!(record.password_hash, "hash1");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_update_hash() {
        let store = MemoryStore::new();
        let identity = store
            .create(NewIdentity::new("a@x.com", "Ada"), "old".to_string())
            .await
            .unwrap();

        store.update_hash(identity.id, "new".to_string()).await.unwrap();
        let record = store.find_by_id(identity.id).await.unwrap().unwrap();
        assert_eq!(record.password_hash, "new");
    }

    #[tokio::test]
    async fn test_update_hash_not_found() {
        let store = MemoryStore::new();
        let result = store.update_hash(999, "new".to_string()).await;
        assert!(matches!(result, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn test_sequential_ids() {
        let store = MemoryStore::new();
        let a = store
            .create(NewIdentity::new("a@x.com", "A"), "h".to_string())
            .await
            .unwrap();
        let b = store
            .create(NewIdentity::new("b@x.com", "B"), "h".to_string())
            .await
            .unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
    }
}
