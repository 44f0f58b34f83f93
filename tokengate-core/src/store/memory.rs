use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use super::{Secret, SecretStore, StoreError};

/// Process-local token map.
///
/// Used when no keyring is available, and by hosts whose login hooks write
/// the new token directly with [`put`](MemoryStore::put).
#[derive(Default)]
pub struct MemoryStore {
    tokens: RwLock<HashMap<String, Secret>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Synchronous write, for command handlers that run outside async code.
    pub fn put(&self, key: impl Into<String>, secret: Secret) {
        self.tokens.write().insert(key.into(), secret);
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keys: Vec<String> = self.tokens.read().keys().cloned().collect();
        f.debug_struct("MemoryStore").field("keys", &keys).finish()
    }
}

#[async_trait]
impl SecretStore for MemoryStore {
    async fn read(&self, key: &str) -> Result<Option<Secret>, StoreError> {
        Ok(self.tokens.read().get(key).cloned())
    }

    async fn write(&self, key: &str, secret: &Secret) -> Result<(), StoreError> {
        self.put(key, secret.clone());
        Ok(())
    }

    async fn erase(&self, key: &str) -> Result<(), StoreError> {
        self.tokens.write().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "git:https://github.com";

    #[tokio::test]
    async fn test_write_then_read() {
        let store = MemoryStore::new();
        assert!(store.read(KEY).await.unwrap().is_none());

        store.write(KEY, &Secret::new("tok1")).await.unwrap();
        assert_eq!(store.read(KEY).await.unwrap(), Some(Secret::new("tok1")));

        store.put(KEY, Secret::new("tok2"));
        assert_eq!(store.read(KEY).await.unwrap(), Some(Secret::new("tok2")));
    }

    #[tokio::test]
    async fn test_erase_twice() {
        let store = MemoryStore::new();
        store.put(KEY, Secret::new("tok1"));

        store.erase(KEY).await.unwrap();
        store.erase(KEY).await.unwrap();
        assert!(store.read(KEY).await.unwrap().is_none());
    }

    #[test]
    fn test_debug_lists_keys_only() {
        let store = MemoryStore::new();
        store.put(KEY, Secret::new("ghp_abc123"));

        let debug = format!("{:?}", store);
        assert!(debug.contains(KEY));
        assert!(!debug.contains("ghp_abc123"));
    }
}
