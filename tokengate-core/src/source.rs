//! Where the gate reads its token from.

use async_trait::async_trait;
use std::sync::Arc;

use crate::model::{TargetUri, Token};
use crate::store::{SecretStore, StoreError};

/// Reads the current bearer credential for a fixed target identity.
///
/// Implementations must return the latest value on every call and must not
/// cache between calls; the gate relies on a fresh read to notice that an
/// interactive login has completed.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// The identity this source reads for.
    fn target(&self) -> &TargetUri;

    /// Read the current token, `None` if none is stored.
    async fn lookup_token(&self) -> Result<Option<Token>, StoreError>;
}

/// [`TokenSource`] backed by a [`SecretStore`].
///
/// Reads the key `{namespace}:{target}`; with the defaults that is
/// `git:https://github.com`.
#[derive(Clone)]
pub struct StoreTokenSource {
    store: Arc<dyn SecretStore>,
    target: TargetUri,
    key: String,
}

impl StoreTokenSource {
    /// Default store namespace, shared with the Git credential store.
    pub const DEFAULT_NAMESPACE: &'static str = "git";

    /// Create a source for `target` using the default namespace.
    pub fn new(store: Arc<dyn SecretStore>, target: TargetUri) -> Self {
        Self::with_namespace(store, target, Self::DEFAULT_NAMESPACE)
    }

    /// Create a source for `target` under a custom namespace.
    pub fn with_namespace(store: Arc<dyn SecretStore>, target: TargetUri, namespace: &str) -> Self {
        let key = target.store_key(namespace);
        Self { store, target, key }
    }

    /// The store key this source reads.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn SecretStore> {
        &self.store
    }
}

impl std::fmt::Debug for StoreTokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreTokenSource")
            .field("target", &self.target)
            .field("key", &self.key)
            .finish()
    }
}

#[async_trait]
impl TokenSource for StoreTokenSource {
    fn target(&self) -> &TargetUri {
        &self.target
    }

    async fn lookup_token(&self) -> Result<Option<Token>, StoreError> {
        let secret = self.store.read(&self.key).await?;
        // An empty password is what some credential helpers leave behind on logout.
        Ok(secret.filter(|s| !s.is_empty()).map(Token::from))
    }
}
