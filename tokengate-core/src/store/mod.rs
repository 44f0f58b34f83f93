//! Where tokens live between runs.
//!
//! Tokens are stored under `{namespace}:{target}` keys (see
//! [`TargetUri::store_key`](crate::TargetUri::store_key)), the same layout Git
//! credential helpers use, so `git:https://github.com` holds the GitHub token.
//!
//! [`create_store`] picks the OS keyring when it works and an in-process map
//! otherwise.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

mod memory;
#[cfg(feature = "keyring-store")]
mod keyring;

pub use memory::MemoryStore;
#[cfg(feature = "keyring-store")]
pub use keyring::KeyringStore;

/// A stored credential string, wiped from memory on drop.
///
/// Formatting never prints the value.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Secret").field(&format_args!("<{} bytes>", self.0.len())).finish()
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<hidden>")
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend cannot be used on this machine.
    #[error("{backend} store unavailable: {reason}")]
    Unavailable { backend: &'static str, reason: String },

    /// The backend refused to hand out the credential (locked keychain, denied prompt).
    #[error("access to {key} was refused")]
    Denied { key: String },

    #[error("reading or writing {key} failed: {reason}")]
    Backend { key: String, reason: String },
}

/// Token persistence used by [`StoreTokenSource`](crate::StoreTokenSource)
/// and the CLI `token` commands.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// `Ok(None)` when nothing is stored under `key`.
    async fn read(&self, key: &str) -> Result<Option<Secret>, StoreError>;

    async fn write(&self, key: &str, secret: &Secret) -> Result<(), StoreError>;

    /// Removing a key that was never written is not an error.
    async fn erase(&self, key: &str) -> Result<(), StoreError>;
}

/// Pick a backend for `account`.
///
/// With `prefer_keyring` the OS keyring is used if it can hold a value;
/// otherwise tokens stay in this process only, and a warning says so.
pub fn create_store(prefer_keyring: bool, account: &str) -> Arc<dyn SecretStore> {
    if prefer_keyring {
        #[cfg(feature = "keyring-store")]
        match KeyringStore::try_new(account) {
            Ok(store) => {
                tracing::debug!("Storing tokens in the OS keyring as {}", account);
                return Arc::new(store);
            }
            Err(e) => tracing::warn!("{}; tokens will only last for this process", e),
        }

        #[cfg(not(feature = "keyring-store"))]
        tracing::warn!(
            "Built without keyring-store; tokens for {} will only last for this process",
            account
        );
    }

    Arc::new(MemoryStore::new())
}
