use async_trait::async_trait;
use keyring::Entry;
use uuid::Uuid;

use super::{Secret, SecretStore, StoreError};

const BACKEND: &str = "keyring";
const CHECK_SERVICE: &str = "tokengate:availability-check";

/// Tokens in the platform credential store (Keychain, Credential Manager,
/// kernel keyutils).
///
/// The store key becomes the entry's service name and `account` its user, so
/// `git:https://github.com` for account `tokengate` is one keyring entry.
#[derive(Debug)]
pub struct KeyringStore {
    account: String,
}

impl KeyringStore {
    /// Open the keyring for `account`.
    ///
    /// A value is written, read back through a separate entry and removed.
    /// Backends that accept the write but do not keep it (keyring's built-in
    /// mock, or a sandbox that blocks the key syscalls) are reported as
    /// [`StoreError::Unavailable`].
    pub fn try_new(account: &str) -> Result<Self, StoreError> {
        let unavailable = |reason: String| StoreError::Unavailable {
            backend: BACKEND,
            reason,
        };

        let nonce = Uuid::new_v4().to_string();
        Entry::new(CHECK_SERVICE, account)
            .and_then(|entry| entry.set_password(&nonce))
            .map_err(|e| unavailable(e.to_string()))?;

        let check = Entry::new(CHECK_SERVICE, account).map_err(|e| unavailable(e.to_string()))?;
        let read_back = check.get_password();
        let _ = check.delete_credential();

        match read_back {
            Ok(value) if value == nonce => Ok(Self {
                account: account.to_string(),
            }),
            Ok(_) => Err(unavailable("stored value came back changed".to_string())),
            Err(keyring::Error::NoEntry) => {
                Err(unavailable("entries are not kept between handles".to_string()))
            }
            Err(e) => Err(unavailable(e.to_string())),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry, StoreError> {
        Entry::new(key, &self.account).map_err(|e| backend_error(key, e))
    }
}

fn backend_error(key: &str, error: keyring::Error) -> StoreError {
    match error {
        keyring::Error::NoStorageAccess(_) => StoreError::Denied {
            key: key.to_string(),
        },
        other => StoreError::Backend {
            key: key.to_string(),
            reason: other.to_string(),
        },
    }
}

#[async_trait]
impl SecretStore for KeyringStore {
    async fn read(&self, key: &str) -> Result<Option<Secret>, StoreError> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(Secret::new(value))),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(backend_error(key, e)),
        }
    }

    async fn write(&self, key: &str, secret: &Secret) -> Result<(), StoreError> {
        self.entry(key)?
            .set_password(secret.expose())
            .map_err(|e| backend_error(key, e))
    }

    async fn erase(&self, key: &str) -> Result<(), StoreError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(backend_error(key, e)),
        }
    }
}
