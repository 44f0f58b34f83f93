//! In-memory command registry.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::{CommandDispatcher, DispatchError};
use crate::model::ReauthEndpoint;

type Handler = Arc<dyn Fn() -> Result<(), DispatchError> + Send + Sync>;

/// A host's table of triggerable actions, keyed by `(namespace, id)`.
///
/// Embedding hosts register a handler per command; raising an unregistered
/// command yields [`DispatchError::NotFound`].
///
/// # Example
///
/// ```
/// use tokengate_core::{CommandRegistry, ReauthEndpoint};
///
/// let registry = CommandRegistry::new();
/// registry.register(&ReauthEndpoint::github_essentials(), || {
///     // open the login dialog
///     Ok(())
/// });
/// assert!(registry.contains(&ReauthEndpoint::github_essentials()));
/// ```
#[derive(Default)]
pub struct CommandRegistry {
    handlers: RwLock<HashMap<(Uuid, u32), Handler>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace the handler for an endpoint.
    pub fn register<F>(&self, endpoint: &ReauthEndpoint, handler: F)
    where
        F: Fn() -> Result<(), DispatchError> + Send + Sync + 'static,
    {
        self.handlers.write().insert(endpoint.key(), Arc::new(handler));
    }

    /// Remove the handler for an endpoint, returning whether one existed.
    pub fn unregister(&self, endpoint: &ReauthEndpoint) -> bool {
        self.handlers.write().remove(&endpoint.key()).is_some()
    }

    pub fn contains(&self, endpoint: &ReauthEndpoint) -> bool {
        self.handlers.read().contains_key(&endpoint.key())
    }
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.handlers.read().len())
            .finish()
    }
}

#[async_trait]
impl CommandDispatcher for CommandRegistry {
    async fn dispatch(&self, endpoint: &ReauthEndpoint) -> Result<(), DispatchError> {
        // Clone the handler out so the lock is not held while it runs.
        let handler = self.handlers.read().get(&endpoint.key()).cloned();
        match handler {
            Some(handler) => handler(),
            None => Err(DispatchError::not_found(endpoint)),
        }
    }
}
