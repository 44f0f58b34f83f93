//! Host command dispatch.
//!
//! This module provides:
//! - [`CommandDispatcher`] - Trait for raising a host command by `(namespace, id)`
//! - [`DispatchError`] - Tagged result separating "no such command" from real failures
//! - [`CommandRegistry`] - In-memory registry for embedding hosts
//! - [`ProcessDispatcher`] - Maps commands to external programs

use async_trait::async_trait;
use thiserror::Error;

use crate::model::ReauthEndpoint;

mod process;
mod registry;

pub use process::{ProcessDispatcher, ProgramSpec};
pub use registry::CommandRegistry;

/// Error type for command dispatch.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The host has no command registered under this endpoint.
    ///
    /// Callers falling back across candidates treat this as a miss.
    #[error("command not found: {endpoint}")]
    NotFound { endpoint: String },

    /// The command exists but could not be raised.
    #[error("failed to dispatch {endpoint}: {message}")]
    Failed { endpoint: String, message: String },
}

impl DispatchError {
    pub fn not_found(endpoint: &ReauthEndpoint) -> Self {
        Self::NotFound {
            endpoint: endpoint.to_string(),
        }
    }

    pub fn failed(endpoint: &ReauthEndpoint, message: impl Into<String>) -> Self {
        Self::Failed {
            endpoint: endpoint.to_string(),
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Raises a named host command.
///
/// `Ok(())` means the host accepted the command. Whether the user then
/// finished the interactive flow is not reported; callers re-read their
/// credential store to find out.
#[async_trait]
pub trait CommandDispatcher: Send + Sync {
    async fn dispatch(&self, endpoint: &ReauthEndpoint) -> Result<(), DispatchError>;
}
