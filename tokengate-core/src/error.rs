//! Top-level error types for tokengate.

use thiserror::Error;

use crate::dispatch::DispatchError;
use crate::operation::{AuthorizationFailure, OperationError};
use crate::store::StoreError;

/// Every way a gated call can fail.
#[derive(Debug, Error)]
pub enum GateError {
    /// No token could be obtained, even after one interactive attempt.
    #[error("couldn't establish a connection to {target}: no credential available")]
    NoCredential { target: String },

    /// The token was rejected and re-authentication did not fix it.
    #[error(transparent)]
    Unauthorized(#[from] AuthorizationFailure),

    /// None of the re-authentication commands exist in this host.
    #[error("no re-authentication provider available (tried: {})", tried.join(", "))]
    NoReauthTargetAvailable { tried: Vec<String> },

    /// A re-authentication command was found but could not be raised.
    #[error("re-authentication dispatch failed: {0}")]
    Dispatch(#[from] DispatchError),

    /// The credential store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The operation failed for a reason unrelated to credentials.
    #[error("operation failed: {0:#}")]
    Operation(anyhow::Error),
}

impl From<OperationError> for GateError {
    fn from(e: OperationError) -> Self {
        match e {
            OperationError::Unauthorized(failure) => Self::Unauthorized(failure),
            OperationError::Failed(error) => Self::Operation(error),
        }
    }
}
