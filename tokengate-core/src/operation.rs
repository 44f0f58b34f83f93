//! Failures reported by gated operations.
//!
//! An operation tells the gate *why* it failed. Only
//! [`OperationError::Unauthorized`] can start a re-authentication round;
//! everything else is passed through untouched.

use std::fmt;
use thiserror::Error;

/// Why the remote party rejected a structurally usable token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationReason {
    /// The token lacks a scope the operation needs.
    InsufficientScope,

    /// The organization enforces single sign-on and the token is not authorized for it.
    SsoEnforced,

    /// The token was revoked or is otherwise not accepted.
    BadCredentials,
}

impl fmt::Display for AuthorizationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InsufficientScope => "insufficient scope",
            Self::SsoEnforced => "single sign-on enforced",
            Self::BadCredentials => "bad credentials",
        };
        f.write_str(s)
    }
}

/// A token rejection for scope or policy reasons.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("authorization failed ({reason}): {message}")]
pub struct AuthorizationFailure {
    pub reason: AuthorizationReason,
    pub message: String,
}

impl AuthorizationFailure {
    pub fn new(reason: AuthorizationReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
        }
    }

    pub fn insufficient_scope(message: impl Into<String>) -> Self {
        Self::new(AuthorizationReason::InsufficientScope, message)
    }

    pub fn sso_enforced(message: impl Into<String>) -> Self {
        Self::new(AuthorizationReason::SsoEnforced, message)
    }

    pub fn bad_credentials(message: impl Into<String>) -> Self {
        Self::new(AuthorizationReason::BadCredentials, message)
    }
}

/// Error returned by a gated operation.
#[derive(Debug, Error)]
pub enum OperationError {
    /// The token was rejected; re-authenticating may help.
    #[error(transparent)]
    Unauthorized(#[from] AuthorizationFailure),

    /// Transport, decoding or any other failure unrelated to credentials.
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

impl OperationError {
    /// Wrap any unrelated failure.
    pub fn failed(error: impl Into<anyhow::Error>) -> Self {
        Self::Failed(error.into())
    }

    /// Whether this failure should start a re-authentication round.
    pub fn is_authorization_failure(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorization_failure_display() {
        let failure = AuthorizationFailure::sso_enforced("Resource protected by organization SAML enforcement");
        assert_eq!(
            failure.to_string(),
            "authorization failed (single sign-on enforced): Resource protected by organization SAML enforcement"
        );
    }

    #[test]
    fn test_operation_error_classification() {
        let unauthorized: OperationError = AuthorizationFailure::insufficient_scope("needs read:user").into();
        assert!(unauthorized.is_authorization_failure());

        let failed = OperationError::failed(anyhow::anyhow!("connection reset"));
        assert!(!failed.is_authorization_failure());
        assert_eq!(failed.to_string(), "connection reset");
    }
}
