//! The credential gate.
//!
//! [`CredentialGate::ensure`] runs an operation with the current token and
//! recovers at most once from an authorization failure:
//!
//! 1. Read the token; if there is none, raise re-authentication once and read again.
//! 2. Run the operation.
//! 3. On [`OperationError::Unauthorized`], raise re-authentication and read again.
//!    If the token did not change, the original failure is returned.
//!    Otherwise the operation runs one more time and its outcome is final.
//!
//! Other failures are returned immediately. The interactive flow is raised
//! at most twice per call.
//!
//! # Example
//!
//! ```rust,ignore
//! use tokengate_core::{CredentialGate, ReauthTrigger, StoreTokenSource, TargetUri};
//!
//! let source = StoreTokenSource::new(store, TargetUri::github());
//! let gate = CredentialGate::new(source, ReauthTrigger::github(dispatcher));
//!
//! let message = gate
//!     .ensure(|token| async move { client.viewer_name(&token).await })
//!     .await?;
//! ```

use std::future::Future;

use crate::dispatch::CommandDispatcher;
use crate::error::GateError;
use crate::model::Token;
use crate::operation::OperationError;
use crate::reauth::ReauthTrigger;
use crate::source::TokenSource;

/// Runs operations with a working token, re-authenticating once if needed.
#[derive(Debug)]
pub struct CredentialGate<S, D> {
    source: S,
    trigger: ReauthTrigger<D>,
}

impl<S, D> CredentialGate<S, D>
where
    S: TokenSource,
    D: CommandDispatcher,
{
    pub fn new(source: S, trigger: ReauthTrigger<D>) -> Self {
        Self { source, trigger }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn trigger(&self) -> &ReauthTrigger<D> {
        &self.trigger
    }

    /// Read the current token without running anything.
    pub async fn lookup_token(&self) -> Result<Option<Token>, GateError> {
        Ok(self.source.lookup_token().await?)
    }

    /// Run `operation` with a working token.
    ///
    /// `operation` is called once, or twice when the first call fails with an
    /// authorization failure and re-authentication produced a different token.
    pub async fn ensure<R, F, Fut>(&self, mut operation: F) -> Result<R, GateError>
    where
        F: FnMut(Token) -> Fut,
        Fut: Future<Output = Result<R, OperationError>>,
    {
        let target = self.source.target();

        let token = match self.source.lookup_token().await? {
            Some(token) => token,
            None => {
                tracing::info!("No credential stored for {}, requesting login", target);
                self.trigger.run().await?;
                self.source
                    .lookup_token()
                    .await?
                    .ok_or_else(|| GateError::NoCredential {
                        target: target.to_string(),
                    })?
            }
        };

        tracing::debug!("Running operation against {}", target);
        let failure = match operation(token.clone()).await {
            Ok(result) => return Ok(result),
            Err(OperationError::Unauthorized(failure)) => failure,
            Err(OperationError::Failed(e)) => return Err(GateError::Operation(e)),
        };

        tracing::info!(
            "{} rejected the token ({}), requesting login",
            target,
            failure.reason
        );
        self.trigger.run().await?;

        let new_token = match self.source.lookup_token().await? {
            Some(new_token) if new_token != token => new_token,
            _ => {
                tracing::warn!(
                    "Login did not produce a new credential for {}, giving up",
                    target
                );
                return Err(GateError::Unauthorized(failure));
            }
        };

        tracing::debug!("Retrying operation against {} with new credential", target);
        let result = operation(new_token).await.map_err(GateError::from)?;
        tracing::info!("Operation against {} succeeded after login", target);
        Ok(result)
    }
}
