//! # tokengate core
//!
//! Runs operations that need a bearer token and recovers once when the token
//! turns out to be insufficient.
//!
//! This crate provides:
//! - [`CredentialGate`] - Ensures a token, runs the operation, re-authenticates once on rejection
//! - [`ReauthTrigger`] - Raises the first available re-authentication command
//! - [`TokenSource`] and [`StoreTokenSource`] - Fresh token lookups from a secret store
//! - [`CommandDispatcher`] with [`CommandRegistry`] and [`ProcessDispatcher`] hosts
//! - In-memory and (optionally) keyring-based secret stores
//! - GitHub GraphQL operations (with the `github` feature)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tokengate_core::{
//!     CredentialGate, ProcessDispatcher, ReauthTrigger, StoreTokenSource, TargetUri, create_store,
//! };
//!
//! let store = create_store(true, "tokengate");
//! let source = StoreTokenSource::new(store, TargetUri::github());
//! let gate = CredentialGate::new(source, ReauthTrigger::github(ProcessDispatcher::new()));
//!
//! let greeting = gate
//!     .ensure(|token| async move { client.viewer_name(&token).await })
//!     .await?;
//! ```

pub mod dispatch;
pub mod error;
pub mod gate;
pub mod model;
pub mod operation;
pub mod reauth;
pub mod source;
pub mod store;

#[cfg(feature = "github")]
pub mod github;

// Re-export commonly used types at crate root
pub use model::{
    ParseError,
    ReauthEndpoint,
    TargetUri,
    Token,
};

pub use store::{
    Secret,
    SecretStore,
    StoreError,
    MemoryStore,
    create_store,
};

#[cfg(feature = "keyring-store")]
pub use store::KeyringStore;

pub use dispatch::{
    CommandDispatcher,
    CommandRegistry,
    DispatchError,
    ProcessDispatcher,
    ProgramSpec,
};

pub use operation::{
    AuthorizationFailure,
    AuthorizationReason,
    OperationError,
};

pub use error::GateError;
pub use gate::CredentialGate;
pub use reauth::ReauthTrigger;
pub use source::{StoreTokenSource, TokenSource};

#[cfg(feature = "github")]
pub use github::GitHubClient;
