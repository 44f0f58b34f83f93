//! Dispatch commands by running external programs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io;
use tokio::process::Command;
use uuid::Uuid;

use super::{CommandDispatcher, DispatchError};
use crate::model::ReauthEndpoint;

/// External program that implements a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramSpec {
    /// Program name or path, resolved through `PATH`.
    pub program: String,

    /// Arguments passed to the program.
    #[serde(default)]
    pub args: Vec<String>,

    /// Wait for the program to exit before reporting the dispatch as done.
    ///
    /// Interactive terminal logins need this; a program that only opens a
    /// browser window does not.
    #[serde(default = "default_wait")]
    pub wait: bool,
}

fn default_wait() -> bool {
    true
}

impl ProgramSpec {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            wait: true,
        }
    }

    /// Return immediately after the program starts.
    pub fn detached(mut self) -> Self {
        self.wait = false;
        self
    }
}

/// [`CommandDispatcher`] that runs a configured program per endpoint.
///
/// An endpoint with no program, or whose program is not installed, is
/// reported as [`DispatchError::NotFound`] so the next candidate is tried.
/// A program that starts but exits unsuccessfully still counts as
/// dispatched; the credential store is the judge of whether login worked.
#[derive(Debug, Default, Clone)]
pub struct ProcessDispatcher {
    programs: HashMap<(Uuid, u32), ProgramSpec>,
}

impl ProcessDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a program to an endpoint, replacing any previous one.
    pub fn with_program(mut self, endpoint: &ReauthEndpoint, spec: ProgramSpec) -> Self {
        self.insert(endpoint, spec);
        self
    }

    pub fn insert(&mut self, endpoint: &ReauthEndpoint, spec: ProgramSpec) {
        self.programs.insert(endpoint.key(), spec);
    }

    pub fn program(&self, endpoint: &ReauthEndpoint) -> Option<&ProgramSpec> {
        self.programs.get(&endpoint.key())
    }
}

#[async_trait]
impl CommandDispatcher for ProcessDispatcher {
    async fn dispatch(&self, endpoint: &ReauthEndpoint) -> Result<(), DispatchError> {
        let spec = self
            .program(endpoint)
            .ok_or_else(|| DispatchError::not_found(endpoint))?;

        tracing::debug!("Starting {} for {}", spec.program, endpoint);

        let mut child = match Command::new(&spec.program).args(&spec.args).spawn() {
            Ok(child) => child,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("{} is not installed", spec.program);
                return Err(DispatchError::not_found(endpoint));
            }
            Err(e) => {
                return Err(DispatchError::failed(
                    endpoint,
                    format!("failed to start {}: {}", spec.program, e),
                ));
            }
        };

        if spec.wait {
            match child.wait().await {
                Ok(status) if status.success() => {
                    tracing::debug!("{} finished", spec.program);
                }
                Ok(status) => {
                    tracing::warn!("{} exited with {}", spec.program, status);
                }
                Err(e) => {
                    tracing::warn!("Failed to wait for {}: {}", spec.program, e);
                }
            }
        }

        Ok(())
    }
}
