//! Raising the interactive re-authentication flow.

use crate::dispatch::CommandDispatcher;
use crate::error::GateError;
use crate::model::ReauthEndpoint;

/// Raises the first available re-authentication command.
///
/// Candidates are tried strictly in order. A candidate the host does not
/// know ([`DispatchError::NotFound`](crate::DispatchError::NotFound)) is
/// skipped; the first accepted dispatch wins; any other dispatch error is
/// returned unchanged.
///
/// Success only means a handler was asked to run. It says nothing about
/// whether the user completed the login.
#[derive(Debug)]
pub struct ReauthTrigger<D> {
    dispatcher: D,
    endpoints: Vec<ReauthEndpoint>,
}

impl<D: CommandDispatcher> ReauthTrigger<D> {
    pub fn new(dispatcher: D, endpoints: Vec<ReauthEndpoint>) -> Self {
        Self {
            dispatcher,
            endpoints,
        }
    }

    /// Trigger for the GitHub connect commands.
    pub fn github(dispatcher: D) -> Self {
        Self::new(dispatcher, ReauthEndpoint::github_defaults())
    }

    pub fn endpoints(&self) -> &[ReauthEndpoint] {
        &self.endpoints
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    pub async fn run(&self) -> Result<(), GateError> {
        for endpoint in &self.endpoints {
            match self.dispatcher.dispatch(endpoint).await {
                Ok(()) => {
                    tracing::info!("Raised re-authentication via {}", endpoint);
                    return Ok(());
                }
                Err(e) if e.is_not_found() => {
                    tracing::debug!("{} not available, trying next", endpoint);
                }
                Err(e) => return Err(GateError::Dispatch(e)),
            }
        }

        Err(GateError::NoReauthTargetAvailable {
            tried: self.endpoints.iter().map(|e| e.name.clone()).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{CommandRegistry, DispatchError};
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn recording(registry: &CommandRegistry, endpoint: &ReauthEndpoint, log: &Arc<Mutex<Vec<String>>>) {
        let log = log.clone();
        let name = endpoint.name.clone();
        registry.register(endpoint, move || {
            log.lock().push(name.clone());
            Ok(())
        });
    }

    #[tokio::test]
    async fn test_first_match_wins() {
        let registry = CommandRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        recording(&registry, &ReauthEndpoint::github_essentials(), &log);
        recording(&registry, &ReauthEndpoint::github_for_visual_studio(), &log);

        ReauthTrigger::github(registry).run().await.unwrap();
        assert_eq!(*log.lock(), vec!["github-essentials"]);
    }

    #[tokio::test]
    async fn test_falls_back_past_not_found() {
        let registry = CommandRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        recording(&registry, &ReauthEndpoint::github_for_visual_studio(), &log);

        ReauthTrigger::github(registry).run().await.unwrap();
        assert_eq!(*log.lock(), vec!["github-for-visual-studio"]);
    }

    #[tokio::test]
    async fn test_no_candidates_available() {
        let trigger = ReauthTrigger::github(CommandRegistry::new());
        let err = trigger.run().await.unwrap_err();
        match err {
            GateError::NoReauthTargetAvailable { tried } => {
                assert_eq!(tried, vec!["github-essentials", "github-for-visual-studio"]);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_candidate_list() {
        let trigger = ReauthTrigger::new(CommandRegistry::new(), Vec::new());
        assert!(matches!(
            trigger.run().await,
            Err(GateError::NoReauthTargetAvailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_real_failure_is_not_swallowed() {
        let registry = CommandRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let essentials = ReauthEndpoint::github_essentials();
        let failing = essentials.clone();
        registry.register(&essentials, move || Err(DispatchError::failed(&failing, "extension crashed")));
        recording(&registry, &ReauthEndpoint::github_for_visual_studio(), &log);

        let err = ReauthTrigger::github(registry).run().await.unwrap_err();
        assert!(matches!(err, GateError::Dispatch(DispatchError::Failed { .. })));
        assert!(log.lock().is_empty());
    }
}
