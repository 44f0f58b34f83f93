//! CLI configuration handling.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokengate_core::{ProcessDispatcher, ProgramSpec, ReauthEndpoint, TargetUri};
use uuid::Uuid;

/// One re-authentication candidate, optionally backed by a local program.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EndpointConfig {
    /// Name shown in logs and errors.
    pub name: String,

    /// Command namespace.
    pub namespace: Uuid,

    /// Command id within the namespace.
    pub id: u32,

    /// Program that performs the login for this command.
    #[serde(default)]
    pub program: Option<String>,

    #[serde(default)]
    pub args: Vec<String>,

    /// Wait for the program to exit.
    #[serde(default = "default_wait")]
    pub wait: bool,
}

fn default_wait() -> bool {
    true
}

impl EndpointConfig {
    pub fn endpoint(&self) -> ReauthEndpoint {
        ReauthEndpoint::new(self.name.clone(), self.namespace, self.id)
    }

    fn program_spec(&self) -> Option<ProgramSpec> {
        self.program.as_ref().map(|program| {
            let spec = ProgramSpec::new(program.clone(), self.args.clone());
            if self.wait { spec } else { spec.detached() }
        })
    }
}

impl From<ReauthEndpoint> for EndpointConfig {
    fn from(endpoint: ReauthEndpoint) -> Self {
        Self {
            name: endpoint.name,
            namespace: endpoint.namespace,
            id: endpoint.id,
            program: None,
            args: Vec::new(),
            wait: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// Path to the configuration file that was loaded.
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Identity whose token is looked up.
    #[serde(default = "TargetUri::github")]
    pub target: TargetUri,

    /// Store namespace; keys are `{store_namespace}:{target}`.
    #[serde(default = "default_store_namespace")]
    pub store_namespace: String,

    /// Keyring user the tokens are stored under.
    #[serde(default = "default_store_account")]
    pub store_account: String,

    /// Use the OS keyring when available.
    #[serde(default = "default_prefer_keyring")]
    pub prefer_keyring: bool,

    /// Logging level.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// GraphQL endpoint for queries.
    #[serde(default = "default_graphql_url")]
    pub graphql_url: String,

    /// Re-authentication candidates in priority order.
    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,
}

fn default_store_namespace() -> String {
    "git".to_string()
}

fn default_store_account() -> String {
    "tokengate".to_string()
}

fn default_prefer_keyring() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_graphql_url() -> String {
    tokengate_core::github::GITHUB_GRAPHQL_URL.to_string()
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            config_path: PathBuf::new(),
            target: TargetUri::github(),
            store_namespace: default_store_namespace(),
            store_account: default_store_account(),
            prefer_keyring: default_prefer_keyring(),
            log_level: default_log_level(),
            graphql_url: default_graphql_url(),
            endpoints: Vec::new(),
        }
    }
}

impl CliConfig {
    /// Configured candidates, or the GitHub connect commands when none are set.
    pub fn effective_endpoints(&self) -> Vec<EndpointConfig> {
        if self.endpoints.is_empty() {
            ReauthEndpoint::github_defaults()
                .into_iter()
                .map(EndpointConfig::from)
                .collect()
        } else {
            self.endpoints.clone()
        }
    }

    /// Dispatcher with a program for every candidate that names one.
    pub fn dispatcher(&self) -> ProcessDispatcher {
        let mut dispatcher = ProcessDispatcher::new();
        for config in self.effective_endpoints() {
            if let Some(spec) = config.program_spec() {
                dispatcher.insert(&config.endpoint(), spec);
            }
        }
        dispatcher
    }
}

/// Load configuration from `path`, or from the default location.
///
/// A missing file yields the defaults.
pub fn load_config(path: Option<&Path>) -> Result<CliConfig> {
    let config_path = match path {
        Some(path) => path.to_path_buf(),
        None => default_config_path(),
    };

    let mut config: CliConfig = if config_path.exists() {
        let contents = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config from {:?}", config_path))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config from {:?}", config_path))?
    } else {
        CliConfig::default()
    };

    config.config_path = config_path;
    Ok(config)
}

fn default_config_path() -> PathBuf {
    ProjectDirs::from("com", "raibid-labs", "tokengate")
        .map(|d| d.config_dir().join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("tokengate.toml"))
}
