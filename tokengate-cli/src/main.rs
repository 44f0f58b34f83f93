//! tokengate CLI
//!
//! Runs GitHub queries behind a credential gate: the stored token is used
//! as-is, and a rejected token raises the configured login command once.
//!
//! # Usage
//!
//! ```bash
//! # Store a token for the configured target
//! tokengate token set ghp_xxxxxxxx
//!
//! # Greet the authenticated user (re-authenticates once if needed)
//! tokengate query viewer
//!
//! # Describe a repository
//! tokengate query repo github VisualStudio
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokengate_core::{
    CredentialGate, GitHubClient, ProcessDispatcher, ReauthTrigger, Secret, SecretStore,
    StoreTokenSource, TokenSource, create_store,
};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt};
use url::Url;

mod config;

use config::CliConfig;

#[derive(Parser)]
#[command(name = "tokengate")]
#[command(about = "Credential-gated GitHub queries with one-shot re-authentication")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect or change the stored token
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },

    /// Raise the first available login command
    Reauth,

    /// List the re-authentication candidates in priority order
    Endpoints,

    /// Run a GitHub query through the credential gate
    Query {
        #[command(subcommand)]
        query: QueryKind,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Show whether a token is stored
    Show {
        /// Print the token value instead of a redacted marker
        #[arg(long)]
        reveal: bool,
    },

    /// Store a token for the configured target
    Set {
        value: String,
    },

    /// Remove the stored token
    Clear,
}

#[derive(Subcommand)]
enum QueryKind {
    /// Greet the authenticated user
    Viewer,

    /// Show the authenticated user's public email (needs user:email)
    Email,

    /// Describe a repository
    Repo {
        /// Repository owner (user or organization)
        owner: String,

        /// Repository name
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = config::load_config(cli.config.as_deref())?;
    init_logging(cli.verbose, &config.log_level);
    debug!("Loaded configuration from {:?}", config.config_path);

    match cli.command {
        Commands::Token { action } => token_command(&config, action).await,
        Commands::Reauth => reauth(&config).await,
        Commands::Endpoints => {
            list_endpoints(&config);
            Ok(())
        }
        Commands::Query { query } => run_query(&config, query).await,
    }
}

fn init_logging(verbose: bool, level: &str) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn token_source(config: &CliConfig) -> StoreTokenSource {
    let store = create_store(config.prefer_keyring, &config.store_account);
    StoreTokenSource::with_namespace(store, config.target.clone(), &config.store_namespace)
}

fn gate(config: &CliConfig) -> CredentialGate<StoreTokenSource, ProcessDispatcher> {
    let endpoints = config
        .effective_endpoints()
        .iter()
        .map(|e| e.endpoint())
        .collect();
    let trigger = ReauthTrigger::new(config.dispatcher(), endpoints);
    CredentialGate::new(token_source(config), trigger)
}

async fn token_command(config: &CliConfig, action: TokenAction) -> Result<()> {
    let source = token_source(config);
    let store: &Arc<dyn SecretStore> = source.store();

    match action {
        TokenAction::Show { reveal } => {
            let token = source
                .lookup_token()
                .await
                .context("Failed to read token")?;
            match token {
                Some(token) if reveal => println!("{}", token.expose()),
                Some(token) => println!("{}: {}", source.key(), token),
                None => println!("{}: no token stored", source.key()),
            }
        }
        TokenAction::Set { value } => {
            store
                .write(source.key(), &Secret::new(value))
                .await
                .context("Failed to store token")?;
            info!("Stored token under {}", source.key());
        }
        TokenAction::Clear => {
            store
                .erase(source.key())
                .await
                .context("Failed to remove token")?;
            info!("Removed token under {}", source.key());
        }
    }
    Ok(())
}

async fn reauth(config: &CliConfig) -> Result<()> {
    let gate = gate(config);
    gate.trigger().run().await?;
    println!("Re-authentication raised");
    Ok(())
}

fn list_endpoints(config: &CliConfig) {
    for entry in config.effective_endpoints() {
        let endpoint = entry.endpoint();
        match &entry.program {
            Some(program) => println!("{}  ->  {} {}", endpoint, program, entry.args.join(" ")),
            None => println!("{}  (no program configured)", endpoint),
        }
    }
}

async fn run_query(config: &CliConfig, query: QueryKind) -> Result<()> {
    let endpoint = Url::parse(&config.graphql_url)
        .with_context(|| format!("Invalid graphql_url {:?}", config.graphql_url))?;
    let client = GitHubClient::new()
        .context("Failed to build HTTP client")?
        .with_endpoint(endpoint);

    let message = gate(config)
        .ensure(|token| {
            let client = client.clone();
            let query = &query;
            async move {
                match query {
                    QueryKind::Viewer => client.viewer_name(&token).await,
                    QueryKind::Email => client.viewer_email(&token).await,
                    QueryKind::Repo { owner, name } => {
                        client.repository_description(&token, owner, name).await
                    }
                }
            }
        })
        .await
        .with_context(|| format!("Query against {} failed", config.target))?;

    println!("{}", message);
    Ok(())
}
