//! GitHub GraphQL operations for use behind a [`CredentialGate`](crate::CredentialGate).
//!
//! [`GitHubClient`] maps GitHub's ways of rejecting a token onto
//! [`OperationError::Unauthorized`] so the gate knows when logging in again
//! can help:
//!
//! - HTTP 401 (revoked or unknown token)
//! - HTTP 403 mentioning SAML/SSO (organization enforces single sign-on)
//! - GraphQL `INSUFFICIENT_SCOPES` errors
//! - GraphQL `FORBIDDEN` errors mentioning SAML/SSO
//!
//! Everything else (transport, other statuses, other GraphQL errors,
//! undecodable responses) is [`OperationError::Failed`].

use anyhow::{Context, anyhow};
use reqwest::StatusCode;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use url::Url;

use crate::model::Token;
use crate::operation::{AuthorizationFailure, OperationError};

/// GitHub's public GraphQL endpoint.
pub const GITHUB_GRAPHQL_URL: &str = "https://api.github.com/graphql";

const DEFAULT_USER_AGENT: &str = concat!("tokengate/", env!("CARGO_PKG_VERSION"));

const VIEWER_NAME_QUERY: &str = "query { viewer { login name } }";

const VIEWER_EMAIL_QUERY: &str = "query { viewer { login name email } }";

const REPOSITORY_QUERY: &str = "query($owner: String!, $name: String!) { \
    repositoryOwner(login: $owner) { repository(name: $name) { nameWithOwner description } } }";

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RestError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ViewerData {
    viewer: Viewer,
}

#[derive(Debug, Deserialize)]
struct Viewer {
    login: String,
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

impl Viewer {
    fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.login)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepositoryData {
    repository_owner: Option<RepositoryOwner>,
}

#[derive(Debug, Deserialize)]
struct RepositoryOwner {
    repository: Option<Repository>,
}

/// Repository summary returned by [`GitHubClient::repository`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    pub name_with_owner: String,
    pub description: Option<String>,
}

/// Minimal GitHub GraphQL client.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl GitHubClient {
    /// Client for the public GitHub API with the default user agent.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_user_agent(DEFAULT_USER_AGENT)
    }

    /// Client identifying itself with a custom product user agent.
    pub fn with_user_agent(user_agent: &str) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().user_agent(user_agent).build()?;
        let endpoint = Url::parse(GITHUB_GRAPHQL_URL).expect("GitHub GraphQL URL is valid");
        Ok(Self { http, endpoint })
    }

    /// Send queries to a different endpoint (GitHub Enterprise, tests).
    pub fn with_endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = endpoint;
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Run a GraphQL query and decode its `data` into `T`.
    pub async fn query<T: DeserializeOwned>(
        &self,
        token: &Token,
        query: &str,
        variables: Value,
    ) -> Result<T, OperationError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .header(AUTHORIZATION, token.authorization_header())
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await
            .context("GraphQL request failed")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("failed to read GraphQL response")?;

        if status == StatusCode::UNAUTHORIZED {
            return Err(AuthorizationFailure::bad_credentials(rest_message(&body, status)).into());
        }

        if status == StatusCode::FORBIDDEN && mentions_sso(&body) {
            return Err(AuthorizationFailure::sso_enforced(rest_message(&body, status)).into());
        }

        if !status.is_success() {
            return Err(OperationError::failed(anyhow!(
                "GitHub returned {}: {}",
                status,
                rest_message(&body, status)
            )));
        }

        let envelope: GraphQlResponse =
            serde_json::from_str(&body).context("malformed GraphQL response")?;

        if !envelope.errors.is_empty() {
            return Err(classify_errors(envelope.errors));
        }

        let data = envelope
            .data
            .ok_or_else(|| anyhow!("GraphQL response contained no data"))?;
        Ok(serde_json::from_value(data).context("unexpected GraphQL response shape")?)
    }

    /// Greet the authenticated user. Visible to any authenticated token.
    pub async fn viewer_name(&self, token: &Token) -> Result<String, OperationError> {
        let data: ViewerData = self.query(token, VIEWER_NAME_QUERY, json!({})).await?;
        Ok(format!("Hello, {}!", data.viewer.display_name()))
    }

    /// Greet the user and show their public email. Needs `user:email` or `read:user`.
    pub async fn viewer_email(&self, token: &Token) -> Result<String, OperationError> {
        let data: ViewerData = self.query(token, VIEWER_EMAIL_QUERY, json!({})).await?;
        let email = data.viewer.email.as_deref().unwrap_or_default();
        Ok(format!(
            "Hello, {}!\n\nYour public email address is {}.",
            data.viewer.display_name(),
            email
        ))
    }

    /// Look up a repository, `None` if the viewer cannot see it.
    pub async fn repository(
        &self,
        token: &Token,
        owner: &str,
        name: &str,
    ) -> Result<Option<Repository>, OperationError> {
        let data: RepositoryData = self
            .query(token, REPOSITORY_QUERY, json!({ "owner": owner, "name": name }))
            .await?;
        Ok(data.repository_owner.and_then(|o| o.repository))
    }

    /// `"{owner}/{name}: {description}"`, or a note that the viewer lacks access.
    pub async fn repository_description(
        &self,
        token: &Token,
        owner: &str,
        name: &str,
    ) -> Result<String, OperationError> {
        Ok(match self.repository(token, owner, name).await? {
            Some(repo) => format!(
                "{}: {}",
                repo.name_with_owner,
                repo.description.unwrap_or_default()
            ),
            None => format!("Viewer doesn't have access to the repository {}/{}", owner, name),
        })
    }
}

/// Whether `text` names SAML or SSO as a whole word ("SSO", "SAML-enforced"),
/// not as part of another word ("passo", "samlet").
fn mentions_sso(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("single sign-on")
        || lower
            .split(|c: char| !c.is_ascii_alphanumeric())
            .any(|word| word == "sso" || word == "saml")
}

fn rest_message(body: &str, status: StatusCode) -> String {
    serde_json::from_str::<RestError>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| status.canonical_reason().unwrap_or("unknown error").to_string())
}

fn classify_errors(errors: Vec<GraphQlError>) -> OperationError {
    for error in &errors {
        match error.kind.as_deref() {
            Some("INSUFFICIENT_SCOPES") => {
                return AuthorizationFailure::insufficient_scope(error.message.clone()).into();
            }
            Some("FORBIDDEN") if mentions_sso(&error.message) => {
                return AuthorizationFailure::sso_enforced(error.message.clone()).into();
            }
            _ => {}
        }
    }

    let messages: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
    OperationError::failed(anyhow!("GraphQL error: {}", messages.join("; ")))
}
