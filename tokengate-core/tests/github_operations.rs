//! Integration tests for the GitHub GraphQL operations.
//!
//! These tests verify that [`GitHubClient`] reports GitHub's token rejections
//! as authorization failures, and that a gate recovers from them.

#![cfg(feature = "github")]

use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokengate_core::{
    AuthorizationReason, CommandRegistry, CredentialGate, GateError, GitHubClient, MemoryStore,
    OperationError, ReauthEndpoint, ReauthTrigger, Secret, StoreTokenSource, TargetUri, Token,
};
use url::Url;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path},
};

const KEY: &str = "git:https://github.com";

fn client_for(server: &MockServer) -> GitHubClient {
    let endpoint = Url::parse(&format!("{}/graphql", server.uri())).unwrap();
    GitHubClient::new().unwrap().with_endpoint(endpoint)
}

fn unauthorized_reason(result: Result<String, OperationError>) -> AuthorizationReason {
    match result {
        Err(OperationError::Unauthorized(failure)) => failure.reason,
        Err(OperationError::Failed(e)) => panic!("expected authorization failure, got {:#}", e),
        Ok(value) => panic!("expected authorization failure, got {}", value),
    }
}

#[tokio::test]
async fn test_viewer_name() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(header("authorization", "bearer tok1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "viewer": { "login": "octocat", "name": "The Octocat" } }
        })))
        .mount(&server)
        .await;

    let message = client_for(&server)
        .viewer_name(&Token::new("tok1"))
        .await
        .unwrap();
    assert_eq!(message, "Hello, The Octocat!");
}

#[tokio::test]
async fn test_viewer_email_insufficient_scopes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": [{
                "type": "INSUFFICIENT_SCOPES",
                "message": "Your token has not been granted the required scopes to execute this query. The 'email' field requires one of the following scopes: ['user:email', 'read:user'], but your token has only been granted the: ['gist', 'repo'] scopes."
            }]
        })))
        .mount(&server)
        .await;

    let result = client_for(&server).viewer_email(&Token::new("tok1")).await;
    assert_eq!(unauthorized_reason(result), AuthorizationReason::InsufficientScope);
}

#[tokio::test]
async fn test_saml_enforcement_403() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "message": "Resource protected by organization SAML enforcement. You must grant your Personal Access token access to this organization.",
            "documentation_url": "https://docs.github.com/articles/authenticating-to-a-github-organization-with-saml-single-sign-on/"
        })))
        .mount(&server)
        .await;

    let result = client_for(&server)
        .repository_description(&Token::new("tok1"), "github", "hubbers")
        .await;
    assert_eq!(unauthorized_reason(result), AuthorizationReason::SsoEnforced);
}

#[tokio::test]
async fn test_bad_credentials_401() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "Bad credentials",
            "documentation_url": "https://docs.github.com/graphql"
        })))
        .mount(&server)
        .await;

    let result = client_for(&server).viewer_name(&Token::new("revoked")).await;
    assert_eq!(unauthorized_reason(result), AuthorizationReason::BadCredentials);
}

#[tokio::test]
async fn test_server_error_is_not_authorization() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let result = client_for(&server).viewer_name(&Token::new("tok1")).await;
    assert!(matches!(result, Err(OperationError::Failed(_))));
}

#[tokio::test]
async fn test_malformed_response_is_not_authorization() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let result = client_for(&server).viewer_name(&Token::new("tok1")).await;
    assert!(matches!(result, Err(OperationError::Failed(_))));
}

#[tokio::test]
async fn test_repository_description_and_no_access() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(wiremock::matchers::body_string_contains("VisualStudio"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "repositoryOwner": { "repository": {
                "nameWithOwner": "github/VisualStudio",
                "description": "GitHub Extension for Visual Studio"
            } } }
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(wiremock::matchers::body_string_contains("hubbers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "repositoryOwner": { "repository": null } }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let token = Token::new("tok1");

    let visible = client
        .repository_description(&token, "github", "VisualStudio")
        .await
        .unwrap();
    assert_eq!(visible, "github/VisualStudio: GitHub Extension for Visual Studio");

    let hidden = client
        .repository_description(&token, "github", "hubbers")
        .await
        .unwrap();
    assert_eq!(hidden, "Viewer doesn't have access to the repository github/hubbers");
}

#[tokio::test]
async fn test_gate_recovers_from_sso_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(header("authorization", "bearer old-token"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "message": "Resource protected by organization SAML enforcement."
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(header("authorization", "bearer sso-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "repositoryOwner": { "repository": {
                "nameWithOwner": "github/hubbers",
                "description": "Hubbers only"
            } } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    store.put(KEY, Secret::new("old-token"));

    let logins = Arc::new(AtomicUsize::new(0));
    let registry = CommandRegistry::new();
    {
        let store = store.clone();
        let logins = logins.clone();
        registry.register(&ReauthEndpoint::github_essentials(), move || {
            logins.fetch_add(1, Ordering::SeqCst);
            store.put(KEY, Secret::new("sso-token"));
            Ok(())
        });
    }

    let gate = CredentialGate::new(
        StoreTokenSource::new(store, TargetUri::github()),
        ReauthTrigger::github(registry),
    );
    let client = client_for(&server);

    let message = gate
        .ensure(|token| {
            let client = client.clone();
            async move { client.repository_description(&token, "github", "hubbers").await }
        })
        .await
        .unwrap();

    assert_eq!(message, "github/hubbers: Hubbers only");
    assert_eq!(logins.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_gate_gives_up_when_login_is_cancelled() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": [{ "type": "INSUFFICIENT_SCOPES", "message": "requires read:user" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    store.put(KEY, Secret::new("gist-only"));
    let registry = CommandRegistry::new();
    registry.register(&ReauthEndpoint::github_for_visual_studio(), || Ok(()));

    let gate = CredentialGate::new(
        StoreTokenSource::new(store, TargetUri::github()),
        ReauthTrigger::github(registry),
    );
    let client = client_for(&server);

    let result = gate
        .ensure(|token| {
            let client = client.clone();
            async move { client.viewer_email(&token).await }
        })
        .await;

    match result {
        Err(GateError::Unauthorized(failure)) => {
            assert_eq!(failure.reason, AuthorizationReason::InsufficientScope);
        }
        other => panic!("unexpected result: {:?}", other),
    }
}
