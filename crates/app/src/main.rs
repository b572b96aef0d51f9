//! Tollgate command-line client.
//!
//! Keeps a bearer session in a token file and sends requests through the
//! session pipeline, renewing the session when the backend rejects it.

mod cli;

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use thiserror::Error;
use tollgate_application::{
    ClientError, HttpClientError, PersistenceError, SessionClient, TokenStore,
};
use tollgate_domain::{
    DomainError, HttpMethod, RequestBody, RequestSpec, SessionConfig, TokenPair, token_preview,
};
use tollgate_infrastructure::{
    FileTokenPersistence, ReqwestHttpClient, ReqwestTokenRefresher, WatchNavigator,
    to_json_stable,
};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Command};

#[derive(Debug, Error)]
enum AppError {
    #[error("invalid configuration: {0}")]
    Config(#[from] DomainError),
    #[error("token storage: {0}")]
    Storage(#[from] PersistenceError),
    #[error("HTTP client: {0}")]
    Http(#[from] HttpClientError),
    #[error(transparent)]
    Request(#[from] ClientError),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    run(cli.session.into_config(), cli.command).await?;
    Ok(())
}

async fn run(config: SessionConfig, command: Command) -> Result<(), AppError> {
    config.validate()?;
    let store = open_store(config.token_file.as_deref()).await?;

    match command {
        Command::SignIn {
            access_token,
            refresh_token,
        } => {
            store
                .sign_in(TokenPair::new(access_token, refresh_token.unwrap_or_default()))
                .await?;
            println!("{}", store.status().await.display_message());
        }
        Command::AdminSignIn { token } => {
            store.sign_in_admin(token).await?;
            println!("Admin signed in");
        }
        Command::SignOut { admin: true } => {
            store.clear_admin().await?;
            println!("Admin signed out");
        }
        Command::SignOut { admin: false } => {
            store.clear_session().await?;
            println!("Signed out");
        }
        Command::Status => print_status(&store).await,
        Command::Send { method, path, json } => {
            send(&config, store, build_request(method, path, json)?).await?;
        }
    }
    Ok(())
}

async fn open_store(token_file: Option<&Path>) -> Result<TokenStore, PersistenceError> {
    match token_file {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading tokens");
            TokenStore::load(Arc::new(FileTokenPersistence::new(path))).await
        }
        None => Ok(TokenStore::ephemeral()),
    }
}

async fn print_status(store: &TokenStore) {
    let snapshot = store.snapshot().await;
    println!("{}", store.status().await.display_message());
    if let Some(token) = snapshot.access_token.as_deref() {
        println!("  access token:  {}", token_preview(token));
    }
    if let Some(token) = snapshot.refresh_token.as_deref() {
        println!("  refresh token: {}", token_preview(token));
    }
    if let Some(token) = snapshot.admin_token.as_deref() {
        println!("  admin token:   {}", token_preview(token));
    }
}

fn build_request(
    method: HttpMethod,
    path: String,
    json: Option<String>,
) -> Result<RequestSpec, DomainError> {
    let request = RequestSpec::new(method, path);
    match json {
        Some(_) if !method.has_body() => Err(DomainError::InvalidBody(format!(
            "{method} requests do not carry a body"
        ))),
        Some(body) => Ok(request.with_body(RequestBody::json(body))),
        None => Ok(request),
    }
}

async fn send(
    config: &SessionConfig,
    store: TokenStore,
    request: RequestSpec,
) -> Result<(), AppError> {
    let navigator = Arc::new(WatchNavigator::default());
    let redirects = navigator.subscribe();
    let client = SessionClient::new(
        config,
        Arc::new(ReqwestHttpClient::new(config)?),
        ReqwestTokenRefresher::new(config)?,
        store,
        navigator,
    )?;

    let outcome = client.send(request).await;
    if redirects.has_changed().unwrap_or(false) {
        eprintln!("Session ended; sign in again at {}", *redirects.borrow());
    }

    let response = match outcome {
        Ok(response) => response,
        Err(e) => {
            if let Some(response) = e.response() {
                eprintln!("{}", response.status);
                eprintln!("{}", response.body);
            }
            return Err(e.into());
        }
    };

    println!("{} ({} ms)", response.status, response.duration.as_millis());
    match response.body_as_json().and_then(|v| to_json_stable(&v).ok()) {
        Some(pretty) => print!("{pretty}"),
        None => println!("{}", response.body),
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_json_body_is_attached() {
        let request =
            build_request(HttpMethod::Post, "/jobs".to_string(), Some("{}".to_string())).unwrap();
        assert_eq!(request.body.content_type(), Some("application/json"));
    }

    #[test]
    fn test_body_on_get_is_rejected() {
        let err =
            build_request(HttpMethod::Get, "/jobs".to_string(), Some("{}".to_string())).unwrap_err();
        assert!(matches!(err, DomainError::InvalidBody(_)));
    }

    #[tokio::test]
    async fn test_token_file_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("session").join("tokens.json");

        let store = open_store(Some(path.as_path())).await.unwrap();
        store.sign_in(TokenPair::new("a1", "r1")).await.unwrap();

        let reopened = open_store(Some(path.as_path())).await.unwrap();
        assert_eq!(reopened.access_token().await.as_deref(), Some("a1"));
        assert_eq!(reopened.refresh_token().await.as_deref(), Some("r1"));
    }
}
