// =============================================================================
// OAUTH 2.0 INSTALLED-APP FLOW
// =============================================================================
//
// Interactive consent for a desktop/CLI client:
//
// 1. Bind a one-shot callback listener on a random loopback port
// 2. Print the consent URL; the user opens it and approves access
// 3. Google redirects the browser to the listener with `?code=...&state=...`
// 4. Exchange the code at the token endpoint for access + refresh tokens
//
// **Setup:** create an OAuth client of type "Desktop app" in Google Cloud
// Console, download its JSON and point `GOOGLE_CLIENT_SECRETS` at it
// (defaults to `credentials.json`).

use std::collections::HashMap;

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use reqwest::{Client, Response, Url};
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

use crate::core::auth::{AuthenticationError, AuthorizationFlow, Credential};

const SUCCESS_PAGE: &str = "<html><body><h3>Authentication complete.</h3>\
    <p>You may close this window.</p></body></html>";
const FAILURE_PAGE: &str = "<html><body><h3>Authentication failed.</h3>\
    <p>Return to the terminal for details.</p></body></html>";

fn default_auth_uri() -> String {
    "https://accounts.google.com/o/oauth2/auth".to_string()
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// OAuth client identity, as found under `installed` (or `web`) in the
/// downloaded client secrets file.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

#[derive(Debug, Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientConfig>,
    web: Option<ClientConfig>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
    /// Space-separated list of granted scopes.
    #[serde(default)]
    scope: Option<String>,
}

pub struct InstalledAppFlow {
    config: ClientConfig,
    client: Client,
}

impl InstalledAppFlow {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    pub async fn from_file(path: &str) -> Result<Self, AuthenticationError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AuthenticationError::ClientConfig(format!("{}: {}", path, e)))?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, AuthenticationError> {
        let file: ClientSecretsFile = serde_json::from_str(json)
            .map_err(|e| AuthenticationError::ClientConfig(e.to_string()))?;

        let config = file.installed.or(file.web).ok_or_else(|| {
            AuthenticationError::ClientConfig(
                "client secrets contain neither an 'installed' nor a 'web' section".to_string(),
            )
        })?;

        Ok(Self::new(config))
    }

    fn authorization_url(
        &self,
        redirect_uri: &str,
        scope: &str,
        state: &str,
    ) -> Result<Url, AuthenticationError> {
        Url::parse_with_params(
            &self.config.auth_uri,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", redirect_uri),
                ("response_type", "code"),
                ("scope", scope),
                ("state", state),
                ("access_type", "offline"),
                ("prompt", "consent"),
            ],
        )
        .map_err(|e| AuthenticationError::ClientConfig(format!("bad auth_uri: {}", e)))
    }

    /// Accept connections until one carries the OAuth callback; answer it and
    /// return the authorization code.
    async fn wait_for_callback(
        listener: &TcpListener,
        expected_state: &str,
    ) -> Result<String, AuthenticationError> {
        loop {
            let (mut stream, _) = listener
                .accept()
                .await
                .map_err(|e| AuthenticationError::Flow(e.to_string()))?;

            let mut reader = BufReader::new(&mut stream);
            let mut request_line = String::new();
            match reader.read_line(&mut request_line).await {
                Ok(0) => {
                    // Preconnect: opened and closed without a request.
                    tracing::debug!("Callback connection closed before sending a request");
                    continue;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!("Could not read callback request: {}", e);
                    continue;
                }
            }

            // Drain the headers; closing with unread input resets the connection.
            let mut header = String::new();
            loop {
                header.clear();
                match reader.read_line(&mut header).await {
                    Ok(read) if read > 0 && !header.trim_end().is_empty() => {}
                    _ => break,
                }
            }

            let outcome = parse_callback(&request_line, expected_state);
            let (status, body) = match &outcome {
                Ok(Some(_)) => ("200 OK", SUCCESS_PAGE),
                Ok(None) => ("404 Not Found", ""),
                Err(_) => ("400 Bad Request", FAILURE_PAGE),
            };

            let reply = format!(
                "HTTP/1.1 {}\r\nContent-Type: text/html; charset=utf-8\r\n\
                 Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            if let Err(e) = stream.write_all(reply.as_bytes()).await {
                tracing::warn!("Could not answer authorization callback: {}", e);
            }

            match outcome {
                Ok(Some(code)) => return Ok(code),
                Ok(None) => continue,
                Err(e) => return Err(e),
            }
        }
    }

    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
        scope: &str,
    ) -> Result<Credential, AuthenticationError> {
        let response = self
            .client
            .post(&self.config.token_uri)
            .form(&[
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", redirect_uri),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| AuthenticationError::Flow(e.to_string()))?;

        let token = read_token_response(response)
            .await
            .map_err(AuthenticationError::Flow)?;

        let base = Credential {
            token: String::new(),
            refresh_token: None,
            token_uri: self.config.token_uri.clone(),
            client_id: self.config.client_id.clone(),
            client_secret: self.config.client_secret.clone(),
            scopes: vec![scope.to_string()],
            expiry: None,
        };
        Ok(apply_token_response(&base, token, Utc::now()))
    }
}

#[async_trait]
impl AuthorizationFlow for InstalledAppFlow {
    async fn authorize(&self, scope: &str) -> Result<Credential, AuthenticationError> {
        let listener = TcpListener::bind(("127.0.0.1", 0))
            .await
            .map_err(|e| AuthenticationError::Flow(format!("cannot open callback port: {}", e)))?;
        let port = listener
            .local_addr()
            .map_err(|e| AuthenticationError::Flow(e.to_string()))?
            .port();

        let redirect_uri = format!("http://127.0.0.1:{}/", port);
        let state = new_state();
        let url = self.authorization_url(&redirect_uri, scope, &state)?;

        println!("Please visit this URL to authorize this application:\n{}", url);
        tracing::info!("Waiting for authorization callback on port {}", port);

        let code = Self::wait_for_callback(&listener, &state).await?;
        let credential = self.exchange_code(&code, &redirect_uri, scope).await?;
        tracing::info!("Authorization complete");
        Ok(credential)
    }

    async fn refresh(&self, credential: &Credential) -> Result<Credential, AuthenticationError> {
        let refresh_token = credential
            .refresh_token
            .as_deref()
            .ok_or_else(|| AuthenticationError::Refresh("no refresh token".to_string()))?;

        let response = self
            .client
            .post(&credential.token_uri)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", credential.client_id.as_str()),
                ("client_secret", credential.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AuthenticationError::Refresh(e.to_string()))?;

        let token = read_token_response(response)
            .await
            .map_err(AuthenticationError::Refresh)?;
        Ok(apply_token_response(credential, token, Utc::now()))
    }
}

/// Random, URL-safe `state` value for CSRF protection.
fn new_state() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Interpret the request line of a callback hit.
///
/// `Ok(None)` means the request is not the OAuth redirect (a favicon fetch,
/// say) and the listener should keep waiting.
fn parse_callback(
    request_line: &str,
    expected_state: &str,
) -> Result<Option<String>, AuthenticationError> {
    // Anything that is not a parseable request line is not the callback.
    let Some(target) = request_line.split_whitespace().nth(1) else {
        return Ok(None);
    };
    let Ok(url) = Url::parse(&format!("http://127.0.0.1{}", target)) else {
        return Ok(None);
    };
    let params: HashMap<String, String> = url.query_pairs().into_owned().collect();

    if let Some(error) = params.get("error") {
        return Err(AuthenticationError::Flow(format!(
            "authorization denied: {}",
            error
        )));
    }

    let Some(code) = params.get("code") else {
        return Ok(None);
    };

    if params.get("state").map(String::as_str) != Some(expected_state) {
        return Err(AuthenticationError::Flow(
            "state mismatch in authorization callback".to_string(),
        ));
    }

    Ok(Some(code.clone()))
}

async fn read_token_response(response: Response) -> Result<TokenResponse, String> {
    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(format!("token endpoint returned {}: {}", status, text));
    }

    response.json().await.map_err(|e| e.to_string())
}

/// Fold a token endpoint reply into `base`. A reply without a refresh token
/// or scope list keeps the ones already held.
fn apply_token_response(base: &Credential, token: TokenResponse, now: DateTime<Utc>) -> Credential {
    let scopes = match token.scope {
        Some(scope) => scope.split_whitespace().map(str::to_string).collect(),
        None => base.scopes.clone(),
    };

    Credential {
        token: token.access_token,
        refresh_token: token.refresh_token.or_else(|| base.refresh_token.clone()),
        token_uri: base.token_uri.clone(),
        client_id: base.client_id.clone(),
        client_secret: base.client_secret.clone(),
        scopes,
        expiry: token.expires_in.map(|secs| now + Duration::seconds(secs)),
    }
}
