//! Interactive OAuth flow for installed applications.
//!
//! 1. Bind a loopback listener on a random port
//! 2. Send the user to Google's consent page with a PKCE challenge
//! 3. Receive the authorization code on the loopback redirect
//! 4. Exchange the code (plus PKCE verifier) for tokens

use crate::credentials::{Credentials, SHEETS_READONLY_SCOPE};
use crate::oauth::OAuthClient;
use crate::provider::TokenSource;
use async_trait::async_trait;
use base64::prelude::BASE64_URL_SAFE_NO_PAD;
use base64::Engine;
use colored::Colorize;
use ring::digest::{digest, SHA256};
use ring::rand::{SecureRandom, SystemRandom};
use serde::Deserialize;
use std::path::Path;
use tabdump_core::{ExportError, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::{debug, warn};
use url::Url;

const MAX_REQUEST_BYTES: usize = 16 * 1024;

const SUCCESS_PAGE: &str = "<html><body><h3>Authorization complete.</h3>\
<p>You can close this window and return to the terminal.</p></body></html>";

const FAILURE_PAGE: &str = "<html><body><h3>Authorization failed.</h3>\
<p>Check the terminal for details.</p></body></html>";

/// OAuth client registration from a downloaded `credentials.json`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    pub auth_uri: String,
    pub token_uri: String,
}

#[derive(Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    /// Parse a client-secrets document with an `installed` or `web` section.
    pub fn try_from_str(input: &str) -> Result<Self> {
        let file: ClientSecretsFile = serde_json::from_str(input)
            .map_err(|e| ExportError::config(format!("Failed to parse client secrets: {e}")))?;

        file.installed.or(file.web).ok_or_else(|| {
            ExportError::config("client secrets file has neither an 'installed' nor a 'web' section")
        })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ExportError::config(format!(
                "Failed to read client secrets {}: {e}",
                path.display()
            ))
        })?;
        Self::try_from_str(&content)
    }
}

/// PKCE verifier/challenge pair (RFC 7636, S256).
#[derive(Debug, Clone)]
pub struct Pkce {
    pub verifier: String,
    pub challenge: String,
}

impl Pkce {
    pub fn generate(rng: &dyn SecureRandom) -> Result<Self> {
        let verifier = random_token(rng, 32)?;
        Ok(Self::from_verifier(verifier))
    }

    #[must_use]
    pub fn from_verifier(verifier: String) -> Self {
        let hash = digest(&SHA256, verifier.as_bytes());
        let challenge = BASE64_URL_SAFE_NO_PAD.encode(hash.as_ref());
        Self {
            verifier,
            challenge,
        }
    }
}

fn random_token(rng: &dyn SecureRandom, len: usize) -> Result<String> {
    let mut bytes = vec![0u8; len];
    rng.fill(&mut bytes)
        .map_err(|_| ExportError::auth("Failed to generate random bytes"))?;
    Ok(BASE64_URL_SAFE_NO_PAD.encode(bytes))
}

/// The consent page URL.
pub fn authorization_url(
    secrets: &ClientSecrets,
    redirect_uri: &str,
    scope: &str,
    state: &str,
    pkce: &Pkce,
) -> Result<Url> {
    Url::parse_with_params(
        &secrets.auth_uri,
        &[
            ("response_type", "code"),
            ("client_id", secrets.client_id.as_str()),
            ("redirect_uri", redirect_uri),
            ("scope", scope),
            ("state", state),
            ("code_challenge", pkce.challenge.as_str()),
            ("code_challenge_method", "S256"),
            ("access_type", "offline"),
            ("prompt", "consent"),
        ],
    )
    .map_err(|e| ExportError::config(format!("Invalid auth_uri {}: {e}", secrets.auth_uri)))
}

/// Extract the authorization code from the redirect's request line.
///
/// `expected_state` must match the `state` query parameter.
pub fn parse_redirect(request_line: &str, expected_state: &str) -> Result<String> {
    let target = request_line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| ExportError::auth("Malformed redirect request"))?;
    let url = Url::parse("http://127.0.0.1")
        .and_then(|base| base.join(target))
        .map_err(|e| ExportError::auth(format!("Malformed redirect target: {e}")))?;

    let mut code = None;
    let mut state = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => {
                return Err(ExportError::auth(format!("Authorization denied: {value}")));
            }
            _ => {}
        }
    }

    if state.as_deref() != Some(expected_state) {
        return Err(ExportError::auth("OAuth state mismatch in redirect"));
    }
    code.ok_or_else(|| ExportError::auth("Redirect did not include an authorization code"))
}

/// Accept one redirect on `listener`, answer the browser, and return the code.
pub async fn receive_code(listener: &TcpListener, expected_state: &str) -> Result<String> {
    let (mut stream, peer) = listener.accept().await?;
    debug!(%peer, "received oauth redirect");

    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if buf.windows(4).any(|w| w == b"\r\n\r\n") || buf.len() >= MAX_REQUEST_BYTES {
            break;
        }
    }

    let request = String::from_utf8_lossy(&buf);
    let request_line = request.lines().next().unwrap_or_default();
    let result = parse_redirect(request_line, expected_state);

    let (status, page) = if result.is_ok() {
        ("200 OK", SUCCESS_PAGE)
    } else {
        ("400 Bad Request", FAILURE_PAGE)
    };
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{page}",
        page.len()
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await?;

    result
}

/// Browser-based consent flow.
#[derive(Debug)]
pub struct InstalledAppFlow {
    secrets: ClientSecrets,
    scope: String,
    open_browser: bool,
    oauth: OAuthClient,
}

impl InstalledAppFlow {
    pub fn new(secrets: ClientSecrets) -> Result<Self> {
        Ok(Self {
            secrets,
            scope: SHEETS_READONLY_SCOPE.to_string(),
            open_browser: true,
            oauth: OAuthClient::new()?,
        })
    }

    pub fn from_client_secrets_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(ClientSecrets::from_file(path)?)
    }

    /// Only print the consent URL instead of also launching a browser.
    #[must_use]
    pub fn without_browser(mut self) -> Self {
        self.open_browser = false;
        self
    }

    /// Exchange an authorization code for credentials.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
        verifier: &str,
    ) -> Result<Credentials> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.secrets.client_id.as_str()),
            ("client_secret", self.secrets.client_secret.as_str()),
            ("redirect_uri", redirect_uri),
            ("code_verifier", verifier),
        ];
        let response = self
            .oauth
            .request_token(&self.secrets.token_uri, &params)
            .await?;

        let base = Credentials {
            scopes: vec![self.scope.clone()],
            client_id: Some(self.secrets.client_id.clone()),
            client_secret: Some(self.secrets.client_secret.clone()),
            token_uri: Some(self.secrets.token_uri.clone()),
            ..Credentials::from_access_token("")
        };
        Ok(response.into_credentials(base))
    }
}

#[async_trait]
impl TokenSource for InstalledAppFlow {
    async fn acquire(&self) -> Result<Credentials> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let port = listener.local_addr()?.port();
        let redirect_uri = format!("http://127.0.0.1:{port}/");

        let rng = SystemRandom::new();
        let pkce = Pkce::generate(&rng)?;
        let state = random_token(&rng, 16)?;
        let url = authorization_url(&self.secrets, &redirect_uri, &self.scope, &state, &pkce)?;

        println!(
            "{} Please visit this URL to authorize read-only access to your spreadsheets:\n\n  {}\n",
            "Auth:".cyan().bold(),
            url
        );
        if self.open_browser {
            if let Err(e) = open::that(url.as_str()) {
                warn!("could not open a browser: {e}");
            }
        }

        let code = receive_code(&listener, &state).await?;
        self.exchange_code(&code, &redirect_uri, &pkce.verifier).await
    }

    fn name(&self) -> &'static str {
        "interactive"
    }
}
