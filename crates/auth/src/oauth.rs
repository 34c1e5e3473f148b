//! OAuth 2.0 token endpoint calls shared by the credential strategies.

use crate::credentials::Credentials;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tabdump_core::{ExportError, Result};
use tracing::debug;

/// Successful token endpoint response.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

impl TokenResponse {
    /// Turn the response into credentials, keeping fields the response omits
    /// (refresh token, client, token URI) from `previous`.
    #[must_use]
    pub fn into_credentials(self, previous: Credentials) -> Credentials {
        let scopes = match self.scope {
            Some(scope) => scope.split_whitespace().map(str::to_string).collect(),
            None => previous.scopes,
        };

        let creds = Credentials {
            access_token: self.access_token,
            refresh_token: self.refresh_token.or(previous.refresh_token),
            expires_at: None,
            scopes,
            client_id: previous.client_id,
            client_secret: previous.client_secret,
            token_uri: previous.token_uri,
        };

        match self.expires_in {
            Some(expires_in) => creds.expiring_in(Utc::now(), expires_in),
            None => creds,
        }
    }
}

/// Client for an OAuth 2.0 token endpoint.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    http: Client,
}

impl OAuthClient {
    /// Constructs a client with a 30 second timeout.
    pub fn new() -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ExportError::http(e.to_string()))?;

        Ok(Self { http })
    }

    /// POST form parameters to `token_uri` and parse the token response.
    pub async fn request_token(
        &self,
        token_uri: &str,
        params: &[(&str, &str)],
    ) -> Result<TokenResponse> {
        debug!(token_uri, "requesting access token");

        let response = self
            .http
            .post(token_uri)
            .form(params)
            .send()
            .await
            .map_err(|e| ExportError::http(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ExportError::http(e.to_string()))?;

        if !status.is_success() {
            let message = match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(err) => match err.error_description {
                    Some(description) => format!("{}: {description}", err.error),
                    None => err.error,
                },
                Err(_) => format!("token endpoint returned HTTP {status}"),
            };
            return Err(ExportError::auth(message));
        }

        serde_json::from_str(&body)
            .map_err(|e| ExportError::auth(format!("Failed to parse token response: {e}")))
    }

    /// Exchange a refresh token for a new access token.
    pub async fn refresh(&self, creds: &Credentials) -> Result<Credentials> {
        let (Some(refresh_token), Some(client_id), Some(token_uri)) = (
            creds.refresh_token.as_deref(),
            creds.client_id.as_deref(),
            creds.token_uri.as_deref(),
        ) else {
            return Err(ExportError::auth(
                "credentials cannot be refreshed: missing refresh token, client id or token uri",
            ));
        };

        let mut params = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", client_id),
        ];
        if let Some(secret) = creds.client_secret.as_deref() {
            params.push(("client_secret", secret));
        }

        let response = self.request_token(token_uri, &params).await?;
        Ok(response.into_credentials(creds.clone()))
    }
}
