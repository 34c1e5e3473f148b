use crate::credentials::{Credentials, DEFAULT_TOKEN_URI, SHEETS_READONLY_SCOPE};
use crate::oauth::OAuthClient;
use crate::provider::TokenSource;
use async_trait::async_trait;
use tabdump_core::Result;

/// Mints access tokens from a refresh token issued out of band.
#[derive(Debug)]
pub struct RefreshTokenSource {
    seed: Credentials,
    oauth: OAuthClient,
}

impl RefreshTokenSource {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Result<Self> {
        let seed = Credentials {
            refresh_token: Some(refresh_token.into()),
            scopes: vec![SHEETS_READONLY_SCOPE.to_string()],
            client_id: Some(client_id.into()),
            client_secret: Some(client_secret.into()),
            token_uri: Some(DEFAULT_TOKEN_URI.to_string()),
            ..Credentials::from_access_token("")
        };

        Ok(Self {
            seed,
            oauth: OAuthClient::new()?,
        })
    }

    /// Use a token endpoint other than Google's.
    #[must_use]
    pub fn with_token_uri(mut self, token_uri: impl Into<String>) -> Self {
        self.seed.token_uri = Some(token_uri.into());
        self
    }
}

#[async_trait]
impl TokenSource for RefreshTokenSource {
    async fn acquire(&self) -> Result<Credentials> {
        self.oauth.refresh(&self.seed).await
    }

    fn name(&self) -> &'static str {
        "refresh-token"
    }
}
