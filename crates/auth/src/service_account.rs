//! Service-account credentials via a signed JWT assertion.

use crate::credentials::{Credentials, DEFAULT_TOKEN_URI, SHEETS_READONLY_SCOPE};
use crate::oauth::OAuthClient;
use crate::provider::TokenSource;
use async_trait::async_trait;
use base64::prelude::BASE64_URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use ring::rand::SystemRandom;
use ring::signature::{RsaKeyPair, RSA_PKCS1_SHA256};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tabdump_core::{ExportError, Result};
use tracing::debug;

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// The fields of a service-account key file that are needed to sign.
#[derive(Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

#[derive(Serialize)]
struct JwtHeader<'a> {
    alg: &'static str,
    typ: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    kid: Option<&'a str>,
}

#[derive(Serialize)]
struct JwtClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    exp: i64,
    iat: i64,
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn try_from_str(input: &str) -> Result<Self> {
        serde_json::from_str(input).map_err(|e| {
            ExportError::config(format!("Failed to deserialize service account key: {e}"))
        })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::try_from_str(&content)
    }

    fn key_pair(&self) -> Result<RsaKeyPair> {
        let mut reader = std::io::Cursor::new(self.private_key.as_bytes());
        let key = rustls_pemfile::read_one(&mut reader)
            .map_err(|e| ExportError::auth(format!("invalid PEM private key: {e}")))?;

        match key {
            Some(rustls_pemfile::Item::Pkcs8Key(der)) => {
                RsaKeyPair::from_pkcs8(der.secret_pkcs8_der()).map_err(|_| {
                    ExportError::auth("Failed to create rsa key pair from pkcs8 key")
                })
            }
            Some(rustls_pemfile::Item::Pkcs1Key(der)) => RsaKeyPair::from_der(
                der.secret_pkcs1_der(),
            )
            .map_err(|_| ExportError::auth("Failed to create rsa key pair from pkcs1 key")),
            _ => Err(ExportError::auth("Missing private key in service account key")),
        }
    }

    /// Build the signed RS256 assertion for `scope`, issued at `now`.
    pub fn signed_assertion(&self, scope: &str, now: DateTime<Utc>) -> Result<String> {
        let iat = now.timestamp();
        let exp = (now + Duration::hours(1)).timestamp();

        let header = JwtHeader {
            alg: "RS256",
            typ: "JWT",
            kid: self.private_key_id.as_deref(),
        };
        let claims = JwtClaims {
            iss: &self.client_email,
            scope,
            aud: &self.token_uri,
            exp,
            iat,
        };

        let header_b64 = BASE64_URL_SAFE_NO_PAD.encode(serde_json::to_string(&header)?);
        let claims_b64 = BASE64_URL_SAFE_NO_PAD.encode(serde_json::to_string(&claims)?);
        let signing_input = format!("{header_b64}.{claims_b64}");

        let key_pair = self.key_pair()?;
        let mut signature = vec![0; key_pair.public().modulus_len()];
        key_pair
            .sign(
                &RSA_PKCS1_SHA256,
                &SystemRandom::new(),
                signing_input.as_bytes(),
                &mut signature,
            )
            .map_err(|_| ExportError::auth("Failed to sign jwt assertion"))?;

        let sig_b64 = BASE64_URL_SAFE_NO_PAD.encode(&signature);
        Ok(format!("{signing_input}.{sig_b64}"))
    }
}

/// Obtains tokens for a service account.
///
/// Service-account tokens carry no refresh token; once expired the provider
/// asks this source for a new one.
#[derive(Debug)]
pub struct ServiceAccountSource {
    key: ServiceAccountKey,
    scope: String,
    oauth: OAuthClient,
}

impl ServiceAccountSource {
    pub fn new(key: ServiceAccountKey) -> Result<Self> {
        Ok(Self {
            key,
            scope: SHEETS_READONLY_SCOPE.to_string(),
            oauth: OAuthClient::new()?,
        })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(ServiceAccountKey::from_file(path)?)
    }
}

#[async_trait]
impl TokenSource for ServiceAccountSource {
    async fn acquire(&self) -> Result<Credentials> {
        debug!(client_email = %self.key.client_email, "requesting service account token");

        let jwt = self.key.signed_assertion(&self.scope, Utc::now())?;
        let params = [("grant_type", JWT_BEARER_GRANT), ("assertion", jwt.as_str())];
        let response = self.oauth.request_token(&self.key.token_uri, &params).await?;

        let mut base = Credentials::from_access_token("");
        base.scopes = vec![self.scope.clone()];
        Ok(response.into_credentials(base))
    }

    fn name(&self) -> &'static str {
        "service-account"
    }
}
