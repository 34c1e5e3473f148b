use crate::credentials::Credentials;
use crate::installed::InstalledAppFlow;
use crate::oauth::OAuthClient;
use crate::refresh::RefreshTokenSource;
use crate::service_account::ServiceAccountSource;
use crate::store::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
use async_trait::async_trait;
use tabdump_core::{AuthConfig, ExportConfig, Result};
use tracing::{debug, info, warn};

/// A strategy for obtaining fresh credentials when nothing usable is cached.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn acquire(&self) -> Result<Credentials>;

    /// Short name for logging.
    fn name(&self) -> &'static str;
}

/// Build the token source selected by `auth`.
pub fn token_source_from_config(auth: &AuthConfig) -> Result<Box<dyn TokenSource>> {
    let source: Box<dyn TokenSource> = match auth {
        AuthConfig::Interactive { client_secrets } => {
            Box::new(InstalledAppFlow::from_client_secrets_file(client_secrets)?)
        }
        AuthConfig::RefreshToken {
            client_id,
            client_secret,
            refresh_token,
            token_uri,
        } => {
            let source = RefreshTokenSource::new(client_id, client_secret, refresh_token)?;
            match token_uri {
                Some(uri) => Box::new(source.with_token_uri(uri)),
                None => Box::new(source),
            }
        }
        AuthConfig::ServiceAccount { key_path } => {
            Box::new(ServiceAccountSource::from_file(key_path)?)
        }
    };
    Ok(source)
}

/// Strategy named by the config, built on first use.
///
/// Client-secrets and key files are only read once a new token is actually
/// needed, so a valid cached token works without them.
struct ConfiguredSource {
    auth: AuthConfig,
}

#[async_trait]
impl TokenSource for ConfiguredSource {
    async fn acquire(&self) -> Result<Credentials> {
        token_source_from_config(&self.auth)?.acquire().await
    }

    fn name(&self) -> &'static str {
        match self.auth {
            AuthConfig::Interactive { .. } => "interactive",
            AuthConfig::RefreshToken { .. } => "refresh-token",
            AuthConfig::ServiceAccount { .. } => "service-account",
        }
    }
}

/// Supplies valid credentials, using the cache when it can.
pub struct CredentialProvider {
    store: Box<dyn CredentialStore>,
    source: Box<dyn TokenSource>,
    oauth: OAuthClient,
}

impl CredentialProvider {
    pub fn new(store: Box<dyn CredentialStore>, source: Box<dyn TokenSource>) -> Result<Self> {
        Ok(Self {
            store,
            source,
            oauth: OAuthClient::new()?,
        })
    }

    /// Provider wired up from the export config's `auth` and `token_cache`.
    pub fn from_config(config: &ExportConfig) -> Result<Self> {
        let store: Box<dyn CredentialStore> = match &config.token_cache {
            Some(path) => Box::new(FileCredentialStore::new(path)),
            None => Box::new(MemoryCredentialStore::new()),
        };
        let source = ConfiguredSource {
            auth: config.auth.clone(),
        };
        Self::new(store, Box::new(source))
    }

    /// Return valid credentials.
    ///
    /// Order: valid cached token, then refresh of an expired cached token,
    /// then a new token from the configured strategy. Anything newly obtained
    /// is written back to the store.
    pub async fn get_credentials(&self) -> Result<Credentials> {
        if let Some(cached) = self.store.load()? {
            if cached.is_valid() {
                debug!("using cached credentials");
                return Ok(cached);
            }

            if cached.can_refresh() {
                debug!("cached credentials expired, refreshing");
                match self.oauth.refresh(&cached).await {
                    Ok(refreshed) => {
                        self.store.save(&refreshed)?;
                        return Ok(refreshed);
                    }
                    Err(e) => warn!("token refresh failed, re-authorizing: {e}"),
                }
            }
        }

        info!(strategy = self.source.name(), "obtaining new credentials");
        let creds = self.source.acquire().await?;
        self.store.save(&creds)?;
        Ok(creds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tabdump_core::ExportError;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct CountingSource {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl TokenSource for CountingSource {
        async fn acquire(&self) -> Result<Credentials> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Credentials::from_access_token("acquired").expiring_in(Utc::now(), 3600))
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    struct SharedStore(Arc<MemoryCredentialStore>);

    impl CredentialStore for SharedStore {
        fn load(&self) -> Result<Option<Credentials>> {
            self.0.load()
        }

        fn save(&self, credentials: &Credentials) -> Result<()> {
            self.0.save(credentials)
        }
    }

    fn provider(store: Arc<MemoryCredentialStore>) -> (CredentialProvider, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let source = CountingSource {
            calls: Arc::clone(&calls),
        };
        let provider =
            CredentialProvider::new(Box::new(SharedStore(store)), Box::new(source)).unwrap();
        (provider, calls)
    }

    fn expired() -> Credentials {
        let mut creds = Credentials::from_access_token("stale");
        creds.expires_at = Some(Utc::now() - Duration::minutes(5));
        creds
    }

    #[tokio::test]
    async fn test_empty_cache_acquires_and_saves() {
        let store = Arc::new(MemoryCredentialStore::new());
        let (provider, calls) = provider(Arc::clone(&store));

        let creds = provider.get_credentials().await.unwrap();
        assert_eq!(creds.access_token, "acquired");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.load().unwrap().unwrap().access_token, "acquired");
    }

    #[tokio::test]
    async fn test_valid_cache_skips_strategy() {
        let cached = Credentials::from_access_token("cached").expiring_in(Utc::now(), 3600);
        let store = Arc::new(MemoryCredentialStore::with_credentials(cached));
        let (provider, calls) = provider(store);

        let creds = provider.get_credentials().await.unwrap();
        assert_eq!(creds.access_token, "cached");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_expired_without_refresh_token_acquires() {
        let store = Arc::new(MemoryCredentialStore::with_credentials(expired()));
        let (provider, calls) = provider(store);

        let creds = provider.get_credentials().await.unwrap();
        assert_eq!(creds.access_token, "acquired");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_with_refresh_token_refreshes_and_saves() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "refreshed",
                "expires_in": 3600
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut cached = expired();
        cached.refresh_token = Some("rt".to_string());
        cached.client_id = Some("cid".to_string());
        cached.token_uri = Some(format!("{}/token", server.uri()));

        let store = Arc::new(MemoryCredentialStore::with_credentials(cached));
        let (provider, calls) = provider(Arc::clone(&store));

        let creds = provider.get_credentials().await.unwrap();
        assert_eq!(creds.access_token, "refreshed");
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let saved = store.load().unwrap().unwrap();
        assert_eq!(saved.access_token, "refreshed");
        assert_eq!(saved.refresh_token.as_deref(), Some("rt"));
    }

    #[tokio::test]
    async fn test_failed_refresh_falls_back_to_strategy() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant"
            })))
            .mount(&server)
            .await;

        let mut cached = expired();
        cached.refresh_token = Some("revoked".to_string());
        cached.client_id = Some("cid".to_string());
        cached.token_uri = Some(format!("{}/token", server.uri()));

        let store = Arc::new(MemoryCredentialStore::with_credentials(cached));
        let (provider, calls) = provider(store);

        let creds = provider.get_credentials().await.unwrap();
        assert_eq!(creds.access_token, "acquired");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    fn missing_secrets_config(dir: &std::path::Path) -> ExportConfig {
        ExportConfig {
            token_cache: Some(dir.join("token.json")),
            auth: AuthConfig::Interactive {
                client_secrets: dir.join("missing_credentials.json"),
            },
            ..ExportConfig::default()
        }
    }

    #[tokio::test]
    async fn test_valid_cache_without_client_secrets_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = missing_secrets_config(dir.path());
        let cached = Credentials::from_access_token("cached").expiring_in(Utc::now(), 3600);
        FileCredentialStore::new(dir.path().join("token.json"))
            .save(&cached)
            .unwrap();

        let provider = CredentialProvider::from_config(&config).unwrap();
        let creds = provider.get_credentials().await.unwrap();
        assert_eq!(creds.access_token, "cached");
    }

    #[tokio::test]
    async fn test_missing_client_secrets_fails_when_token_needed() {
        let dir = tempfile::tempdir().unwrap();
        let config = missing_secrets_config(dir.path());

        let provider = CredentialProvider::from_config(&config).unwrap();
        assert!(matches!(
            provider.get_credentials().await,
            Err(ExportError::Config(_))
        ));
    }

    #[test]
    fn test_from_config_missing_key_file_is_deferred() {
        let config = ExportConfig {
            auth: AuthConfig::ServiceAccount {
                key_path: PathBuf::from("/nonexistent/key.json"),
            },
            ..ExportConfig::default()
        };
        assert!(CredentialProvider::from_config(&config).is_ok());
    }

    #[test]
    fn test_configured_source_name() {
        let source = ConfiguredSource {
            auth: AuthConfig::ServiceAccount {
                key_path: PathBuf::from("key.json"),
            },
        };
        assert_eq!(source.name(), "service-account");
    }

    #[test]
    fn test_token_source_from_config_refresh_token() {
        let auth = AuthConfig::RefreshToken {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            refresh_token: "rt".to_string(),
            token_uri: None,
        };
        let source = token_source_from_config(&auth).unwrap();
        assert_eq!(source.name(), "refresh-token");
    }
}
