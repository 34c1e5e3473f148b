//! # tabdump-auth
//!
//! Google OAuth 2.0 credentials for the Sheets API.
//!
//! A [`CredentialProvider`] combines a [`CredentialStore`] (the token cache)
//! with one [`TokenSource`] strategy:
//!
//! - [`InstalledAppFlow`]: browser consent with a loopback redirect and PKCE
//! - [`RefreshTokenSource`]: a refresh token issued out of band
//! - [`ServiceAccountSource`]: a service-account key signing a JWT assertion
//!
//! Cached tokens are reused while valid and refreshed when expired; the
//! strategy only runs when neither works.
//!
//! ```no_run
//! use tabdump_auth::{CredentialProvider, FileCredentialStore, InstalledAppFlow};
//!
//! # async fn run() -> tabdump_core::Result<()> {
//! let provider = CredentialProvider::new(
//!     Box::new(FileCredentialStore::new("token.json")),
//!     Box::new(InstalledAppFlow::from_client_secrets_file("credentials.json")?),
//! )?;
//! let creds = provider.get_credentials().await?;
//! println!("token expires at {:?}", creds.expires_at);
//! # Ok(())
//! # }
//! ```

mod credentials;
mod installed;
mod oauth;
mod provider;
mod refresh;
mod service_account;
mod store;

pub use credentials::{Credentials, DEFAULT_TOKEN_URI, SHEETS_READONLY_SCOPE};
pub use installed::{authorization_url, parse_redirect, ClientSecrets, InstalledAppFlow, Pkce};
pub use oauth::{OAuthClient, TokenResponse};
pub use provider::{token_source_from_config, CredentialProvider, TokenSource};
pub use refresh::RefreshTokenSource;
pub use service_account::{ServiceAccountKey, ServiceAccountSource};
pub use store::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
