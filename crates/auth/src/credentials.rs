use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Read-only access to spreadsheet contents.
pub const SHEETS_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets.readonly";

/// Google's OAuth 2.0 token endpoint.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Tokens expiring within this window are treated as already expired.
const EXPIRY_SKEW_SECS: i64 = 60;

/// An access token plus what is needed to refresh it.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_uri: Option<String>,
}

impl Credentials {
    /// Credentials holding only an access token with no known expiry.
    #[must_use]
    pub fn from_access_token(access_token: impl Into<String>) -> Self {
        Credentials {
            access_token: access_token.into(),
            refresh_token: None,
            expires_at: None,
            scopes: Vec::new(),
            client_id: None,
            client_secret: None,
            token_uri: None,
        }
    }

    /// Set the expiry to `now + expires_in` seconds.
    #[must_use]
    pub fn expiring_in(mut self, now: DateTime<Utc>, expires_in: u64) -> Self {
        let secs = i64::try_from(expires_in).unwrap_or(i64::MAX);
        self.expires_at = now.checked_add_signed(Duration::seconds(secs));
        self
    }

    /// Whether the access token is usable right now.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    /// Whether the access token is usable at `now`.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.access_token.is_empty() && !self.is_expired_at(now)
    }

    /// Whether the token has expired (or will within the skew window) at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at - Duration::seconds(EXPIRY_SKEW_SECS) <= now,
            None => false,
        }
    }

    /// Whether there is enough information to refresh the token.
    #[must_use]
    pub fn can_refresh(&self) -> bool {
        self.refresh_token.is_some() && self.client_id.is_some() && self.token_uri.is_some()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("expires_at", &self.expires_at)
            .field("scopes", &self.scopes)
            .field("client_id", &self.client_id)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn test_no_expiry_is_valid() {
        let creds = Credentials::from_access_token("tok");
        assert!(creds.is_valid_at(at(1_000)));
    }

    #[test]
    fn test_empty_token_is_invalid() {
        let creds = Credentials::from_access_token("");
        assert!(!creds.is_valid_at(at(1_000)));
    }

    #[test]
    fn test_expiry_with_skew() {
        let creds = Credentials::from_access_token("tok").expiring_in(at(1_000), 3600);
        assert_eq!(creds.expires_at, Some(at(4_600)));
        assert!(creds.is_valid_at(at(4_000)));
        // inside the 60 second skew window
        assert!(!creds.is_valid_at(at(4_550)));
        assert!(creds.is_expired_at(at(5_000)));
    }

    #[test]
    fn test_can_refresh() {
        let mut creds = Credentials::from_access_token("tok");
        assert!(!creds.can_refresh());

        creds.refresh_token = Some("rt".to_string());
        creds.client_id = Some("id".to_string());
        assert!(!creds.can_refresh());

        creds.token_uri = Some(DEFAULT_TOKEN_URI.to_string());
        assert!(creds.can_refresh());
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let mut creds = Credentials::from_access_token("secret-access");
        creds.refresh_token = Some("secret-refresh".to_string());
        let debug = format!("{creds:?}");
        assert!(!debug.contains("secret-access"));
        assert!(!debug.contains("secret-refresh"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_json_roundtrip_skips_missing() {
        let creds = Credentials::from_access_token("tok").expiring_in(at(0), 10);
        let json = serde_json::to_string(&creds).unwrap();
        assert!(!json.contains("refresh_token"));

        let restored: Credentials = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, creds);
    }
}
