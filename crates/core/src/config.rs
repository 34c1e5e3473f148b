use crate::error::{ExportError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Value left in place of a real spreadsheet ID.
pub const PLACEHOLDER_SPREADSHEET_ID: &str = "YOUR_SPREADSHEET_ID_HERE";

/// Default Sheets API base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://sheets.googleapis.com/v4/";

/// How the Sheets API should render cell values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueRender {
    /// Values as displayed in the UI (default)
    #[default]
    Formatted,
    /// Raw numbers and booleans
    Unformatted,
    /// Formula source text where present
    Formula,
}

impl ValueRender {
    /// The `valueRenderOption` query value for this mode.
    #[must_use]
    pub fn as_api_str(self) -> &'static str {
        match self {
            ValueRender::Formatted => "FORMATTED_VALUE",
            ValueRender::Unformatted => "UNFORMATTED_VALUE",
            ValueRender::Formula => "FORMULA",
        }
    }
}

/// Which credential strategy to use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum AuthConfig {
    /// Browser consent flow using an OAuth client-secrets file.
    Interactive {
        #[serde(default = "default_client_secrets")]
        client_secrets: PathBuf,
    },
    /// Long-lived refresh token issued out of band.
    RefreshToken {
        client_id: String,
        client_secret: String,
        refresh_token: String,
        #[serde(default)]
        token_uri: Option<String>,
    },
    /// Service-account key file.
    ServiceAccount { key_path: PathBuf },
}

impl Default for AuthConfig {
    fn default() -> Self {
        AuthConfig::Interactive {
            client_secrets: default_client_secrets(),
        }
    }
}

/// Export configuration.
///
/// Every field has a default, so an empty YAML document is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub spreadsheet_id: Option<String>,
    pub output_dir: PathBuf,
    /// Column range applied to every tab, in A1 notation
    pub range: String,
    /// Restrict the export to these tabs (empty = all)
    pub tabs: Vec<String>,
    pub value_render: ValueRender,
    /// Token cache file; `None` disables caching
    pub token_cache: Option<PathBuf>,
    pub timeout_secs: u64,
    pub api_base_url: String,
    pub auth: AuthConfig,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            spreadsheet_id: None,
            output_dir: PathBuf::from("sheets_export"),
            range: "A:Z".to_string(),
            tabs: Vec::new(),
            value_render: ValueRender::default(),
            token_cache: Some(PathBuf::from("token.json")),
            timeout_secs: 30,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            auth: AuthConfig::default(),
        }
    }
}

impl ExportConfig {
    /// Parse a config from YAML text.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Load a config from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&content)
    }

    /// The spreadsheet ID, unless it is missing or still the placeholder.
    #[must_use]
    pub fn effective_spreadsheet_id(&self) -> Option<&str> {
        self.spreadsheet_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty() && *id != PLACEHOLDER_SPREADSHEET_ID)
    }

    /// Check the fields that can be checked without touching the network.
    pub fn validate(&self) -> Result<()> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(ExportError::config("output_dir must not be empty"));
        }
        if self.range.trim().is_empty() {
            return Err(ExportError::config("range must not be empty"));
        }
        if self.timeout_secs == 0 {
            return Err(ExportError::config("timeout_secs must be greater than zero"));
        }
        match &self.auth {
            AuthConfig::Interactive { client_secrets } => {
                if client_secrets.as_os_str().is_empty() {
                    return Err(ExportError::config("client_secrets path must not be empty"));
                }
            }
            AuthConfig::RefreshToken {
                client_id,
                client_secret,
                refresh_token,
                ..
            } => {
                for (name, value) in [
                    ("client_id", client_id),
                    ("client_secret", client_secret),
                    ("refresh_token", refresh_token),
                ] {
                    if value.trim().is_empty() {
                        return Err(ExportError::config(format!(
                            "refresh_token strategy requires {name}"
                        )));
                    }
                }
            }
            AuthConfig::ServiceAccount { key_path } => {
                if key_path.as_os_str().is_empty() {
                    return Err(ExportError::config("service_account strategy requires key_path"));
                }
            }
        }
        Ok(())
    }
}

fn default_client_secrets() -> PathBuf {
    PathBuf::from("credentials.json")
}

fn spreadsheet_url_regex() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/spreadsheets/d/([A-Za-z0-9_-]+)").expect("valid regex"))
}

/// Accept either a bare spreadsheet ID or a full sheet URL.
///
/// The ID is the path segment between `/d/` and `/edit` in a URL like
/// `https://docs.google.com/spreadsheets/d/<ID>/edit#gid=0`.
#[must_use]
pub fn extract_spreadsheet_id(input: &str) -> String {
    let input = input.trim();
    spreadsheet_url_regex()
        .captures(input)
        .and_then(|caps| caps.get(1))
        .map_or_else(|| input.to_string(), |m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = ExportConfig::default();
        assert_eq!(config.output_dir, PathBuf::from("sheets_export"));
        assert_eq!(config.range, "A:Z");
        assert_eq!(config.token_cache, Some(PathBuf::from("token.json")));
        assert_eq!(config.value_render, ValueRender::Formatted);
        assert!(matches!(config.auth, AuthConfig::Interactive { .. }));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let config = ExportConfig::from_yaml_str("").unwrap();
        assert_eq!(config, ExportConfig::default());
    }

    #[test]
    fn test_yaml_overrides() {
        let yaml = r"
spreadsheet_id: abc123
output_dir: out
range: A1:D100
tabs: [Summary, Data]
value_render: unformatted
token_cache: null
auth:
  strategy: service_account
  key_path: sa.json
";
        let config = ExportConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.spreadsheet_id.as_deref(), Some("abc123"));
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.range, "A1:D100");
        assert_eq!(config.tabs, vec!["Summary", "Data"]);
        assert_eq!(config.value_render, ValueRender::Unformatted);
        assert_eq!(config.token_cache, None);
        assert_eq!(
            config.auth,
            AuthConfig::ServiceAccount {
                key_path: PathBuf::from("sa.json")
            }
        );
        // unspecified fields keep their defaults
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_yaml_interactive_default_secrets() {
        let config = ExportConfig::from_yaml_str("auth:\n  strategy: interactive\n").unwrap();
        assert_eq!(config.auth, AuthConfig::default());
    }

    #[test]
    fn test_yaml_unknown_strategy() {
        let result = ExportConfig::from_yaml_str("auth:\n  strategy: magic\n");
        assert!(matches!(result, Err(ExportError::Yaml(_))));
    }

    #[test]
    fn test_from_yaml_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tabdump.yaml");
        std::fs::write(&path, "range: B:C\n").unwrap();

        let config = ExportConfig::from_yaml_file(&path).unwrap();
        assert_eq!(config.range, "B:C");
    }

    #[test]
    fn test_from_missing_file() {
        let result = ExportConfig::from_yaml_file("/nonexistent/tabdump.yaml");
        assert!(matches!(result, Err(ExportError::Io(_))));
    }

    #[test]
    fn test_validate_refresh_token_fields() {
        let config = ExportConfig {
            auth: AuthConfig::RefreshToken {
                client_id: "id".to_string(),
                client_secret: String::new(),
                refresh_token: "rt".to_string(),
                token_uri: None,
            },
            ..ExportConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("client_secret"));
    }

    #[test]
    fn test_validate_zero_timeout() {
        let config = ExportConfig {
            timeout_secs: 0,
            ..ExportConfig::default()
        };
        assert!(matches!(config.validate(), Err(ExportError::Config(_))));
    }

    #[test]
    fn test_effective_spreadsheet_id() {
        let mut config = ExportConfig::default();
        assert_eq!(config.effective_spreadsheet_id(), None);

        config.spreadsheet_id = Some(PLACEHOLDER_SPREADSHEET_ID.to_string());
        assert_eq!(config.effective_spreadsheet_id(), None);

        config.spreadsheet_id = Some("  ".to_string());
        assert_eq!(config.effective_spreadsheet_id(), None);

        config.spreadsheet_id = Some("1AbC".to_string());
        assert_eq!(config.effective_spreadsheet_id(), Some("1AbC"));
    }

    #[test]
    fn test_extract_spreadsheet_id() {
        assert_eq!(
            extract_spreadsheet_id(
                "https://docs.google.com/spreadsheets/d/1f5epAPxP_Yd3g1Tu-nEM/edit#gid=0"
            ),
            "1f5epAPxP_Yd3g1Tu-nEM"
        );
        assert_eq!(extract_spreadsheet_id(" 1f5epAPxP "), "1f5epAPxP");
    }

    #[test]
    fn test_value_render_api_str() {
        assert_eq!(ValueRender::Formatted.as_api_str(), "FORMATTED_VALUE");
        assert_eq!(ValueRender::Unformatted.as_api_str(), "UNFORMATTED_VALUE");
        assert_eq!(ValueRender::Formula.as_api_str(), "FORMULA");
    }
}
