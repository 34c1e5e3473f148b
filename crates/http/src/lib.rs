//! # tabdump-http
//!
//! Client for the Google Sheets v4 REST API.
//!
//! Only the two read calls the exporter needs are implemented: listing the
//! tab titles of a spreadsheet and fetching the values of an A1 range.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::time::Duration;
use tabdump_auth::Credentials;
use tabdump_core::{ExportConfig, ExportError, Result, ValueRender, DEFAULT_API_BASE_URL};
use tabdump_sheet::CellValue;
use tracing::debug;
use url::Url;

/// Read access to a spreadsheet's tabs and values.
#[async_trait]
pub trait SpreadsheetApi: Send + Sync {
    /// Tab titles in the order the API returns them.
    async fn tab_names(&self, spreadsheet_id: &str) -> Result<Vec<String>>;

    /// Row-major values of `range` (e.g. `'Sheet1'!A:Z`); empty when the
    /// range holds no data.
    async fn values(&self, spreadsheet_id: &str, range: &str) -> Result<Vec<Vec<CellValue>>>;
}

/// Options for [`SheetsClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub base_url: String,
    pub timeout_secs: u64,
    pub value_render: ValueRender,
}

impl Default for ClientOptions {
    fn default() -> Self {
        ClientOptions {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: 30,
            value_render: ValueRender::default(),
        }
    }
}

impl From<&ExportConfig> for ClientOptions {
    fn from(config: &ExportConfig) -> Self {
        ClientOptions {
            base_url: config.api_base_url.clone(),
            timeout_secs: config.timeout_secs,
            value_render: config.value_render,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMetadata {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<JsonValue>>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Sheets API session authorized with one access token.
pub struct SheetsClient {
    client: Client,
    base_url: Url,
    access_token: String,
    value_render: ValueRender,
}

impl SheetsClient {
    /// Constructs a client against the public API with default options.
    ///
    /// # Errors
    ///
    /// Returns `ExportError::Http` if building the underlying HTTP client fails.
    pub fn new(credentials: &Credentials) -> Result<Self> {
        Self::with_options(credentials, ClientOptions::default())
    }

    /// Constructs a client with custom base URL, timeout and render mode.
    ///
    /// # Errors
    ///
    /// Returns `ExportError::Config` for an unparsable base URL and
    /// `ExportError::Http` if building the HTTP client fails.
    pub fn with_options(credentials: &Credentials, options: ClientOptions) -> Result<Self> {
        let base_url = Url::parse(&options.base_url).map_err(|e| {
            ExportError::config(format!("Invalid API base URL {}: {e}", options.base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ExportError::config(format!(
                "Invalid API base URL {}",
                options.base_url
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_secs))
            .build()
            .map_err(|e| ExportError::http(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            access_token: credentials.access_token.clone(),
            value_render: options.value_render,
        })
    }

    /// `{base}/spreadsheets/{segments...}` with each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("spreadsheets").extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, query: &[(&str, &str)]) -> Result<T> {
        debug!(%url, "GET");

        let response = self
            .client
            .get(url)
            .query(query)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| ExportError::http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|envelope| envelope.error.message)
                .unwrap_or_else(|_| status.canonical_reason().unwrap_or("Unknown").to_string());
            return Err(ExportError::api(status.as_u16(), message));
        }

        response
            .json()
            .await
            .map_err(|e| ExportError::http(format!("Failed to parse JSON: {e}")))
    }
}

#[async_trait]
impl SpreadsheetApi for SheetsClient {
    async fn tab_names(&self, spreadsheet_id: &str) -> Result<Vec<String>> {
        let url = self.endpoint(&[spreadsheet_id]);
        let metadata: SpreadsheetMetadata = self
            .get_json(url, &[("fields", "sheets.properties.title")])
            .await?;

        Ok(metadata
            .sheets
            .into_iter()
            .map(|sheet| sheet.properties.title)
            .collect())
    }

    async fn values(&self, spreadsheet_id: &str, range: &str) -> Result<Vec<Vec<CellValue>>> {
        let url = self.endpoint(&[spreadsheet_id, "values", range]);
        let value_range: ValueRange = self
            .get_json(
                url,
                &[
                    ("majorDimension", "ROWS"),
                    ("valueRenderOption", self.value_render.as_api_str()),
                ],
            )
            .await?;

        Ok(value_range
            .values
            .into_iter()
            .map(|row| row.into_iter().map(CellValue::from_json).collect())
            .collect())
    }
}
