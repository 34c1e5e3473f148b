//! # tabdump-export
//!
//! Writes every tab of a spreadsheet to `<output_dir>/<tab>.csv`.
//!
//! Tabs are processed one at a time in the order the API lists them. A tab
//! with no values, or only blank cells, is skipped without creating a file. The first error aborts
//! the run; files written before it stay on disk.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tabdump_auth::CredentialProvider;
use tabdump_core::{ExportConfig, ExportError, Result};
use tabdump_http::{ClientOptions, SheetsClient, SpreadsheetApi};
use tabdump_sheet::{A1Range, CellBound, CsvOptions, Tab};
use tracing::{info, warn};

/// Progress callbacks; every method defaults to doing nothing.
pub trait ExportListener {
    fn tabs_found(&mut self, _names: &[String]) {}
    fn tab_started(&mut self, _name: &str) {}
    fn tab_skipped(&mut self, _name: &str) {}
    fn tab_saved(&mut self, _name: &str, _path: &Path) {}
    fn tabs_missing(&mut self, _names: &[String]) {}
}

/// Listener that ignores all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListener;

impl ExportListener for NoopListener {}

/// What the exporter needs from the config, validated.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub output_dir: PathBuf,
    pub range: A1Range,
    pub tabs: Vec<String>,
    pub csv: CsvOptions,
}

impl ExportOptions {
    /// Options writing `A:Z` of every tab into `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        ExportOptions {
            output_dir: output_dir.into(),
            range: A1Range {
                start: CellBound { col: 0, row: None },
                end: Some(CellBound { col: 25, row: None }),
            },
            tabs: Vec::new(),
            csv: CsvOptions::default(),
        }
    }

    /// Validate and extract the export options of `config`.
    pub fn from_config(config: &ExportConfig) -> Result<Self> {
        config.validate()?;
        Ok(ExportOptions {
            output_dir: config.output_dir.clone(),
            range: A1Range::parse(&config.range)?,
            tabs: config.tabs.clone(),
            csv: CsvOptions::default(),
        })
    }

    #[must_use]
    pub fn with_range(mut self, range: A1Range) -> Self {
        self.range = range;
        self
    }

    #[must_use]
    pub fn with_tabs(mut self, tabs: Vec<String>) -> Self {
        self.tabs = tabs;
        self
    }
}

/// Outcome of a completed export.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportReport {
    /// Every tab the spreadsheet lists, in API order
    pub tab_names: Vec<String>,
    /// Files written, in export order
    pub written: Vec<PathBuf>,
    /// Tabs with no values
    pub skipped: Vec<String>,
    /// Requested tabs the spreadsheet does not have
    pub missing: Vec<String>,
}

/// Drives the export against any [`SpreadsheetApi`].
pub struct Exporter<'a, A: SpreadsheetApi + ?Sized> {
    api: &'a A,
    options: ExportOptions,
}

impl<'a, A: SpreadsheetApi + ?Sized> Exporter<'a, A> {
    pub fn new(api: &'a A, options: ExportOptions) -> Self {
        Self { api, options }
    }

    /// Export the tabs of `spreadsheet_id`.
    pub async fn export(
        &self,
        spreadsheet_id: &str,
        listener: &mut dyn ExportListener,
    ) -> Result<ExportReport> {
        let tab_names = self.api.tab_names(spreadsheet_id).await?;
        info!(count = tab_names.len(), "found {} sheets", tab_names.len());
        listener.tabs_found(&tab_names);

        let (selected, missing) = self.select_tabs(&tab_names);
        if !missing.is_empty() {
            warn!(?missing, "requested tabs not found in spreadsheet");
            listener.tabs_missing(&missing);
        }

        std::fs::create_dir_all(&self.options.output_dir)?;

        let mut report = ExportReport {
            tab_names: tab_names.clone(),
            missing,
            ..ExportReport::default()
        };

        for name in selected {
            listener.tab_started(name);

            let range = self.options.range.for_tab(name);
            let grid = self.api.values(spreadsheet_id, &range).await?;
            let tab = Tab::new(name.as_str(), grid);

            // Blank cells only (e.g. [[""]]) serialize to "" and count as no data too
            let csv = tab
                .to_csv_with_options(self.options.csv)
                .filter(|csv| !csv.is_empty());
            match csv {
                None => {
                    info!("No data found in sheet: {name}");
                    listener.tab_skipped(name);
                    report.skipped.push(name.clone());
                }
                Some(csv) => {
                    let path = self.options.output_dir.join(tab.file_name());
                    std::fs::write(&path, csv.as_bytes())?;
                    info!(rows = tab.row_count(), path = %path.display(), "saved sheet {name}");
                    listener.tab_saved(name, &path);
                    report.written.push(path);
                }
            }
        }

        Ok(report)
    }

    /// Tabs to export (API order) and requested names that do not exist.
    fn select_tabs<'n>(&self, names: &'n [String]) -> (Vec<&'n String>, Vec<String>) {
        if self.options.tabs.is_empty() {
            return (names.iter().collect(), Vec::new());
        }

        let wanted: HashSet<&str> = self.options.tabs.iter().map(String::as_str).collect();
        let selected = names
            .iter()
            .filter(|name| wanted.contains(name.as_str()))
            .collect();

        let present: HashSet<&str> = names.iter().map(String::as_str).collect();
        let missing = self
            .options
            .tabs
            .iter()
            .filter(|name| !present.contains(name.as_str()))
            .cloned()
            .collect();

        (selected, missing)
    }
}

/// Authenticate, open a Sheets session and export the configured spreadsheet.
///
/// # Errors
///
/// Returns `ExportError::Config` when no spreadsheet ID is configured, and
/// otherwise the first error from authentication, the API or the filesystem.
pub async fn export_spreadsheet(
    config: &ExportConfig,
    listener: &mut dyn ExportListener,
) -> Result<ExportReport> {
    let spreadsheet_id = config
        .effective_spreadsheet_id()
        .ok_or_else(|| ExportError::config("no spreadsheet ID configured"))?;
    let options = ExportOptions::from_config(config)?;

    let provider = CredentialProvider::from_config(config)?;
    let credentials = provider.get_credentials().await?;
    let client = SheetsClient::with_options(&credentials, ClientOptions::from(config))?;

    Exporter::new(&client, options)
        .export(spreadsheet_id, listener)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_default_range() {
        let options = ExportOptions::new("out");
        assert_eq!(options.range.to_string(), "A:Z");
        assert!(options.tabs.is_empty());
        assert_eq!(options.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn test_options_from_config_rejects_bad_range() {
        let config = ExportConfig {
            range: "1:Z".to_string(),
            ..ExportConfig::default()
        };
        assert!(matches!(
            ExportOptions::from_config(&config),
            Err(ExportError::InvalidRange(_))
        ));
    }

    #[test]
    fn test_options_from_config() {
        let config = ExportConfig {
            range: "a1:c10".to_string(),
            tabs: vec!["Data".to_string()],
            ..ExportConfig::default()
        };
        let options = ExportOptions::from_config(&config).unwrap();
        assert_eq!(options.range.to_string(), "A1:C10");
        assert_eq!(options.tabs, vec!["Data"]);
    }
}
