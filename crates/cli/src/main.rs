//! # tabdump-cli
//!
//! Command-line interface: export every tab of a Google spreadsheet to CSV.

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use std::path::{Path, PathBuf};
use tabdump_core::{extract_spreadsheet_id, AuthConfig, ExportConfig, ValueRender};
use tabdump_export::{export_spreadsheet, ExportListener};
use tracing_subscriber::EnvFilter;

/// tabdump - export Google Sheets tabs as CSV files
#[derive(Parser, Debug)]
#[command(name = "tabdump")]
#[command(author, version, about = "Export every tab of a Google spreadsheet as CSV", long_about = None)]
struct Cli {
    /// Spreadsheet ID or full spreadsheet URL
    #[arg(value_name = "SPREADSHEET", env = "TABDUMP_SPREADSHEET_ID")]
    spreadsheet: Option<String>,

    /// Output directory [default: sheets_export]
    #[arg(short = 'o', long = "output-dir", value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Column range fetched from every tab, in A1 notation [default: A:Z]
    #[arg(short = 'r', long = "range", value_name = "A1")]
    range: Option<String>,

    /// Only export this tab (repeatable)
    #[arg(short = 't', long = "tab", value_name = "NAME")]
    tabs: Vec<String>,

    /// YAML configuration file
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Credential strategy
    #[arg(long = "auth", value_enum)]
    auth: Option<AuthStrategy>,

    /// OAuth client secrets for the interactive flow [default: credentials.json]
    #[arg(long = "client-secrets", value_name = "FILE")]
    client_secrets: Option<PathBuf>,

    /// Service-account key file
    #[arg(long = "service-account-key", value_name = "FILE")]
    service_account_key: Option<PathBuf>,

    /// OAuth client ID for the refresh-token strategy
    #[arg(long, env = "TABDUMP_CLIENT_ID", hide_env_values = true)]
    client_id: Option<String>,

    /// OAuth client secret for the refresh-token strategy
    #[arg(long, env = "TABDUMP_CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,

    /// Refresh token for the refresh-token strategy
    #[arg(long, env = "TABDUMP_REFRESH_TOKEN", hide_env_values = true)]
    refresh_token: Option<String>,

    /// Token cache file [default: token.json]
    #[arg(long = "token-cache", value_name = "FILE", conflicts_with = "no_cache")]
    token_cache: Option<PathBuf>,

    /// Do not read or write the token cache
    #[arg(long = "no-cache")]
    no_cache: bool,

    /// How cell values are rendered
    #[arg(long = "value-render", value_enum)]
    value_render: Option<ValueRenderArg>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Credential strategy selectable on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum AuthStrategy {
    /// Browser consent flow
    Interactive,
    /// Refresh token from flags or environment
    RefreshToken,
    /// Service-account key file
    ServiceAccount,
}

/// Value render mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum ValueRenderArg {
    /// As displayed in the spreadsheet
    Formatted,
    /// Raw numbers and booleans
    Unformatted,
    /// Formula text
    Formula,
}

impl From<ValueRenderArg> for ValueRender {
    fn from(arg: ValueRenderArg) -> Self {
        match arg {
            ValueRenderArg::Formatted => ValueRender::Formatted,
            ValueRenderArg::Unformatted => ValueRender::Unformatted,
            ValueRenderArg::Formula => ValueRender::Formula,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .init();
    }

    let config = build_config(&cli)?;

    if config.effective_spreadsheet_id().is_none() {
        print_guidance();
        return Ok(());
    }

    tracing::debug!(
        output_dir = %config.output_dir.display(),
        range = %config.range,
        "starting export"
    );

    let mut progress = ConsoleProgress;
    let report = export_spreadsheet(&config, &mut progress)
        .await
        .context("Export failed")?;

    println!(
        "\n{} All sheets exported to directory: {} ({} written, {} skipped)",
        "Done:".green().bold(),
        config.output_dir.display(),
        report.written.len(),
        report.skipped.len()
    );

    Ok(())
}

/// Merge the config file (if any) with command-line overrides.
fn build_config(cli: &Cli) -> Result<ExportConfig> {
    let mut config = match &cli.config {
        Some(path) => ExportConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => ExportConfig::default(),
    };

    if let Some(spreadsheet) = &cli.spreadsheet {
        config.spreadsheet_id = Some(extract_spreadsheet_id(spreadsheet));
    } else if let Some(id) = &config.spreadsheet_id {
        config.spreadsheet_id = Some(extract_spreadsheet_id(id));
    }
    if let Some(dir) = &cli.output_dir {
        config.output_dir.clone_from(dir);
    }
    if let Some(range) = &cli.range {
        config.range.clone_from(range);
    }
    if !cli.tabs.is_empty() {
        config.tabs.clone_from(&cli.tabs);
    }
    if let Some(render) = cli.value_render {
        config.value_render = render.into();
    }
    if cli.no_cache {
        config.token_cache = None;
    } else if let Some(path) = &cli.token_cache {
        config.token_cache = Some(path.clone());
    }
    if let Some(auth) = auth_from_flags(cli)? {
        config.auth = auth;
    }

    Ok(config)
}

/// The credential strategy requested on the command line, if any.
fn auth_from_flags(cli: &Cli) -> Result<Option<AuthConfig>> {
    let strategy = match cli.auth {
        Some(strategy) => strategy,
        None if cli.service_account_key.is_some() => AuthStrategy::ServiceAccount,
        None if cli.client_secrets.is_some() => AuthStrategy::Interactive,
        None if cli.client_id.is_some()
            && cli.client_secret.is_some()
            && cli.refresh_token.is_some() =>
        {
            AuthStrategy::RefreshToken
        }
        None => return Ok(None),
    };

    let auth = match strategy {
        AuthStrategy::Interactive => AuthConfig::Interactive {
            client_secrets: cli
                .client_secrets
                .clone()
                .unwrap_or_else(|| PathBuf::from("credentials.json")),
        },
        AuthStrategy::RefreshToken => {
            let (Some(client_id), Some(client_secret), Some(refresh_token)) =
                (&cli.client_id, &cli.client_secret, &cli.refresh_token)
            else {
                bail!(
                    "--auth refresh-token needs TABDUMP_CLIENT_ID, TABDUMP_CLIENT_SECRET and TABDUMP_REFRESH_TOKEN"
                );
            };
            AuthConfig::RefreshToken {
                client_id: client_id.clone(),
                client_secret: client_secret.clone(),
                refresh_token: refresh_token.clone(),
                token_uri: None,
            }
        }
        AuthStrategy::ServiceAccount => {
            let Some(key_path) = &cli.service_account_key else {
                bail!("--auth service-account needs --service-account-key <FILE>");
            };
            AuthConfig::ServiceAccount {
                key_path: key_path.clone(),
            }
        }
    };

    Ok(Some(auth))
}

/// Prints export progress to stdout.
struct ConsoleProgress;

impl ExportListener for ConsoleProgress {
    fn tabs_found(&mut self, names: &[String]) {
        println!(
            "{} Found {} sheets: {}",
            "Info:".cyan().bold(),
            names.len(),
            names.join(", ")
        );
    }

    fn tab_started(&mut self, name: &str) {
        println!("Exporting sheet: {}", name.bold());
    }

    fn tab_skipped(&mut self, name: &str) {
        println!("{} No data found in sheet: {name}", "Skip:".yellow().bold());
    }

    fn tab_saved(&mut self, _name: &str, path: &Path) {
        println!("{} {}", "Saved:".green(), path.display());
    }

    fn tabs_missing(&mut self, names: &[String]) {
        println!(
            "{} Requested sheets not found: {}",
            "Warning:".yellow().bold(),
            names.join(", ")
        );
    }
}

fn print_guidance() {
    println!("{}", "Please set the spreadsheet ID!".yellow().bold());
    println!("  1. Open your Google Sheet");
    println!("  2. Copy the ID from the URL (between /d/ and /edit)");
    println!(
        "  3. Run {} (or set {})",
        "tabdump <SPREADSHEET_ID>".cyan(),
        "TABDUMP_SPREADSHEET_ID".cyan()
    );
}
