//! # tabdump-core
//!
//! Core types shared by the tabdump crates.
//!
//! This crate provides:
//! - The workspace error type and result alias
//! - The export configuration model and its YAML loader
//! - Spreadsheet ID helpers

/// Export configuration.
pub mod config;
/// Error types and result aliases.
pub mod error;

/// Re-export configuration types.
pub use config::{
    extract_spreadsheet_id, AuthConfig, ExportConfig, ValueRender, DEFAULT_API_BASE_URL,
    PLACEHOLDER_SPREADSHEET_ID,
};
/// Re-export core error types.
pub use error::{ExportError, Result};
