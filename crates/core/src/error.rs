//! Error types for the preview pipeline.
//!
//! Most of the pipeline never fails outright: missing structural context in
//! the host page is a silent no-op and an unknown highlight language falls
//! back to plain code. [`PreviewError`] covers the remaining cases, which are
//! parsing snapshots, rendering, and loading configuration.
//!
//! # Example
//!
//! ```rust
//! use mdflowy_core::{PreviewError, Result};
//!
//! fn require_snapshot(html: &str) -> Result<&str> {
//!     if html.trim().is_empty() {
//!         return Err(PreviewError::HtmlParseError("empty snapshot".to_string()));
//!     }
//!     Ok(html)
//! }
//! # assert!(require_snapshot("").is_err());
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for preview operations.
#[derive(Error, Debug)]
pub enum PreviewError {
    /// HTML parsing errors.
    ///
    /// Returned when a snapshot cannot be parsed or a CSS selector is invalid.
    #[error("Failed to parse HTML: {0}")]
    HtmlParseError(String),

    /// The Markdown engine could not produce HTML.
    #[error("Render failed: {0}")]
    RenderError(String),

    /// No syntax definition exists for a code block language.
    #[error("Unknown highlight language: {0}")]
    UnknownLanguage(String),

    /// Invalid or unreadable configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// File read/write errors.
    #[error("I/O error: {0}")]
    WriteError(#[from] std::io::Error),

    /// JSON configuration errors.
    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Errors raised by syntect while highlighting or generating theme CSS.
    #[cfg(feature = "highlight")]
    #[error("Highlighting failed: {0}")]
    Highlight(#[from] syntect::Error),
}

/// Result type alias for PreviewError.
pub type Result<T> = std::result::Result<T, PreviewError>;
