//! Preview configuration.
//!
//! Every knob of the pipeline lives in [`PreviewConfig`]. It can be built in
//! code, read from a JSON file, or loaded from the user's config directory
//! (`~/.config/mdflowy/config.json`). Missing keys fall back to defaults, so a
//! config file only needs the settings it changes.
//!
//! # Example
//!
//! ```rust
//! use mdflowy_core::PreviewConfig;
//!
//! let config = PreviewConfig::builder()
//!     .button_label("Markdown")
//!     .render_math(true)
//!     .build();
//! assert!(config.render_math);
//! assert_eq!(config.highlight_theme, "InspiredGitHub");
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::extract::ExtractConfig;
use crate::highlight::DEFAULT_THEME;
use crate::host::HostContract;
use crate::markdown::MarkdownOptions;
use crate::ordered_lists::DEFAULT_ORDERED_LIST_TAG;
use crate::{PreviewError, Result};

/// Default label of the toggle control.
pub const DEFAULT_BUTTON_LABEL: &str = "Preview MD";

/// Configuration for the whole preview pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Class and attribute names read from the host page.
    pub host: HostContract,

    /// Text extraction options.
    pub extract: ExtractConfig,

    /// Markdown engine options.
    pub markdown: MarkdownOptions,

    /// Bundled syntect theme for code blocks (default: `InspiredGitHub`).
    pub highlight_theme: String,

    /// Label of the toggle control (default: `Preview MD`).
    pub button_label: String,

    /// Typeset `$...$` and `$$...$$` formulas in the preview (default: false).
    pub render_math: bool,

    /// Tag that numbers an item's children (default: `#ol`).
    pub ordered_list_tag: String,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            host: HostContract::default(),
            extract: ExtractConfig::default(),
            markdown: MarkdownOptions::default(),
            highlight_theme: DEFAULT_THEME.to_string(),
            button_label: DEFAULT_BUTTON_LABEL.to_string(),
            render_math: false,
            ordered_list_tag: DEFAULT_ORDERED_LIST_TAG.to_string(),
        }
    }
}

impl PreviewConfig {
    /// Creates a new builder for PreviewConfig.
    pub fn builder() -> PreviewConfigBuilder {
        PreviewConfigBuilder::new()
    }

    /// Reads a JSON config file.
    ///
    /// # Errors
    ///
    /// Returns [`PreviewError::FileNotFound`] if `path` does not exist and
    /// [`PreviewError::JsonError`] if it is not a valid config.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PreviewError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parses a JSON config document.
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Loads the user's config file if there is one, else the defaults.
    ///
    /// A config file that exists but fails to parse is an error rather than
    /// being silently ignored.
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => {
                debug!(path = %path.display(), "loading config");
                Self::from_file(path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Default config file location (~/.config/mdflowy/config.json)
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config").join("mdflowy").join("config.json"))
    }
}

/// Builder for PreviewConfig.
///
/// # Example
///
/// ```rust
/// use mdflowy_core::{MarkdownOptions, PreviewConfig};
///
/// let config = PreviewConfig::builder()
///     .markdown(MarkdownOptions { linkify: false, ..Default::default() })
///     .highlight_theme("base16-ocean.dark")
///     .build();
/// assert!(!config.markdown.linkify);
/// ```
pub struct PreviewConfigBuilder {
    config: PreviewConfig,
}

impl PreviewConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self { config: PreviewConfig::default() }
    }

    /// Sets the host DOM contract.
    pub fn host(mut self, value: HostContract) -> Self {
        self.config.host = value;
        self
    }

    /// Sets the extraction options.
    pub fn extract(mut self, value: ExtractConfig) -> Self {
        self.config.extract = value;
        self
    }

    /// Sets the Markdown engine options.
    pub fn markdown(mut self, value: MarkdownOptions) -> Self {
        self.config.markdown = value;
        self
    }

    /// Sets the highlight theme.
    pub fn highlight_theme(mut self, value: impl Into<String>) -> Self {
        self.config.highlight_theme = value.into();
        self
    }

    /// Sets the toggle label.
    pub fn button_label(mut self, value: impl Into<String>) -> Self {
        self.config.button_label = value.into();
        self
    }

    /// Sets whether formulas are typeset.
    pub fn render_math(mut self, value: bool) -> Self {
        self.config.render_math = value;
        self
    }

    /// Sets the ordered list tag.
    pub fn ordered_list_tag(mut self, value: impl Into<String>) -> Self {
        self.config.ordered_list_tag = value.into();
        self
    }

    /// Builds the config.
    pub fn build(self) -> PreviewConfig {
        self.config
    }
}

impl Default for PreviewConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = PreviewConfig::default();
        assert_eq!(config.button_label, "Preview MD");
        assert_eq!(config.ordered_list_tag, "#ol");
        assert!(config.markdown.breaks && config.markdown.html && config.markdown.linkify);
        assert!(config.extract.preserve_host_formatting);
        assert!(!config.render_math);
    }

    #[test]
    fn test_partial_json() {
        let config = PreviewConfig::from_json(r#"{"render_math": true, "host": {"active_class": "focused"}}"#).unwrap();
        assert!(config.render_math);
        assert_eq!(config.host.active_class, "focused");
        assert_eq!(config.host.content_class, "innerContentContainer");
        assert_eq!(config.button_label, DEFAULT_BUTTON_LABEL);
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"button_label": "MD", "markdown": {{"breaks": false}}}}"#).unwrap();

        let config = PreviewConfig::from_file(file.path()).unwrap();
        assert_eq!(config.button_label, "MD");
        assert!(!config.markdown.breaks);
        assert!(config.markdown.linkify);
    }

    #[test]
    fn test_missing_file() {
        let result = PreviewConfig::from_file("/nonexistent/mdflowy.json");
        assert!(matches!(result, Err(PreviewError::FileNotFound(_))));
    }

    #[test]
    fn test_invalid_json() {
        let result = PreviewConfig::from_json("{ not json");
        assert!(matches!(result, Err(PreviewError::JsonError(_))));
    }

    #[test]
    fn test_builder() {
        let config = PreviewConfig::builder().button_label("Go").ordered_list_tag("#num").build();
        assert_eq!(config.button_label, "Go");
        assert_eq!(config.ordered_list_tag, "#num");
    }
}
