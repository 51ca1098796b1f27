//! Code block highlighting.
//!
//! The Markdown engine hands every fenced code block with a language tag to a
//! [`Highlighter`]. Highlighting is best-effort: an unknown language, or any
//! failure inside the highlighter, yields an empty string and the engine falls
//! back to plain escaped code. One bad block never blanks the preview.

#[cfg(feature = "highlight")]
use syntect::html::{ClassStyle, ClassedHTMLGenerator, css_for_theme_with_class_style};
#[cfg(feature = "highlight")]
use syntect::highlighting::ThemeSet;
#[cfg(feature = "highlight")]
use syntect::parsing::SyntaxSet;
#[cfg(feature = "highlight")]
use syntect::util::LinesWithEndings;
#[cfg(feature = "highlight")]
use tracing::debug;

use crate::Result;
#[cfg(feature = "highlight")]
use crate::PreviewError;

/// Default theme for the highlight stylesheet.
pub const DEFAULT_THEME: &str = "InspiredGitHub";

/// Highlighter used when none is chosen explicitly.
#[cfg(feature = "highlight")]
pub type DefaultHighlighter = SyntectHighlighter;
#[cfg(not(feature = "highlight"))]
pub type DefaultHighlighter = NoHighlight;

/// Highlight callback used for fenced code blocks.
pub trait Highlighter {
    /// Highlighted HTML for `code` (without the surrounding `<pre><code>`), or
    /// an empty string when `lang` is unknown or highlighting failed.
    fn highlight(&self, code: &str, lang: &str) -> String;
}

/// Never highlights; every code block renders as plain escaped text.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHighlight;

impl Highlighter for NoHighlight {
    fn highlight(&self, _code: &str, _lang: &str) -> String {
        String::new()
    }
}

/// Class-based highlighting with syntect's bundled syntaxes.
///
/// The output uses plain class names (`source`, `keyword`, ...) matching the
/// stylesheet from [`theme_css`].
#[cfg(feature = "highlight")]
pub struct SyntectHighlighter {
    syntax_set: SyntaxSet,
}

#[cfg(feature = "highlight")]
impl SyntectHighlighter {
    pub fn new() -> Self {
        Self { syntax_set: SyntaxSet::load_defaults_newlines() }
    }

    fn try_highlight(&self, code: &str, lang: &str) -> Result<String> {
        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .ok_or_else(|| PreviewError::UnknownLanguage(lang.to_string()))?;

        let mut generator = ClassedHTMLGenerator::new_with_class_style(syntax, &self.syntax_set, ClassStyle::Spaced);
        for line in LinesWithEndings::from(code) {
            generator.parse_html_for_line_which_includes_newline(line)?;
        }
        Ok(generator.finalize())
    }
}

#[cfg(feature = "highlight")]
impl Default for SyntectHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "highlight")]
impl Highlighter for SyntectHighlighter {
    fn highlight(&self, code: &str, lang: &str) -> String {
        match self.try_highlight(code, lang) {
            Ok(html) => html,
            Err(err) => {
                debug!(lang, error = %err, "falling back to plain code block");
                String::new()
            }
        }
    }
}

/// Stylesheet for the classes emitted by [`SyntectHighlighter`].
///
/// # Errors
///
/// Returns [`PreviewError::ConfigError`] if no bundled theme is called `theme`.
#[cfg(feature = "highlight")]
pub fn theme_css(theme: &str) -> Result<String> {
    let themes = ThemeSet::load_defaults();
    let selected = themes.themes.get(theme).ok_or_else(|| {
        let mut known: Vec<&str> = themes.themes.keys().map(String::as_str).collect();
        known.sort_unstable();
        PreviewError::ConfigError(format!("Unknown highlight theme '{}'. Known themes: {}", theme, known.join(", ")))
    })?;

    Ok(css_for_theme_with_class_style(selected, ClassStyle::Spaced)?)
}

/// Without the `highlight` feature there is nothing to style.
#[cfg(not(feature = "highlight"))]
pub fn theme_css(_theme: &str) -> Result<String> {
    Ok(String::new())
}
