//! Live Markdown preview for outliner pages.
//!
//! The pipeline reads a snapshot of the host page, extracts the Markdown each
//! visible content node stands for ([`extract`], [`collect`]), renders the
//! resulting Document String ([`markdown`], [`highlight`], [`math`]) and keeps
//! a side panel in sync with the page as it changes ([`trigger`], [`panel`]).
//!
//! # Example
//!
//! ```rust
//! use mdflowy_core::{Document, DocumentCollector};
//!
//! let doc = Document::parse(
//!     r#"<div class="content"><span class="innerContentContainer"># Notes</span></div>
//!        <div class="content"><span class="innerContentContainer">- first</span></div>"#,
//! )
//! .unwrap();
//!
//! assert_eq!(DocumentCollector::default().collect(&doc), "# Notes\n- first\n");
//! ```

pub mod collect;
pub mod config;
pub mod error;
pub mod extract;
pub mod highlight;
pub mod host;
pub mod inject;
pub mod markdown;
pub mod math;
pub mod ordered_lists;
pub mod panel;
pub mod parse;
pub mod preview;
pub mod styles;
pub mod trigger;

pub use collect::{CollectStats, DocumentCollector};
pub use config::{PreviewConfig, PreviewConfigBuilder};
pub use error::{PreviewError, Result};
pub use extract::{ExtractConfig, extract_markup, extract_node_text};
#[cfg(feature = "highlight")]
pub use highlight::SyntectHighlighter;
pub use highlight::{DefaultHighlighter, Highlighter, NoHighlight, theme_css};
pub use host::{HostContract, NodeRole, OutlinePosition};
pub use inject::inject_preview;
pub use markdown::{CmarkEngine, DefaultEngine, MarkdownEngine, MarkdownOptions};
pub use math::{AsciiMathConverter, AsciiMathToTex, Delimiter, MarkupMathEngine, MathEngine, MathSegment, split_math};
pub use ordered_lists::{OrderedList, ordered_list_projects};
pub use panel::{HostPage, PanelController, PanelState, PanelView, StaticPage};
pub use parse::{Document, Element};
pub use preview::{PreviewRenderer, PreviewSurface, RenderOutcome};
pub use styles::{Stylesheet, load_stylesheets};
pub use trigger::{MutationObserver, MutationRecord, RenderTrigger, TriggerReason, diff_snapshots};
