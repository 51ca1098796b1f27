//! The panel controller: page lifecycle, toggle, and change handling.
//!
//! [`PanelController`] is the single owner of the preview's state. It sits
//! idle until the host signals that its page finished loading, then adds the
//! toggle, the empty preview container and the stylesheets exactly once.
//! From then on every qualifying batch of changes re-renders the preview,
//! which only does work while the panel is open.
//!
//! # Example
//!
//! ```rust
//! use mdflowy_core::panel::{PanelController, PanelState, StaticPage};
//! use mdflowy_core::trigger::{MutationObserver, MutationRecord};
//! use mdflowy_core::PreviewConfig;
//!
//! let page = StaticPage::new(
//!     r#"<div class="pageContainer"><div class="page active">
//!        <div class="content"><span class="innerContentContainer"># Hello</span></div>
//!     </div></div>"#,
//! );
//! let mut panel = PanelController::new(page, PreviewConfig::default()).unwrap();
//!
//! panel.on_change(&[MutationRecord::element_added("div", &["pageContainer"])]);
//! panel.toggle();
//!
//! assert_eq!(panel.state(), PanelState::Open);
//! assert!(panel.renderer().html().contains("<h1>Hello</h1>"));
//! ```

use tracing::{debug, info, warn};

use crate::collect::DocumentCollector;
use crate::config::PreviewConfig;
use crate::markdown::{CmarkEngine, DefaultEngine, MarkdownEngine};
use crate::math::MarkupMathEngine;
use crate::parse::Document;
use crate::preview::{PreviewRenderer, PreviewSurface, RenderOutcome};
use crate::styles::{Stylesheet, load_stylesheets};
use crate::trigger::{MutationObserver, MutationRecord, RenderTrigger};
use crate::Result;

/// Whether the preview panel is shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PanelState {
    Open,
    #[default]
    Closed,
}

impl PanelState {
    pub fn toggled(self) -> Self {
        match self {
            PanelState::Open => PanelState::Closed,
            PanelState::Closed => PanelState::Open,
        }
    }

    pub fn is_open(self) -> bool {
        self == PanelState::Open
    }
}

/// Read access to the live host page.
pub trait HostPage {
    /// A parsed snapshot of the page as it is right now.
    fn snapshot(&self) -> Result<Document>;
}

/// A host page held as an HTML string that can be swapped for a newer one.
#[derive(Debug, Clone, Default)]
pub struct StaticPage {
    html: String,
}

impl StaticPage {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }

    /// Replace the page contents, as the host does when the user edits.
    pub fn replace(&mut self, html: impl Into<String>) {
        self.html = html.into();
    }

    pub fn html(&self) -> &str {
        &self.html
    }
}

impl HostPage for StaticPage {
    fn snapshot(&self) -> Result<Document> {
        Document::parse(&self.html)
    }
}

/// What page injection needs to know about the panel.
#[derive(Debug, Clone, Copy)]
pub struct PanelView<'a> {
    /// The toggle and container, once created
    pub surface: Option<&'a PreviewSurface>,
    pub state: PanelState,
    /// Tag marking projects whose children are numbered
    pub ordered_list_tag: &'a str,
    /// Typeset formulas below the items that hold them
    pub render_math: bool,
}

/// Owns the panel state, the trigger and the renderer for one host page.
pub struct PanelController<P, E> {
    page: P,
    config: PreviewConfig,
    trigger: RenderTrigger,
    renderer: PreviewRenderer<E>,
    state: PanelState,
    loaded: bool,
    stylesheets: Vec<Stylesheet>,
}

impl<P: HostPage> PanelController<P, DefaultEngine> {
    /// Controller using the pulldown-cmark engine and the default highlighter.
    ///
    /// # Errors
    ///
    /// Fails if the stylesheets for `config` cannot be built, e.g. for an
    /// unknown highlight theme.
    pub fn new(page: P, config: PreviewConfig) -> Result<Self> {
        let engine = CmarkEngine::new(config.markdown.clone(), Default::default());
        Self::with_engine(page, config, engine)
    }
}

impl<P: HostPage, E: MarkdownEngine> PanelController<P, E> {
    /// Controller rendering through a custom Markdown engine.
    pub fn with_engine(page: P, config: PreviewConfig, engine: E) -> Result<Self> {
        let stylesheets = load_stylesheets(&config)?;
        let trigger = RenderTrigger::new(config.host.clone());
        let collector = DocumentCollector::new(config.host.clone(), config.extract.clone());

        let mut renderer = PreviewRenderer::new(collector, engine, config.button_label.clone());
        if config.render_math {
            renderer = renderer.with_math(Box::new(MarkupMathEngine));
        }

        Ok(Self { page, config, trigger, renderer, state: PanelState::Closed, loaded: false, stylesheets })
    }

    /// Flip the panel. Opening renders immediately from the current page.
    pub fn toggle(&mut self) -> PanelState {
        self.state = self.state.toggled();
        debug!(state = ?self.state, "panel toggled");
        if self.state.is_open() {
            self.render();
        }
        self.state
    }

    fn render(&mut self) -> RenderOutcome {
        if !self.state.is_open() || self.renderer.surface().is_none() {
            return RenderOutcome::Skipped;
        }

        match self.page.snapshot() {
            Ok(doc) => self.renderer.recompute_and_render(self.state, &doc),
            Err(err) => {
                warn!(error = %err, "page snapshot failed, skipping render");
                RenderOutcome::Skipped
            }
        }
    }

    fn install(&mut self) {
        if self.loaded {
            return;
        }
        self.loaded = true;
        self.renderer.show_button();
        info!(stylesheets = self.stylesheets.len(), "page loaded, preview installed");
    }

    pub fn state(&self) -> PanelState {
        self.state
    }

    /// Whether the host page finished loading.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Stylesheets added to the page; empty until the page has loaded.
    pub fn styles(&self) -> &[Stylesheet] {
        if self.loaded { &self.stylesheets } else { &[] }
    }

    pub fn renderer(&self) -> &PreviewRenderer<E> {
        &self.renderer
    }

    pub fn config(&self) -> &PreviewConfig {
        &self.config
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut P {
        &mut self.page
    }

    pub fn view(&self) -> PanelView<'_> {
        PanelView {
            surface: self.renderer.surface(),
            state: self.state,
            ordered_list_tag: &self.config.ordered_list_tag,
            render_math: self.config.render_math,
        }
    }
}

impl<P: HostPage, E: MarkdownEngine> MutationObserver for PanelController<P, E> {
    fn on_change(&mut self, batch: &[MutationRecord]) {
        if self.trigger.page_loaded(batch) {
            self.install();
        }

        if self.trigger.evaluate(batch).is_some() {
            self.render();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::NoHighlight;
    use crate::PreviewError;
    use crate::markdown::MarkdownOptions;

    const PAGE: &str = r#"<div class="pageContainer"><div class="page active">
        <div class="content"><span class="innerContentContainer"># Title</span></div>
    </div></div>"#;

    fn loaded() -> [MutationRecord; 1] {
        [MutationRecord::element_added("div", &["pageContainer"])]
    }

    fn edited() -> [MutationRecord; 1] {
        [MutationRecord::element_added("span", &["innerContentContainer"])]
    }

    fn controller(html: &str) -> PanelController<StaticPage, CmarkEngine<NoHighlight>> {
        let config = PreviewConfig::default();
        let engine = CmarkEngine::new(MarkdownOptions::default(), NoHighlight);
        PanelController::with_engine(StaticPage::new(html), config, engine).unwrap()
    }

    struct Unreachable;

    impl HostPage for Unreachable {
        fn snapshot(&self) -> Result<Document> {
            Err(PreviewError::HtmlParseError("gone".to_string()))
        }
    }

    #[test]
    fn test_state_toggles() {
        assert_eq!(PanelState::default(), PanelState::Closed);
        assert_eq!(PanelState::Closed.toggled(), PanelState::Open);
        assert!(!PanelState::Open.toggled().is_open());
    }

    #[test]
    fn test_waits_for_page_load() {
        let mut panel = controller(PAGE);
        assert!(panel.styles().is_empty());

        panel.on_change(&edited());
        assert!(!panel.is_loaded());
        assert!(panel.renderer().surface().is_none());

        panel.on_change(&loaded());
        assert!(panel.is_loaded());
        assert!(panel.renderer().surface().is_some());
        let count = panel.styles().len();
        assert!(count > 0);

        panel.on_change(&loaded());
        assert_eq!(panel.styles().len(), count);
    }

    #[test]
    fn test_toggle_lifecycle() {
        let mut panel = controller(PAGE);
        panel.on_change(&loaded());

        assert_eq!(panel.toggle(), PanelState::Open);
        assert_eq!(panel.renderer().render_count(), 1);
        assert!(panel.renderer().html().contains("<h1>Title</h1>"));

        assert_eq!(panel.toggle(), PanelState::Closed);
        panel.page_mut().replace(PAGE.replace("# Title", "# Changed"));
        panel.on_change(&edited());
        assert_eq!(panel.renderer().render_count(), 1);

        panel.toggle();
        assert_eq!(panel.renderer().render_count(), 2);
        assert!(panel.renderer().html().contains("<h1>Changed</h1>"));
    }

    #[test]
    fn test_edit_while_open_rerenders() {
        let mut panel = controller(PAGE);
        panel.on_change(&loaded());
        panel.toggle();

        panel.page_mut().replace(PAGE.replace("# Title", "## Sub"));
        panel.on_change(&edited());
        assert_eq!(panel.renderer().render_count(), 2);
        assert!(panel.renderer().html().contains("<h2>Sub</h2>"));

        panel.on_change(&[MutationRecord::element_added("div", &["bullet"])]);
        assert_eq!(panel.renderer().render_count(), 2);
    }

    #[test]
    fn test_toggle_before_load() {
        let mut panel = controller(PAGE);
        assert_eq!(panel.toggle(), PanelState::Open);
        assert_eq!(panel.renderer().render_count(), 0);

        panel.on_change(&loaded());
        panel.on_change(&edited());
        assert_eq!(panel.renderer().render_count(), 1);
    }

    #[test]
    fn test_snapshot_failure_is_skipped() {
        let engine = CmarkEngine::new(MarkdownOptions::default(), NoHighlight);
        let mut panel = PanelController::with_engine(Unreachable, PreviewConfig::default(), engine).unwrap();
        panel.on_change(&loaded());
        panel.toggle();
        assert_eq!(panel.renderer().render_count(), 0);
        assert_eq!(panel.renderer().html(), "");
    }
}
