//! The preview surface and its renderer.
//!
//! [`PreviewRenderer`] owns the toggle control and the single preview
//! container. Each render collects the whole page into a Document String,
//! runs it through the Markdown engine, and replaces the container contents
//! wholesale. The engines run behind a guard: an error or a panic is logged,
//! the container keeps its last good HTML, and the next render tries again.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, warn};

use crate::collect::DocumentCollector;
use crate::markdown::MarkdownEngine;
use crate::math::{Delimiter, MathEngine, default_delimiters};
use crate::panel::PanelState;
use crate::parse::Document;

/// The chrome added to the host page: a toggle and one preview container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewSurface {
    /// Text of the toggle control
    pub button_label: String,
    /// Current contents of the preview container
    pub html: String,
}

/// What a call to [`PreviewRenderer::recompute_and_render`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// Panel closed or no container yet; nothing was read.
    Skipped,
    /// The container holds fresh output.
    Rendered,
    /// The engine failed; the container kept its previous contents.
    Failed,
}

pub struct PreviewRenderer<E> {
    collector: DocumentCollector,
    engine: E,
    math: Option<Box<dyn MathEngine>>,
    delimiters: Vec<Delimiter>,
    button_label: String,
    surface: Option<PreviewSurface>,
    render_count: usize,
    last_error: Option<String>,
}

impl<E: MarkdownEngine> PreviewRenderer<E> {
    pub fn new(collector: DocumentCollector, engine: E, button_label: impl Into<String>) -> Self {
        Self {
            collector,
            engine,
            math: None,
            delimiters: default_delimiters(),
            button_label: button_label.into(),
            surface: None,
            render_count: 0,
            last_error: None,
        }
    }

    /// Typeset formulas in the rendered HTML with `engine`.
    pub fn with_math(mut self, engine: Box<dyn MathEngine>) -> Self {
        self.math = Some(engine);
        self
    }

    /// Create the toggle and an empty preview container.
    ///
    /// Returns `false` if they already exist; nothing is duplicated.
    pub fn show_button(&mut self) -> bool {
        if self.surface.is_some() {
            return false;
        }
        debug!(label = %self.button_label, "creating preview surface");
        self.surface = Some(PreviewSurface { button_label: self.button_label.clone(), html: String::new() });
        true
    }

    /// Recompute the preview from `doc` if the panel is open.
    pub fn recompute_and_render(&mut self, state: PanelState, doc: &Document) -> RenderOutcome {
        if state == PanelState::Closed || self.surface.is_none() {
            return RenderOutcome::Skipped;
        }

        let (source, stats) = self.collector.collect_with_stats(doc);
        let engine = &self.engine;
        let math = self.math.as_deref();
        let delimiters = &self.delimiters;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            engine.render(&source).map(|html| match math {
                Some(math) => math.render(&html, delimiters),
                None => html,
            })
        }));

        let html = match outcome {
            Ok(Ok(html)) => html,
            Ok(Err(err)) => return self.fail(err.to_string()),
            Err(payload) => return self.fail(format!("engine panicked: {}", panic_message(payload.as_ref()))),
        };

        if let Some(surface) = self.surface.as_mut() {
            surface.html = html;
        }
        self.render_count += 1;
        self.last_error = None;
        debug!(nodes = stats.visible, render = self.render_count, "preview rendered");

        RenderOutcome::Rendered
    }

    fn fail(&mut self, message: String) -> RenderOutcome {
        warn!(error = %message, "preview render failed, keeping previous output");
        self.last_error = Some(message);
        RenderOutcome::Failed
    }

    pub fn surface(&self) -> Option<&PreviewSurface> {
        self.surface.as_ref()
    }

    /// Current container contents; empty before the first render.
    pub fn html(&self) -> &str {
        self.surface.as_ref().map(|s| s.html.as_str()).unwrap_or_default()
    }

    /// Number of successful renders so far.
    pub fn render_count(&self) -> usize {
        self.render_count
    }

    /// Message of the most recent failure, cleared by the next success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn collector(&self) -> &DocumentCollector {
        &self.collector
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
