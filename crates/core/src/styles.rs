//! Stylesheets added to the host page alongside the preview.

use crate::config::PreviewConfig;
use crate::highlight::theme_css;
use crate::ordered_lists::ORDERED_LIST_CLASS;
use crate::Result;

/// Class of the toggle control.
pub const BUTTON_CLASS: &str = "bmd-preview-button";
/// Class of the preview container.
pub const BOX_CLASS: &str = "bmd-preview-box";
/// Class the page container carries while the panel is open.
pub const OPEN_CLASS: &str = "bmd-has-preview";

const PANEL_CSS: &str = r#"
.bmd-preview-button {
    background: white;
    border: solid 1px;
    padding: 6px;
    position: absolute;
    right: 24px;
    top: 50px;
}
.bmd-preview-button:hover {
    background: lightgray;
    text-decoration: none;
}
.bmd-preview-box {
    display: none;
}
.bmd-has-preview .bmd-preview-box {
    display: block;
}
.bmd-has-preview {
    display: flex;
}
.bmd-has-preview .page.active {
    flex-basis: 50%;
    flex-grow: 1;
    padding-left: 24px;
    padding-right: 24px;
    word-break: break-word;
}
.bmd-preview-box {
    border: solid 1px lightgray;
    flex-basis: 50%;
    flex-grow: 1;
    margin-top: 72px;
    padding: 24px;
}
"#;

// the host's table and font rules leak into the preview otherwise
const HOST_OVERRIDES_CSS: &str = r#"
.bmd-preview-box th, .bmd-preview-box tr, .bmd-preview-box td {
    vertical-align: middle;
}
.bmd-preview-box {
    font-size: 15px;
}
"#;

// raw formulas show only while their item has focus
const MATH_CSS: &str = r#"
.name .has-latex .innerContentContainer {
    display: none;
}
.name .has-latex.content {
    height: 0;
    min-height: 0;
}
.name--focused .has-latex .innerContentContainer {
    display: inline;
}
.name--focused .has-latex.content {
    height: auto;
}
.name--focused .has-latex {
    background: #eee;
}
.bmd-preview-box .math-display {
    display: block;
    overflow: hidden;
}
"#;

/// A named block of CSS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stylesheet {
    pub name: String,
    pub css: String,
}

impl Stylesheet {
    pub fn new(name: &str, css: impl Into<String>) -> Self {
        Self { name: name.to_string(), css: css.into() }
    }
}

/// Every stylesheet the preview needs under `config`.
///
/// # Errors
///
/// Fails if the configured highlight theme does not exist.
pub fn load_stylesheets(config: &PreviewConfig) -> Result<Vec<Stylesheet>> {
    let mut sheets = vec![
        Stylesheet::new("panel", PANEL_CSS),
        Stylesheet::new("host-overrides", HOST_OVERRIDES_CSS),
    ];

    let highlight = theme_css(&config.highlight_theme)?;
    if !highlight.is_empty() {
        sheets.push(Stylesheet::new("highlight", highlight));
    }

    if config.render_math {
        sheets.push(Stylesheet::new("math", MATH_CSS));
    }

    sheets.push(Stylesheet::new("ordered-lists", ordered_list_css(ORDERED_LIST_CLASS)));
    Ok(sheets)
}

/// Numbering for the children of a project carrying `class`. The bullets are
/// dimmed and a counter is drawn in front of each child's name.
fn ordered_list_css(class: &str) -> String {
    format!(
        r#"
.{class} > .children > .project > .name > .bullet {{
    opacity: 0.5 !important;
}}
.{class} > .children > .project > .name > .bullet > svg {{
    fill: transparent;
}}
.{class} > .children {{
    counter-reset: counter;
}}
.{class} > .children > .project > .name:before {{
    counter-increment: counter;
    content: counter(counter) '. ';
    float: left;
    margin-left: -18px;
    margin-top: 8px;
}}
"#
    )
}
