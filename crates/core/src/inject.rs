//! Page injection.
//!
//! Writes the preview chrome into a page snapshot so the result can be opened
//! in a browser: stylesheets go into `<head>`, the preview container and the
//! toggle follow the active page, the page container is marked open when the
//! panel is, and projects tagged as ordered lists get their numbering class.
//! With math rendering on, every item holding a formula gets its typeset
//! formulas in a block right after the item's container.

use std::cell::Cell;
use std::collections::{HashMap, HashSet};

use lol_html::html_content::ContentType;

use crate::host::HostContract;
use crate::markdown::escape_html;
use crate::math::{AsciiMathToTex, MATH_CLASS, MarkupMathEngine, math_nodes, render_node_math};
use crate::ordered_lists::{ORDERED_LIST_CLASS, ordered_list_projects};
use crate::panel::PanelView;
use crate::parse::{Document, class_selector};
use crate::styles::{BOX_CLASS, BUTTON_CLASS, OPEN_CLASS, Stylesheet};
use crate::{PreviewError, Result};

/// Rewrite `page_html` with the preview panel and `styles` in place.
///
/// # Errors
///
/// Returns [`PreviewError::HtmlParseError`] if a selector built from
/// `contract` is invalid or the page cannot be rewritten.
pub fn inject_preview(
    page_html: &str, panel: &PanelView<'_>, styles: &[Stylesheet], contract: &HostContract,
) -> Result<String> {
    let page_container = class_selector(&contract.page_container_class);
    let project = class_selector(&contract.project_class);
    let container = class_selector(&contract.container_class);
    for selector in [contract.active_page_selector.as_str(), &page_container, &project, &container] {
        check_selector(selector)?;
    }

    let doc = Document::parse(page_html)?;
    let ordered: HashSet<usize> = ordered_list_projects(&doc, contract, panel.ordered_list_tag)
        .into_iter()
        .map(|list| list.project_index)
        .collect();
    let formulas = if panel.render_math { formula_blocks(&doc, contract)? } else { HashMap::new() };

    let style_html = style_blocks(styles);
    let panel_html = panel.surface.map(|surface| {
        format!(
            r#"<div class="{}">{}</div><a class="{}">{}</a>"#,
            BOX_CLASS,
            surface.html,
            BUTTON_CLASS,
            escape_html(&surface.button_label)
        )
    });

    let styled = Cell::new(false);
    let mut project_index = 0usize;

    let mut output = String::new();
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings {
            element_content_handlers: vec![
                Some(lol_html::element!("head", |el| {
                    if !styled.get() {
                        el.append(&style_html, ContentType::Html);
                        styled.set(true);
                    }
                    Ok(())
                })),
                panel_html.as_deref().map(|markup| {
                    let mut placed = false;
                    lol_html::element!(contract.active_page_selector, move |el| {
                        if !placed {
                            el.after(markup, ContentType::Html);
                            placed = true;
                        }
                        Ok(())
                    })
                }),
                if panel.state.is_open() {
                    Some(lol_html::element!(page_container, |el| {
                        let class = el.get_attribute("class").unwrap_or_default();
                        el.set_attribute("class", format!("{} {}", class, OPEN_CLASS).trim())?;
                        Ok(())
                    }))
                } else {
                    None
                },
                Some(lol_html::element!(project, |el| {
                    if ordered.contains(&project_index) {
                        let class = el.get_attribute("class").unwrap_or_default();
                        el.set_attribute("class", &format!("{} {}", class, ORDERED_LIST_CLASS))?;
                    }
                    project_index += 1;
                    Ok(())
                })),
                (!formulas.is_empty()).then(|| {
                    let mut container_index = 0usize;
                    lol_html::element!(container, move |el| {
                        if let Some(block) = formulas.get(&container_index) {
                            let class = el.get_attribute("class").unwrap_or_default();
                            el.set_attribute("class", &format!("{} {}", class, MATH_CLASS))?;
                            el.after(block, ContentType::Html);
                        }
                        container_index += 1;
                        Ok(())
                    })
                }),
            ]
            .into_iter()
            .flatten()
            .collect(),
            ..Default::default()
        },
        |c: &[u8]| {
            output.push_str(&String::from_utf8_lossy(c));
        },
    );

    rewriter
        .write(page_html.as_bytes())
        .map_err(|e| PreviewError::HtmlParseError(format!("Failed to rewrite page: {}", e)))?;
    rewriter
        .end()
        .map_err(|e| PreviewError::HtmlParseError(format!("Failed to rewrite page: {}", e)))?;

    if !styled.get() {
        output.insert_str(0, &style_html);
    }
    Ok(output)
}

fn check_selector(selector: &str) -> Result<()> {
    selector
        .parse::<lol_html::Selector>()
        .map(|_| ())
        .map_err(|e| PreviewError::HtmlParseError(format!("Invalid selector {:?}: {}", selector, e)))
}

/// Typeset formula blocks keyed by the position of the structural container
/// they follow, among all containers of the page.
fn formula_blocks(doc: &Document, contract: &HostContract) -> Result<HashMap<usize, String>> {
    let containers = doc.elements_with_class(&contract.container_class)?;
    let nodes = doc.elements_with_class(&contract.content_class)?;
    let mut blocks = HashMap::new();

    for formula in math_nodes(doc, contract) {
        let Some(parent) = nodes.get(formula.index).and_then(|node| node.parent()) else {
            continue;
        };
        if let Some(position) = containers.iter().position(|c| c.same_node(&parent)) {
            blocks.insert(position, render_node_math(&formula, &MarkupMathEngine, Some(&AsciiMathToTex)));
        }
    }
    Ok(blocks)
}

fn style_blocks(styles: &[Stylesheet]) -> String {
    styles
        .iter()
        .map(|sheet| format!("<style data-sheet=\"{}\">{}</style>", escape_html(&sheet.name), sheet.css))
        .collect()
}
