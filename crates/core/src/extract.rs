//! Per-node text extraction.
//!
//! Turns one content node into the Markdown source it stands for. The host
//! decorates typed text with its own inline markup (anchors for URLs it
//! recognized, tag chips for `#words`); a small set of those constructs is
//! rewritten so the Markdown engine sees what the user actually typed.

use crate::host::{HostContract, NodeRole};
use crate::parse::{ChildNode, Document, Element};

/// Configuration for content node extraction
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Keep host inline markup as raw HTML instead of flattening to text
    pub preserve_host_formatting: bool,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self { preserve_host_formatting: true }
    }
}

/// Extract the Markdown source of one content node.
///
/// Inactive notes contribute only their first line, matching what the host
/// shows on screen. The source tree is only read, never modified.
pub fn extract_node_text(node: &Element<'_>, contract: &HostContract, config: &ExtractConfig) -> String {
    let raw = node.inner_html();
    let markup = if NodeRole::classify(node, contract).is_collapsed() {
        raw.split('\n').next().unwrap_or_default()
    } else {
        raw.as_str()
    };

    extract_markup(markup, contract, config)
}

/// Extract the Markdown source from a content node's raw markup.
pub fn extract_markup(markup: &str, contract: &HostContract, config: &ExtractConfig) -> String {
    let fragment = Document::parse_fragment(markup);
    let root = fragment.root_element();

    if !config.preserve_host_formatting {
        return root.text();
    }

    let mut output = String::new();
    for child in root.child_nodes() {
        match child {
            ChildNode::Text(text) => output.push_str(&text),
            ChildNode::Element(element) => push_element(&mut output, &element, contract),
            ChildNode::Other => {}
        }
    }

    unescape_angle_brackets(&output)
}

fn push_element(output: &mut String, element: &Element<'_>, contract: &HostContract) {
    if is_autolink(element) {
        output.push_str(&element.text());
        return;
    }

    if let Some(value) = contract.tag_value(element)
        && is_heading_marker(value)
        && at_line_start(output)
    {
        output.push_str(value);
        return;
    }

    let markup = element.outer_html();
    if markup.is_empty() {
        output.push_str(&element.text());
    } else {
        output.push_str(&markup);
    }
}

/// An anchor the host created from a bare URL: its target, minus one trailing
/// slash, is exactly its visible text.
fn is_autolink(element: &Element<'_>) -> bool {
    if element.tag_name() != "a" {
        return false;
    }
    let Some(href) = element.attr("href") else {
        return false;
    };
    let href = href.strip_suffix('/').unwrap_or(href);
    href == element.text()
}

fn is_heading_marker(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c == '#')
}

fn at_line_start(output: &str) -> bool {
    output.is_empty() || output.ends_with('\n')
}

/// The host's editor escapes angle brackets; raw HTML passthrough needs them
/// literal.
fn unescape_angle_brackets(text: &str) -> String {
    text.replace("&lt;", "<").replace("&gt;", ">")
}
