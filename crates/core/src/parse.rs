//! HTML snapshot parsing and read-only DOM access.
//!
//! This module provides the [`Document`] and [`Element`] types used by every
//! stage of the pipeline to read the host page. Nothing here mutates the
//! parsed tree; child lists are handed out as owned snapshots
//! ([`ChildNode`]) so callers can scan them left to right freely.
//!
//! # Example
//!
//! ```rust
//! use mdflowy_core::parse::Document;
//!
//! let html = r#"
//!     <div class="content">
//!         <span class="innerContentContainer">Hello</span>
//!     </div>
//! "#;
//!
//! let doc = Document::parse(html).unwrap();
//! let nodes = doc.select(".innerContentContainer").unwrap();
//! assert_eq!(nodes[0].text(), "Hello");
//! ```

use scraper::{ElementRef, Html, Node, Selector};

use crate::{PreviewError, Result};

/// Represents a parsed HTML document or fragment.
///
/// # Example
///
/// ```rust
/// use mdflowy_core::parse::Document;
///
/// let html = "<html><head><title>Outline</title></head><body><p>Hello</p></body></html>";
/// let doc = Document::parse(html).unwrap();
/// assert_eq!(doc.title(), Some("Outline".to_string()));
/// ```
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses a full page snapshot.
    pub fn parse(html: &str) -> Result<Self> {
        let html = Html::parse_document(html);
        Ok(Self { html })
    }

    /// Parses a markup fragment, such as the inner HTML of one content node.
    ///
    /// The fragment's top-level nodes become the children of
    /// [`Document::root_element`].
    pub fn parse_fragment(markup: &str) -> Self {
        Self { html: Html::parse_fragment(markup) }
    }

    /// The root `<html>` element.
    pub fn root_element(&self) -> Element<'_> {
        Element { element: self.html.root_element() }
    }

    /// Selects elements using a CSS selector, in document order.
    ///
    /// # Errors
    ///
    /// Returns [`PreviewError::HtmlParseError`] if the selector is invalid.
    ///
    /// # Example
    ///
    /// ```rust
    /// use mdflowy_core::parse::Document;
    ///
    /// let html = r#"<p class="content">First</p><p class="content">Second</p>"#;
    /// let doc = Document::parse(html).unwrap();
    /// let elements = doc.select("p.content").unwrap();
    /// assert_eq!(elements.len(), 2);
    /// ```
    pub fn select(&'_ self, selector: &str) -> Result<Vec<Element<'_>>> {
        let sel = parse_selector(selector)?;
        Ok(self.html.select(&sel).map(|el| Element { element: el }).collect())
    }

    /// Selects the elements carrying `class`, in document order.
    pub fn elements_with_class(&'_ self, class: &str) -> Result<Vec<Element<'_>>> {
        self.select(&class_selector(class))
    }

    /// Gets the title of the document.
    pub fn title(&self) -> Option<String> {
        let selector = Selector::parse("title").ok()?;
        self.html
            .select(&selector)
            .next()
            .map(|el| el.text().collect::<String>())
    }

    /// Gets all text content from the document.
    pub fn text_content(&self) -> String {
        self.html.root_element().text().collect()
    }
}

/// One entry of an element's child list snapshot.
#[derive(Clone, Debug)]
pub enum ChildNode<'a> {
    /// A child element.
    Element(Element<'a>),
    /// A text node, already decoded.
    Text(String),
    /// Comments, doctypes and processing instructions.
    Other,
}

/// A wrapper around scraper's ElementRef with the lookups the pipeline needs.
///
/// # Example
///
/// ```rust
/// use mdflowy_core::parse::Document;
///
/// let html = r#"<a href="https://example.com">Link text</a>"#;
/// let doc = Document::parse(html).unwrap();
/// let link = &doc.select("a").unwrap()[0];
///
/// assert_eq!(link.text(), "Link text");
/// assert_eq!(link.attr("href"), Some("https://example.com"));
/// ```
#[derive(Clone, Debug)]
pub struct Element<'a> {
    element: ElementRef<'a>,
}

impl<'a> Element<'a> {
    /// Gets the inner HTML of this element.
    pub fn inner_html(&self) -> String {
        self.element.inner_html()
    }

    /// Gets the outer HTML of this element.
    pub fn outer_html(&self) -> String {
        self.element.html()
    }

    /// Gets the text content of this element.
    pub fn text(&self) -> String {
        self.element.text().collect()
    }

    /// Gets the value of an attribute.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.element.value().attr(name)
    }

    /// Gets the lowercase tag name.
    pub fn tag_name(&self) -> String {
        self.element.value().name().to_lowercase()
    }

    /// The class list in attribute order.
    pub fn classes(&self) -> Vec<String> {
        self.attr("class")
            .map(|value| value.split_ascii_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Whether the class list contains `class`.
    pub fn has_class(&self, class: &str) -> bool {
        self.element.value().classes().any(|c| c == class)
    }

    /// Whether both handles point at the same node of one document.
    pub fn same_node(&self, other: &Element<'_>) -> bool {
        self.element.id() == other.element.id()
    }

    /// The parent element, if the parent is an element at all.
    pub fn parent(&self) -> Option<Element<'a>> {
        self.element
            .parent()
            .and_then(ElementRef::wrap)
            .map(|element| Element { element })
    }

    /// Element ancestors from the nearest outwards.
    pub fn ancestors(&self) -> impl Iterator<Item = Element<'a>> + 'a {
        self.element
            .ancestors()
            .filter_map(ElementRef::wrap)
            .map(|element| Element { element })
    }

    /// The nearest ancestor carrying `class`, excluding this element.
    pub fn closest_ancestor_with_class(&self, class: &str) -> Option<Element<'a>> {
        self.ancestors().find(|el| el.has_class(class))
    }

    /// Child elements only.
    pub fn child_elements(&self) -> Vec<Element<'a>> {
        self.element
            .children()
            .filter_map(ElementRef::wrap)
            .map(|element| Element { element })
            .collect()
    }

    /// Snapshot of the immediate children, elements and text alike.
    pub fn child_nodes(&self) -> Vec<ChildNode<'a>> {
        self.element
            .children()
            .map(|child| match child.value() {
                Node::Element(_) => match ElementRef::wrap(child) {
                    Some(element) => ChildNode::Element(Element { element }),
                    None => ChildNode::Other,
                },
                Node::Text(text) => ChildNode::Text(String::from(&**text)),
                _ => ChildNode::Other,
            })
            .collect()
    }

    /// Selects descendant elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`PreviewError::HtmlParseError`] if the selector is invalid.
    pub fn select(&'_ self, selector: &str) -> Result<Vec<Element<'a>>> {
        let sel = parse_selector(selector)?;
        Ok(self.element.select(&sel).map(|el| Element { element: el }).collect())
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| PreviewError::HtmlParseError(format!("Invalid selector: {}", e)))
}

/// Builds a `.class` selector, escaping characters CSS treats specially.
pub(crate) fn class_selector(class: &str) -> String {
    let mut selector = String::with_capacity(class.len() + 1);
    selector.push('.');
    for c in class.chars() {
        if !(c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            selector.push('\\');
        }
        selector.push(c);
    }
    selector
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_HTML: &str = r#"
        <!DOCTYPE html>
        <html lang="en">
        <head>
            <title>Outline</title>
        </head>
        <body>
            <div class="project root" projectid="None">
                <div class="name">
                    <div class="content" style="">
                        <span class="innerContentContainer">Hello <b>world</b><!-- note --></span>
                    </div>
                </div>
            </div>
        </body>
        </html>
    "#;

    #[test]
    fn test_parse_document() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        assert_eq!(doc.title(), Some("Outline".to_string()));
    }

    #[test]
    fn test_child_nodes_snapshot() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let node = &doc.elements_with_class("innerContentContainer").unwrap()[0];
        let children = node.child_nodes();

        assert_eq!(children.len(), 3);
        assert!(matches!(&children[0], ChildNode::Text(t) if t == "Hello "));
        assert!(matches!(&children[1], ChildNode::Element(el) if el.tag_name() == "b"));
        assert!(matches!(children[2], ChildNode::Other));
    }

    #[test]
    fn test_ancestors_and_classes() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let node = &doc.elements_with_class("innerContentContainer").unwrap()[0];

        let parent = node.parent().unwrap();
        assert!(parent.has_class("content"));
        assert_eq!(parent.attr("style"), Some(""));

        let project = node.closest_ancestor_with_class("project").unwrap();
        assert_eq!(project.classes(), vec!["project".to_string(), "root".to_string()]);
    }

    #[test]
    fn test_classes_keep_attribute_order() {
        let doc = Document::parse_fragment(r#"<div class="content active content">x</div>"#);
        let div = &doc.select("div").unwrap()[0];
        assert_eq!(div.classes(), vec!["content", "active", "content"]);
    }

    #[test]
    fn test_parse_fragment() {
        let doc = Document::parse_fragment("one <i>two</i>");
        let root = doc.root_element();
        assert_eq!(root.child_nodes().len(), 2);
        assert_eq!(root.text(), "one two");
    }

    #[test]
    fn test_invalid_selector() {
        let doc = Document::parse(SAMPLE_HTML).unwrap();
        let result = doc.select("[[invalid");

        assert!(matches!(result, Err(PreviewError::HtmlParseError(_))));
    }

    #[test]
    fn test_class_selector_escaping() {
        assert_eq!(class_selector("content"), ".content");
        assert_eq!(class_selector("name--focused"), ".name--focused");
        assert_eq!(class_selector("a.b"), ".a\\.b");
    }
}
