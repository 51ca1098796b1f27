//! The host outliner's DOM contract and node classification.
//!
//! The outliner renders each item as a `.project` with a `.name` row and an
//! optional `.notes` row. Both rows hold a structural `.content` container
//! whose only child of interest is the editable `.innerContentContainer`.
//! Nothing in the host markup is versioned, so every marker the pipeline
//! relies on lives in [`HostContract`] and can be overridden from config.

use serde::{Deserialize, Serialize};

use crate::parse::Element;

/// Class and attribute names the pipeline reads from the host page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostContract {
    /// Leaf editable content node.
    pub content_class: String,
    /// Structural container wrapping a content node.
    pub container_class: String,
    /// Row wrapping the container of a note.
    pub note_class: String,
    /// Focus marker on the structural container.
    pub active_class: String,
    /// Marker on the project the page is zoomed into.
    pub root_class: String,
    /// Outline item.
    pub project_class: String,
    /// Direct children wrapper of a project.
    pub children_class: String,
    /// Inline tag element.
    pub tag_class: String,
    /// Attribute on the tag element holding its literal text, e.g. `#ol`.
    pub tag_value_attr: String,
    /// Element that appears once the host finished its initial load.
    pub page_container_class: String,
    /// Page the preview panel is placed after.
    pub active_page_selector: String,
}

impl Default for HostContract {
    fn default() -> Self {
        Self {
            content_class: "innerContentContainer".to_string(),
            container_class: "content".to_string(),
            note_class: "notes".to_string(),
            active_class: "active".to_string(),
            root_class: "root".to_string(),
            project_class: "project".to_string(),
            children_class: "children".to_string(),
            tag_class: "contentTag".to_string(),
            tag_value_attr: "data-val".to_string(),
            page_container_class: "pageContainer".to_string(),
            active_page_selector: ".page.active".to_string(),
        }
    }
}

impl HostContract {
    /// The literal value of a tag element, or `None` if `element` is not a tag.
    pub fn tag_value<'a>(&self, element: &Element<'a>) -> Option<&'a str> {
        if !element.has_class(&self.tag_class) {
            return None;
        }
        element.attr(&self.tag_value_attr)
    }
}

/// Where a content node sits in the outline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutlinePosition {
    /// The node is the body of a note rather than an item name.
    pub is_note: bool,
    /// The node's container currently holds input focus.
    pub is_active: bool,
    /// The node belongs to the project the page is zoomed into.
    pub is_root: bool,
}

impl OutlinePosition {
    /// Reads the position of a content node from its ancestry.
    ///
    /// A node without a structural container is reported as a plain,
    /// unfocused item.
    pub fn of(node: &Element<'_>, contract: &HostContract) -> Self {
        let Some(container) = node.parent() else {
            return Self::default();
        };

        let is_note = container
            .parent()
            .is_some_and(|row| row.has_class(&contract.note_class));
        let is_active = container.has_class(&contract.active_class);
        let is_root = node
            .closest_ancestor_with_class(&contract.project_class)
            .is_some_and(|project| project.has_class(&contract.root_class));

        Self { is_note, is_active, is_root }
    }
}

/// Extraction policy for a content node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    /// An item name.
    Plain,
    /// A note without focus; the host shows only its first line.
    Note,
    /// A note being edited; the host shows all of it.
    ActiveNote,
    /// The note of the zoomed-in project; always expanded.
    RootNote,
}

impl NodeRole {
    /// Classifies a content node in place.
    pub fn classify(node: &Element<'_>, contract: &HostContract) -> Self {
        Self::from(OutlinePosition::of(node, contract))
    }

    /// Whether only the first line of the node should be used.
    pub fn is_collapsed(self) -> bool {
        self == NodeRole::Note
    }
}

impl From<OutlinePosition> for NodeRole {
    fn from(position: OutlinePosition) -> Self {
        match position {
            OutlinePosition { is_note: false, .. } => NodeRole::Plain,
            OutlinePosition { is_root: true, .. } => NodeRole::RootNote,
            OutlinePosition { is_active: true, .. } => NodeRole::ActiveNote,
            _ => NodeRole::Note,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::Document;

    const OUTLINE: &str = r#"
        <div class="project root">
            <div class="name"><div class="content"><span class="innerContentContainer">Root</span></div></div>
            <div class="notes"><div class="content"><span class="innerContentContainer">Root note</span></div></div>
            <div class="children">
                <div class="project">
                    <div class="name"><div class="content"><span class="innerContentContainer">Item</span></div></div>
                    <div class="notes"><div class="content"><span class="innerContentContainer">Quiet</span></div></div>
                </div>
                <div class="project">
                    <div class="name"><div class="content"><span class="innerContentContainer">Other</span></div></div>
                    <div class="notes"><div class="content active"><span class="innerContentContainer">Typing</span></div></div>
                </div>
            </div>
        </div>
    "#;

    fn roles() -> Vec<NodeRole> {
        let doc = Document::parse(OUTLINE).unwrap();
        let contract = HostContract::default();
        doc.elements_with_class(&contract.content_class)
            .unwrap()
            .iter()
            .map(|node| NodeRole::classify(node, &contract))
            .collect()
    }

    #[test]
    fn test_classify_outline() {
        assert_eq!(
            roles(),
            vec![
                NodeRole::Plain,
                NodeRole::RootNote,
                NodeRole::Plain,
                NodeRole::Note,
                NodeRole::Plain,
                NodeRole::ActiveNote,
            ]
        );
    }

    #[test]
    fn test_root_wins_over_focus() {
        let position = OutlinePosition { is_note: true, is_active: true, is_root: true };
        assert_eq!(NodeRole::from(position), NodeRole::RootNote);
        assert!(!NodeRole::from(position).is_collapsed());
    }

    #[test]
    fn test_only_inactive_notes_collapse() {
        assert!(NodeRole::Note.is_collapsed());
        assert!(!NodeRole::Plain.is_collapsed());
        assert!(!NodeRole::ActiveNote.is_collapsed());
    }

    #[test]
    fn test_tag_value() {
        let doc = Document::parse(r##"<span class="contentTag" data-val="#ol">#<span>ol</span></span><b data-val="x">b</b>"##)
            .unwrap();
        let contract = HostContract::default();
        let tag = &doc.select(".contentTag").unwrap()[0];
        let bold = &doc.select("b").unwrap()[0];

        assert_eq!(contract.tag_value(tag), Some("#ol"));
        assert_eq!(contract.tag_value(bold), None);
    }

    #[test]
    fn test_contract_from_partial_json() {
        let contract: HostContract = serde_json::from_str(r#"{"active_class": "focused"}"#).unwrap();
        assert_eq!(contract.active_class, "focused");
        assert_eq!(contract.content_class, "innerContentContainer");
    }
}
