//! Change notification and the re-render decision.
//!
//! A page binding (or the CLI, which diffs successive snapshots) delivers
//! batches of [`MutationRecord`]s to a [`MutationObserver`], one batch at a
//! time, in the order the mutations happened. [`RenderTrigger`] decides
//! whether a batch warrants recomputing the preview. Recomputation always
//! reads the current page rather than the records themselves, so the order of
//! records inside a batch does not matter and a missed batch is healed by the
//! next qualifying one.

use tracing::debug;

use crate::host::HostContract;
use crate::parse::{Document, Element};

/// The shape of a node named in a mutation record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDescriptor {
    /// Lowercase tag name
    pub tag: String,
    /// Class list
    pub classes: Vec<String>,
}

impl NodeDescriptor {
    pub fn new(tag: &str, classes: &[&str]) -> Self {
        Self { tag: tag.to_string(), classes: classes.iter().map(|c| c.to_string()).collect() }
    }

    pub fn from_element(element: &Element<'_>) -> Self {
        Self { tag: element.tag_name(), classes: element.classes() }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

/// A node inserted into the observed tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddedNode {
    Element(NodeDescriptor),
    /// Text, comments and anything else that is not an element
    Text,
}

/// One observed change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationRecord {
    /// Nodes were inserted somewhere under the observed root.
    ChildList { added: Vec<AddedNode> },
    /// An attribute of `target` changed.
    Attribute { target: NodeDescriptor, attribute: String },
}

impl MutationRecord {
    /// A child list record inserting a single element.
    pub fn element_added(tag: &str, classes: &[&str]) -> Self {
        MutationRecord::ChildList { added: vec![AddedNode::Element(NodeDescriptor::new(tag, classes))] }
    }

    /// A `class` attribute change on an element.
    pub fn class_changed(tag: &str, classes: &[&str]) -> Self {
        MutationRecord::Attribute { target: NodeDescriptor::new(tag, classes), attribute: "class".to_string() }
    }
}

/// Receives batches of changes, synchronously and one batch at a time.
pub trait MutationObserver {
    fn on_change(&mut self, batch: &[MutationRecord]);
}

/// Why a batch warrants a re-render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// A content node was inserted.
    Structural,
    /// A structural container's class changed, e.g. a note gained focus.
    Focus,
}

/// Decides, per batch, whether the preview must be recomputed.
#[derive(Debug, Clone, Default)]
pub struct RenderTrigger {
    contract: HostContract,
}

impl RenderTrigger {
    pub fn new(contract: HostContract) -> Self {
        Self { contract }
    }

    /// At most one reason per batch, however many records qualify.
    pub fn evaluate(&self, batch: &[MutationRecord]) -> Option<TriggerReason> {
        let reason = batch.iter().find_map(|record| self.evaluate_record(record));
        if let Some(reason) = reason {
            debug!(?reason, records = batch.len(), "batch triggers re-render");
        }
        reason
    }

    fn evaluate_record(&self, record: &MutationRecord) -> Option<TriggerReason> {
        match record {
            MutationRecord::ChildList { added } => added
                .iter()
                .any(|node| self.added_element_has_class(node, &self.contract.content_class))
                .then_some(TriggerReason::Structural),
            MutationRecord::Attribute { target, attribute } => {
                (attribute == "class" && target.has_class(&self.contract.container_class))
                    .then_some(TriggerReason::Focus)
            }
        }
    }

    /// Whether the batch carries the host's "finished loading" signal.
    pub fn page_loaded(&self, batch: &[MutationRecord]) -> bool {
        batch.iter().any(|record| match record {
            MutationRecord::ChildList { added } => added
                .iter()
                .any(|node| self.added_element_has_class(node, &self.contract.page_container_class)),
            MutationRecord::Attribute { .. } => false,
        })
    }

    fn added_element_has_class(&self, node: &AddedNode, class: &str) -> bool {
        match node {
            AddedNode::Element(element) => element.has_class(class),
            AddedNode::Text => false,
        }
    }
}

/// Derive the batch a live observer would have seen between two snapshots.
///
/// Content nodes are compared by position: a node at a position the previous
/// snapshot did not have, or whose markup changed, counts as inserted (the
/// host re-creates content nodes on edit). A structural container whose class
/// list changed at the same position yields a `class` attribute record. The
/// page container appearing yields its own insertion.
pub fn diff_snapshots(prev: &Document, next: &Document, contract: &HostContract) -> Vec<MutationRecord> {
    let mut batch = Vec::new();

    if !has_class(prev, &contract.page_container_class)
        && let Some(container) = first_with_class(next, &contract.page_container_class)
    {
        batch.push(MutationRecord::ChildList {
            added: vec![AddedNode::Element(NodeDescriptor::from_element(&container))],
        });
    }

    let before = content_nodes(prev, contract);
    let after = content_nodes(next, contract);

    let mut added = Vec::new();
    for (index, node) in after.iter().enumerate() {
        match before.get(index) {
            Some(old) if old.inner_html() == node.inner_html() => {
                if let (Some(old_container), Some(container)) = (old.parent(), node.parent())
                    && old_container.classes() != container.classes()
                {
                    batch.push(MutationRecord::Attribute {
                        target: NodeDescriptor::from_element(&container),
                        attribute: "class".to_string(),
                    });
                }
            }
            _ => added.push(AddedNode::Element(NodeDescriptor::from_element(node))),
        }
    }

    if !added.is_empty() {
        batch.push(MutationRecord::ChildList { added });
    }

    batch
}

fn content_nodes<'a>(doc: &'a Document, contract: &HostContract) -> Vec<Element<'a>> {
    doc.elements_with_class(&contract.content_class).unwrap_or_default()
}

fn first_with_class<'a>(doc: &'a Document, class: &str) -> Option<Element<'a>> {
    doc.elements_with_class(class).ok()?.into_iter().next()
}

fn has_class(doc: &Document, class: &str) -> bool {
    first_with_class(doc, class).is_some()
}
