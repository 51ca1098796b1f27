//! Document collection: every visible content node, in order, one per line.

use tracing::debug;

use crate::extract::{ExtractConfig, extract_node_text};
use crate::host::HostContract;
use crate::parse::{Document, Element};

/// Counts gathered while collecting a document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectStats {
    /// Nodes that contributed a line
    pub visible: usize,
    /// Nodes skipped by the visibility predicate
    pub hidden: usize,
    /// Nodes skipped because they had no parent element
    pub detached: usize,
}

/// Builds the Document String from a page snapshot.
#[derive(Debug, Clone, Default)]
pub struct DocumentCollector {
    contract: HostContract,
    extract: ExtractConfig,
}

impl DocumentCollector {
    pub fn new(contract: HostContract, extract: ExtractConfig) -> Self {
        Self { contract, extract }
    }

    pub fn contract(&self) -> &HostContract {
        &self.contract
    }

    /// Concatenate the extracted text of every visible content node, each
    /// followed by a newline, in document order.
    pub fn collect(&self, doc: &Document) -> String {
        self.collect_with_stats(doc).0
    }

    pub fn collect_with_stats(&self, doc: &Document) -> (String, CollectStats) {
        let mut output = String::new();
        let mut stats = CollectStats::default();

        let nodes = match doc.elements_with_class(&self.contract.content_class) {
            Ok(nodes) => nodes,
            Err(err) => {
                debug!(error = %err, "content selector rejected");
                return (output, stats);
            }
        };

        for node in nodes {
            let Some(container) = node.parent() else {
                stats.detached += 1;
                continue;
            };

            if !is_visible(&container) {
                stats.hidden += 1;
                continue;
            }

            output.push_str(&extract_node_text(&node, &self.contract, &self.extract));
            output.push('\n');
            stats.visible += 1;
        }

        debug!(
            visible = stats.visible,
            hidden = stats.hidden,
            detached = stats.detached,
            "collected document"
        );

        (output, stats)
    }
}

/// The host sometimes renders the same content twice, once hidden. Only a
/// container without inline style, with an empty one, or with one mentioning
/// `visibility` is the on-screen copy.
pub fn is_visible(container: &Element<'_>) -> bool {
    match container.attr("style") {
        None => true,
        Some(style) => style.is_empty() || style.contains("visibility"),
    }
}
