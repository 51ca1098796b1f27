//! Ordered list detection.
//!
//! An outline item tagged `#ol` in its own name numbers its direct children.
//! The numbering is pure CSS keyed on the [`ORDERED_LIST_CLASS`] marker (see
//! [`crate::styles`]); this module only finds the items that need it.

use crate::host::HostContract;
use crate::parse::{Document, Element};

/// Default tag that turns an item into an ordered list.
pub const DEFAULT_ORDERED_LIST_TAG: &str = "#ol";

/// Class a tagged project carries so the numbering rules apply.
pub const ORDERED_LIST_CLASS: &str = "list-ol";

/// A project whose children are numbered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedList {
    /// Position among all projects of the page, in document order
    pub project_index: usize,
    /// Plain text of the project's name, tag included
    pub title: String,
    /// Number of direct child projects
    pub items: usize,
}

/// Projects whose own content node carries a tag with value `tag`.
///
/// Tag values compare case-sensitively. Content nodes without a parent
/// element, and nodes outside any project, are skipped.
pub fn ordered_list_projects(doc: &Document, contract: &HostContract, tag: &str) -> Vec<OrderedList> {
    let Ok(nodes) = doc.elements_with_class(&contract.content_class) else {
        return Vec::new();
    };
    let projects = doc.elements_with_class(&contract.project_class).unwrap_or_default();

    nodes
        .iter()
        .filter(|node| node.parent().is_some())
        .filter(|node| carries_tag(node, contract, tag))
        .filter_map(|node| {
            let project = node.closest_ancestor_with_class(&contract.project_class)?;
            let project_index = projects.iter().position(|p| p.same_node(&project))?;
            Some(OrderedList {
                project_index,
                title: node.text().trim().to_string(),
                items: child_projects(&project, contract),
            })
        })
        .collect()
}

fn carries_tag(node: &Element<'_>, contract: &HostContract, tag: &str) -> bool {
    node.select(&format!("[{}]", contract.tag_value_attr))
        .map(|tags| tags.iter().any(|el| el.attr(&contract.tag_value_attr) == Some(tag)))
        .unwrap_or(false)
}

fn child_projects(project: &Element<'_>, contract: &HostContract) -> usize {
    project
        .child_elements()
        .iter()
        .filter(|el| el.has_class(&contract.children_class))
        .flat_map(|children| children.child_elements())
        .filter(|el| el.has_class(&contract.project_class))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(name: &str, children: &[String]) -> String {
        format!(
            r#"<div class="project"><div class="name"><div class="content"><span class="innerContentContainer">{}</span></div></div><div class="children">{}</div></div>"#,
            name,
            children.concat()
        )
    }

    fn ol_tag() -> &'static str {
        r##"<span class="contentTag" data-val="#ol">#<span class="contentTagText">ol</span></span>"##
    }

    #[test]
    fn test_tagged_project() {
        let leaf = |n: &str| project(n, &[]);
        let html = project(&format!("Steps {}", ol_tag()), &[leaf("one"), leaf("two"), leaf("three")]);
        let doc = Document::parse(&html).unwrap();

        let lists = ordered_list_projects(&doc, &HostContract::default(), DEFAULT_ORDERED_LIST_TAG);
        assert_eq!(lists, vec![OrderedList { project_index: 0, title: "Steps #ol".to_string(), items: 3 }]);
    }

    #[test]
    fn test_untagged_and_other_tags() {
        let other = r##"<span class="contentTag" data-val="#todo">#todo</span>"##;
        let html = format!("{}{}", project("plain", &[]), project(&format!("x {}", other), &[]));
        let doc = Document::parse(&html).unwrap();

        assert!(ordered_list_projects(&doc, &HostContract::default(), DEFAULT_ORDERED_LIST_TAG).is_empty());
    }

    #[test]
    fn test_nested_lists_count_direct_children_only() {
        let grandchild = project("deep", &[]);
        let child = project(&format!("inner {}", ol_tag()), &[grandchild.clone(), grandchild]);
        let html = project(&format!("outer {}", ol_tag()), &[child]);
        let doc = Document::parse(&html).unwrap();

        let lists = ordered_list_projects(&doc, &HostContract::default(), DEFAULT_ORDERED_LIST_TAG);
        assert_eq!(lists.len(), 2);
        assert_eq!((lists[0].project_index, lists[0].items), (0, 1));
        assert_eq!((lists[1].project_index, lists[1].items), (1, 2));
    }
}
