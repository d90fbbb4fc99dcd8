//! Sidebar navigation built from the content tree

use serde::Serialize;
use std::collections::BTreeSet;

use crate::content::ContentTree;
use crate::slug::SlugPath;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NavNode {
    Page {
        title: String,
        url: String,
    },
    Folder {
        title: String,
        /// Set when the folder has an index page
        url: Option<String>,
        children: Vec<NavNode>,
    },
}

/// Build the navigation tree, urls under `prefix` (e.g. `/docs`)
pub fn build_navigation(tree: &ContentTree, prefix: &str) -> Vec<NavNode> {
    let mut nodes = Vec::new();
    if let Some(root) = tree.get(&SlugPath::root()) {
        nodes.push(NavNode::Page {
            title: root.metadata.title.clone(),
            url: root.path.url(prefix),
        });
    }
    nodes.extend(children_of(tree, &SlugPath::root(), prefix));
    nodes
}

fn children_of(tree: &ContentTree, parent: &SlugPath, prefix: &str) -> Vec<NavNode> {
    let depth = parent.segments().len();
    let next_segments: BTreeSet<&str> = tree
        .documents()
        .filter(|doc| doc.path.segments().len() > depth && doc.path.starts_with(parent))
        .map(|doc| doc.path.segments()[depth].as_str())
        .collect();

    next_segments
        .into_iter()
        .filter_map(|segment| {
            let path = parent.join(segment);
            let index = tree.get(&path);
            let has_children = tree
                .documents()
                .any(|doc| doc.path.segments().len() > depth + 1 && doc.path.starts_with(&path));

            if has_children {
                Some(NavNode::Folder {
                    title: index
                        .map(|doc| doc.metadata.title.clone())
                        .unwrap_or_else(|| segment.to_string()),
                    url: index.map(|doc| doc.path.url(prefix)),
                    children: children_of(tree, &path, prefix),
                })
            } else {
                index.map(|doc| NavNode::Page {
                    title: doc.metadata.title.clone(),
                    url: doc.path.url(prefix),
                })
            }
        })
        .collect()
}
