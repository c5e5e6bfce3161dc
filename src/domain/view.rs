//! Read-only views of an option tree: terminal rendering and nested serde export.

use generational_arena::Index;
use serde::Serialize;
use termtree::Tree;

use crate::domain::arena::OptionTree;
use crate::domain::rows::LeafMetadata;

/// Nested, serializable form of a node and its subtree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeView {
    pub name: String,
    pub rank: u32,
    #[serde(flatten)]
    pub metadata: LeafMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat_lng: Option<(f64, f64)>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeView>,
}

/// Serializable form of a whole tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeView {
    pub levels: Vec<String>,
    pub geographic: bool,
    pub children: Vec<NodeView>,
}

impl TreeView {
    pub fn from_tree(tree: &OptionTree) -> Self {
        Self {
            levels: tree.levels().iter().map(|l| l.name.clone()).collect(),
            geographic: tree.is_geographic(),
            children: child_views(tree, tree.root()),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn child_views(tree: &OptionTree, idx: Index) -> Vec<NodeView> {
    tree.children(idx)
        .iter()
        .filter_map(|&child| {
            let data = tree.get_node(child)?.data.as_ref()?;
            Some(NodeView {
                name: data.option.name.clone(),
                rank: data.rank,
                metadata: data.option.metadata.clone(),
                lat_lng: data.option.metadata.lat_lng(),
                children: child_views(tree, child),
            })
        })
        .collect()
}

/// Rendering to `termtree` for terminal output.
pub trait TreeDisplay {
    fn to_tree_string(&self) -> Tree<String>;
}

impl TreeDisplay for OptionTree {
    fn to_tree_string(&self) -> Tree<String> {
        fn build_tree(tree: &OptionTree, node_idx: Index, parent_tree: &mut Tree<String>) {
            for &child_idx in tree.children(node_idx) {
                if let Some(data) = tree.get_node(child_idx).and_then(|n| n.data.as_ref()) {
                    let mut label = data.to_string();
                    if let Some(id) = &data.option.metadata.identifier {
                        label.push_str(&format!(" id={}", id));
                    }
                    if let Some(coords) = &data.option.metadata.coordinates {
                        label.push_str(&format!(" @ {}", coords));
                    }
                    let mut child_tree = Tree::new(label);
                    build_tree(tree, child_idx, &mut child_tree);
                    parent_tree.push(child_tree);
                }
            }
        }

        let levels: Vec<&str> = self.levels().iter().map(|l| l.name.as_str()).collect();
        let mut root = Tree::new(format!("[{}]", levels.join(" > ")));
        build_tree(self, self.root(), &mut root);
        root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::arena::OptionRecord;
    use crate::domain::header::Level;

    fn sample() -> OptionTree {
        let mut tree = OptionTree::new(
            vec![Level { name: "Region".into() }, Level { name: "Town".into() }],
            true,
        );
        let root = tree.root();
        let north = tree.insert_child(root, OptionRecord::new("North", LeafMetadata::default()), 1);
        let metadata = LeafMetadata {
            identifier: Some("42".into()),
            coordinates: Some("9.4, -0.85".into()),
        };
        tree.insert_child(north, OptionRecord::new("Tamale", metadata), 1);
        tree
    }

    #[test]
    fn given_tree_when_rendering_then_shows_rank_and_metadata() {
        let rendered = sample().to_tree_string().to_string();

        assert!(rendered.starts_with("[Region > Town]"));
        assert!(rendered.contains("North (#1)"));
        assert!(rendered.contains("Tamale (#1) id=42 @ 9.4, -0.85"));
    }

    #[test]
    fn given_tree_when_exporting_json_then_nested_with_metadata() {
        // Act
        let json = TreeView::from_tree(&sample()).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        // Assert
        assert_eq!(value["geographic"], true);
        assert_eq!(value["children"][0]["name"], "North");
        assert!(value["children"][0].get("identifier").is_none());
        let town = &value["children"][0]["children"][0];
        assert_eq!(town["identifier"], "42");
        assert_eq!(town["lat_lng"][0], 9.4);
        assert!(town.get("children").is_none());
    }
}
