//! Arena-based option tree.

use std::fmt;

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::header::Level;
use crate::domain::rows::LeafMetadata;

/// A named choice value. Each node owns its own record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionRecord {
    pub name: String,
    /// Reserved-column values; empty unless the node ended its row.
    pub metadata: LeafMetadata,
}

impl OptionRecord {
    pub fn new(name: impl Into<String>, metadata: LeafMetadata) -> Self {
        Self {
            name: name.into(),
            metadata,
        }
    }
}

/// Payload of a non-root node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeData {
    pub option: OptionRecord,
    /// 1-based position among siblings, in first-seen order
    pub rank: u32,
}

impl fmt::Display for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (#{})", self.option.name, self.rank)
    }
}

/// Tree node in the arena.
#[derive(Debug)]
pub struct TreeNode {
    /// None for the root placeholder
    pub data: Option<NodeData>,
    /// Index of parent node in the arena, None for the root
    pub parent: Option<Index>,
    /// Children in rank order
    pub children: Vec<Index>,
}

impl TreeNode {
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn name(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.option.name.as_str())
    }
}

/// Ranked option tree built from a cascading sheet.
///
/// Nodes are only ever appended: no node is removed and no rank is renumbered, so
/// creation order is also a valid parent-before-child persistence order.
#[derive(Debug)]
pub struct OptionTree {
    levels: Vec<Level>,
    geographic: bool,
    arena: Arena<TreeNode>,
    root: Index,
    created: Vec<Index>,
}

impl OptionTree {
    pub fn new(levels: Vec<Level>, geographic: bool) -> Self {
        let mut arena = Arena::new();
        let root = arena.insert(TreeNode {
            data: None,
            parent: None,
            children: Vec::new(),
        });
        Self {
            levels,
            geographic,
            arena,
            root,
            created: Vec::new(),
        }
    }

    /// Append a child under `parent`.
    ///
    /// # Panics
    /// If `parent` is not a node of this tree or `rank` does not continue the
    /// parent's child sequence. Both indicate a builder defect, not bad input.
    #[instrument(level = "trace", skip(self, option))]
    pub fn insert_child(&mut self, parent: Index, option: OptionRecord, rank: u32) -> Index {
        let expected = self
            .arena
            .get(parent)
            .map(|p| p.children.len() as u32 + 1)
            .expect("parent node must exist in the tree");
        assert_eq!(rank, expected, "ranks must be assigned 1..k without gaps");

        let node_idx = self.arena.insert(TreeNode {
            data: Some(NodeData { option, rank }),
            parent: Some(parent),
            children: Vec::new(),
        });
        if let Some(parent_node) = self.arena.get_mut(parent) {
            parent_node.children.push(node_idx);
        }
        self.created.push(node_idx);
        node_idx
    }

    pub fn root(&self) -> Index {
        self.root
    }

    pub fn get_node(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    pub fn children(&self, idx: Index) -> &[Index] {
        self.arena
            .get(idx)
            .map(|n| n.children.as_slice())
            .unwrap_or_default()
    }

    /// Option name held by a node; None for the root or a stale index.
    pub fn name_of(&self, idx: Index) -> Option<&str> {
        self.arena.get(idx).and_then(TreeNode::name)
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn is_geographic(&self) -> bool {
        self.geographic
    }

    /// Non-root nodes in the order they were created.
    pub fn creation_order(&self) -> &[Index] {
        &self.created
    }

    /// Number of non-root nodes.
    pub fn node_count(&self) -> usize {
        self.created.len()
    }

    /// Number of populated levels below the root.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.calculate_depth(self.root) - 1
    }

    fn calculate_depth(&self, node_idx: Index) -> usize {
        match self.get_node(node_idx) {
            Some(node) => {
                1 + node
                    .children
                    .iter()
                    .map(|&child| self.calculate_depth(child))
                    .max()
                    .unwrap_or(0)
            }
            None => 0,
        }
    }

    /// Nodes without children, left to right.
    pub fn leaf_nodes(&self) -> Vec<Index> {
        self.iter()
            .filter(|(_, node)| !node.is_root() && node.children.is_empty())
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Option names from the first level down to `idx`.
    pub fn path(&self, idx: Index) -> Vec<&str> {
        let mut names = Vec::new();
        let mut current = Some(idx);
        while let Some(node) = current.and_then(|i| self.get_node(i)) {
            if let Some(name) = node.name() {
                names.push(name);
            }
            current = node.parent;
        }
        names.reverse();
        names
    }

    /// Find a node by its option names from the first level down.
    pub fn find(&self, path: &[&str]) -> Option<Index> {
        path.iter().try_fold(self.root, |current, name| {
            self.children(current)
                .iter()
                .copied()
                .find(|&child| self.name_of(child) == Some(*name))
        })
    }

    /// Preorder traversal starting at the root.
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self)
    }
}

pub struct TreeIterator<'a> {
    tree: &'a OptionTree,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(tree: &'a OptionTree) -> Self {
        Self {
            tree,
            stack: vec![tree.root],
        }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.tree.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn option(name: &str) -> OptionRecord {
        OptionRecord::new(name, LeafMetadata::default())
    }

    #[test]
    fn given_new_tree_then_only_root() {
        let tree = OptionTree::new(vec![], false);

        assert_eq!(tree.node_count(), 0);
        assert_eq!(tree.depth(), 0);
        assert!(tree.leaf_nodes().is_empty());
        assert!(tree.get_node(tree.root()).unwrap().is_root());
    }

    #[test]
    fn given_inserted_children_when_traversing_then_preorder() {
        // Arrange
        let mut tree = OptionTree::new(vec![], false);
        let root = tree.root();
        let a = tree.insert_child(root, option("A"), 1);
        tree.insert_child(a, option("A1"), 1);
        tree.insert_child(root, option("B"), 2);

        // Act
        let names: Vec<_> = tree.iter().filter_map(|(_, n)| n.name()).collect();

        // Assert
        assert_eq!(names, ["A", "A1", "B"]);
        assert_eq!(tree.depth(), 2);
        assert_eq!(tree.leaf_nodes().len(), 2);
        assert_eq!(tree.path(tree.find(&["A", "A1"]).unwrap()), ["A", "A1"]);
        assert!(tree.find(&["B", "A1"]).is_none());
    }

    #[test]
    #[should_panic(expected = "ranks must be assigned")]
    fn given_rank_gap_when_inserting_then_panics() {
        let mut tree = OptionTree::new(vec![], false);
        let root = tree.root();
        tree.insert_child(root, option("A"), 2);
    }
}
