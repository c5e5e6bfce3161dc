//! Tree builder: turns sorted, deduplicated rows into a ranked option tree.

use generational_arena::Index;
use tracing::{debug, trace};

use crate::domain::arena::{OptionRecord, OptionTree};
use crate::domain::cell::Cell;
use crate::domain::header::Level;
use crate::domain::rows::{LeafMetadata, LoadedSheet, Row};

/// Per-level cursor: the node most recently created at each column under the
/// current ancestor path, and how many siblings that column has produced so far.
struct Cursor {
    nodes: Vec<Option<Index>>,
    ranks: Vec<u32>,
}

impl Cursor {
    fn new(width: usize) -> Self {
        Self {
            nodes: vec![None; width],
            ranks: vec![0; width],
        }
    }

    /// True when the node under the cursor at `col` holds exactly `cell`.
    fn holds(&self, tree: &OptionTree, col: usize, cell: &Cell) -> bool {
        match (self.nodes[col], cell) {
            (Some(idx), Some(value)) => tree.name_of(idx) == Some(value.as_str()),
            _ => false,
        }
    }

    /// A prefix change at `col` invalidates every deeper cursor.
    fn reset_after(&mut self, col: usize) {
        for j in col + 1..self.nodes.len() {
            self.nodes[j] = None;
            self.ranks[j] = 0;
        }
    }
}

/// Builds an [`OptionTree`] in a single pass over the rows.
///
/// # Precondition
/// Rows must come out of [`crate::domain::sort::sort_and_dedup`]. Node identity is
/// decided by comparing each cell with the value under the cursor for its column;
/// there is no lookup of existing nodes. Unsorted input therefore
/// does not fail, it silently produces duplicate sibling branches.
pub struct TreeBuilder {
    levels: Vec<Level>,
    geographic: bool,
}

impl TreeBuilder {
    pub fn new(levels: Vec<Level>, geographic: bool) -> Self {
        Self { levels, geographic }
    }

    pub fn from_loaded(loaded: &LoadedSheet) -> Self {
        Self::new(loaded.levels.clone(), loaded.is_geographic())
    }

    pub fn build(self, rows: &[Row]) -> OptionTree {
        let width = self.levels.len();
        let mut tree = OptionTree::new(self.levels, self.geographic);
        let mut cursor = Cursor::new(width);

        for row in rows {
            assert_eq!(
                row.cells().len(),
                width,
                "row {} does not match the level count",
                row.source_row()
            );
            Self::apply_row(&mut tree, &mut cursor, row);
        }

        debug!(
            "build: {} rows -> {} nodes, depth {}",
            rows.len(),
            tree.node_count(),
            tree.depth()
        );
        tree
    }

    fn apply_row(tree: &mut OptionTree, cursor: &mut Cursor, row: &Row) {
        for (col, cell) in row.cells().iter().enumerate() {
            if cursor.holds(tree, col, cell) {
                continue;
            }

            if let Some(value) = cell {
                let metadata = if row.ends_at(col) {
                    row.metadata().clone()
                } else {
                    LeafMetadata::default()
                };
                let parent = if col == 0 {
                    tree.root()
                } else {
                    cursor.nodes[col - 1].unwrap_or_else(|| {
                        unreachable!("row {} has no ancestor at column {}", row.source_row(), col)
                    })
                };

                cursor.ranks[col] += 1;
                let idx = tree.insert_child(
                    parent,
                    OptionRecord::new(value.as_str(), metadata),
                    cursor.ranks[col],
                );
                trace!(
                    "row {}: created '{}' at level {} rank {}",
                    row.source_row(),
                    value,
                    col,
                    cursor.ranks[col]
                );
                cursor.nodes[col] = Some(idx);
            }

            cursor.reset_after(col);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cell::Limits;
    use crate::domain::header::HeaderLayout;
    use crate::domain::rows::load_rows;
    use crate::domain::sort::sort_and_dedup;

    fn strings(cells: &[&str]) -> Vec<Option<String>> {
        cells
            .iter()
            .map(|c| (!c.is_empty()).then(|| c.to_string()))
            .collect()
    }

    fn build(headers: &[&str], rows: &[&[&str]]) -> OptionTree {
        let limits = Limits::default();
        let layout = HeaderLayout::resolve(&strings(headers), &limits);
        let raw = rows
            .iter()
            .enumerate()
            .map(|(i, r)| (i + 2, strings(r)));
        let loaded = load_rows(&layout, raw, &limits).unwrap();
        let sorted = sort_and_dedup(loaded.rows.clone());
        TreeBuilder::from_loaded(&loaded).build(&sorted)
    }

    fn ranked_children(tree: &OptionTree, idx: Index) -> Vec<(String, u32)> {
        tree.children(idx)
            .iter()
            .map(|&c| {
                let data = tree.get_node(c).unwrap().data.as_ref().unwrap();
                (data.option.name.clone(), data.rank)
            })
            .collect()
    }

    #[test]
    fn given_cascading_rows_when_building_then_prefixes_shared() {
        // Arrange / Act
        let tree = build(&["L1", "L2"], &[&["A", "B"], &["A", "B"], &["A", "C"]]);

        // Assert
        assert_eq!(ranked_children(&tree, tree.root()), vec![("A".to_string(), 1)]);
        let a = tree.find(&["A"]).unwrap();
        assert_eq!(
            ranked_children(&tree, a),
            vec![("B".to_string(), 1), ("C".to_string(), 2)]
        );
        assert_eq!(tree.node_count(), 3);
    }

    #[test]
    fn given_reserved_id_when_building_then_metadata_on_deepest_node() {
        let tree = build(&["Id", "L1", "L2"], &[&["7", "A", "B"]]);

        let a = tree.get_node(tree.find(&["A"]).unwrap()).unwrap();
        let b = tree.get_node(tree.find(&["A", "B"]).unwrap()).unwrap();
        assert!(a.data.as_ref().unwrap().option.metadata.is_empty());
        assert_eq!(
            b.data.as_ref().unwrap().option.metadata.identifier.as_deref(),
            Some("7")
        );
    }

    #[test]
    fn given_prefix_row_when_building_then_metadata_on_shallow_node() {
        // Arrange: the shorter row sorts first and creates "A" itself
        let tree = build(
            &["L1", "Id", "L2"],
            &[&["A", "10", "B"], &["A", "20", ""]],
        );

        // Assert
        let a = tree.get_node(tree.find(&["A"]).unwrap()).unwrap();
        let b = tree.get_node(tree.find(&["A", "B"]).unwrap()).unwrap();
        assert_eq!(a.data.as_ref().unwrap().option.metadata.identifier.as_deref(), Some("20"));
        assert_eq!(b.data.as_ref().unwrap().option.metadata.identifier.as_deref(), Some("10"));
        assert_eq!(tree.node_count(), 2);
    }

    #[test]
    fn given_many_siblings_when_building_then_ranks_are_one_to_k() {
        let tree = build(
            &["Region", "Town"],
            &[
                &["North", "Tamale"],
                &["Ashanti", "Kumasi"],
                &["North", "Bolgatanga"],
                &["Ashanti", "Obuasi"],
                &["Volta", "Ho"],
            ],
        );

        for (idx, node) in tree.iter() {
            let ranks: Vec<u32> = ranked_children(&tree, idx).into_iter().map(|(_, r)| r).collect();
            let expected: Vec<u32> = (1..=node.children.len() as u32).collect();
            assert_eq!(ranks, expected);
        }
        assert_eq!(
            ranked_children(&tree, tree.root()),
            vec![("Ashanti".to_string(), 1), ("North".to_string(), 2), ("Volta".to_string(), 3)]
        );
    }

    #[test]
    fn given_same_value_under_different_parents_when_building_then_distinct_nodes() {
        let tree = build(&["L1", "L2"], &[&["A", "Central"], &["B", "Central"]]);

        let under_a = tree.find(&["A", "Central"]).unwrap();
        let under_b = tree.find(&["B", "Central"]).unwrap();
        assert_ne!(under_a, under_b);
        assert_eq!(tree.node_count(), 4);
    }

    #[test]
    fn given_unsorted_rows_when_building_then_branches_duplicate() {
        // Documents the precondition: skipping the sort breaks prefix sharing.
        let rows = vec![
            Row::new(2, vec![Some("A".into())], LeafMetadata::default()),
            Row::new(3, vec![Some("B".into())], LeafMetadata::default()),
            Row::new(4, vec![Some("A".into())], LeafMetadata::default()),
        ];

        let tree = TreeBuilder::new(vec![Level { name: "L1".into() }], false).build(&rows);

        assert_eq!(tree.children(tree.root()).len(), 3);
    }

    #[test]
    fn given_coordinates_column_when_building_then_tree_geographic() {
        let tree = build(&["L1", "Coordinates"], &[&["A", "1, 2"]]);

        assert!(tree.is_geographic());
        assert_eq!(tree.levels().len(), 1);
    }
}
