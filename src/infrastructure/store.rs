//! In-memory persistence with staged, all-or-nothing commits.

use std::sync::{Mutex, MutexGuard};

use tracing::{debug, instrument};
use uuid::Uuid;

use crate::domain::LeafMetadata;
use crate::infrastructure::traits::{
    NewTree, NodeHandle, OptionHandle, OptionStore, StoreError, StoreResult, TreeHandle,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredTree {
    pub handle: TreeHandle,
    pub definition: NewTree,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredOption {
    pub handle: OptionHandle,
    pub name: String,
    pub metadata: LeafMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredNode {
    pub handle: NodeHandle,
    pub tree: Uuid,
    /// None for a root placeholder
    pub parent: Option<NodeHandle>,
    pub rank: u32,
    pub option: Option<OptionHandle>,
}

#[derive(Debug, Clone, Default)]
struct Batch {
    trees: Vec<StoredTree>,
    options: Vec<StoredOption>,
    nodes: Vec<StoredNode>,
}

impl Batch {
    fn append(&mut self, other: Batch) {
        self.trees.extend(other.trees);
        self.options.extend(other.options);
        self.nodes.extend(other.nodes);
    }

    fn has_node(&self, handle: NodeHandle) -> bool {
        self.nodes.iter().any(|n| n.handle == handle)
    }

    fn has_option(&self, handle: OptionHandle) -> bool {
        self.options.iter().any(|o| o.handle == handle)
    }
}

#[derive(Debug, Default)]
struct State {
    committed: Batch,
    staged: Option<Batch>,
}

/// Store keeping everything in process memory.
///
/// Writes are staged per transaction and become visible through the accessors only
/// after `commit`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".into()))
    }

    fn with_staged<T>(&self, f: impl FnOnce(&Batch, &mut Batch) -> StoreResult<T>) -> StoreResult<T> {
        let mut state = self.lock()?;
        let State { committed, staged } = &mut *state;
        let staged = staged.as_mut().ok_or(StoreError::NoTransaction)?;
        f(committed, staged)
    }

    /// Committed trees, in creation order.
    pub fn trees(&self) -> StoreResult<Vec<StoredTree>> {
        Ok(self.lock()?.committed.trees.clone())
    }

    /// Committed options, in creation order.
    pub fn options(&self) -> StoreResult<Vec<StoredOption>> {
        Ok(self.lock()?.committed.options.clone())
    }

    /// Committed nodes (root placeholders included), in creation order.
    pub fn nodes(&self) -> StoreResult<Vec<StoredNode>> {
        Ok(self.lock()?.committed.nodes.clone())
    }

    /// Committed children of a node, ordered by rank.
    pub fn children_of(&self, parent: NodeHandle) -> StoreResult<Vec<StoredNode>> {
        let mut children: Vec<StoredNode> = self
            .nodes()?
            .into_iter()
            .filter(|n| n.parent == Some(parent))
            .collect();
        children.sort_by_key(|n| n.rank);
        Ok(children)
    }

    pub fn option(&self, handle: OptionHandle) -> StoreResult<Option<StoredOption>> {
        Ok(self.options()?.into_iter().find(|o| o.handle == handle))
    }
}

impl OptionStore for MemoryStore {
    fn begin(&self) -> StoreResult<()> {
        let mut state = self.lock()?;
        if state.staged.is_some() {
            return Err(StoreError::TransactionActive);
        }
        state.staged = Some(Batch::default());
        Ok(())
    }

    #[instrument(level = "debug", skip(self))]
    fn commit(&self) -> StoreResult<()> {
        let mut state = self.lock()?;
        let staged = state.staged.take().ok_or(StoreError::NoTransaction)?;
        debug!(
            "commit: {} trees, {} options, {} nodes",
            staged.trees.len(),
            staged.options.len(),
            staged.nodes.len()
        );
        state.committed.append(staged);
        Ok(())
    }

    #[instrument(level = "debug", skip(self))]
    fn rollback(&self) -> StoreResult<()> {
        let mut state = self.lock()?;
        state.staged.take().ok_or(StoreError::NoTransaction)?;
        Ok(())
    }

    fn create_tree(&self, tree: &NewTree) -> StoreResult<TreeHandle> {
        self.with_staged(|_, staged| {
            let handle = TreeHandle {
                id: Uuid::new_v4(),
                root: NodeHandle::new(),
            };
            staged.nodes.push(StoredNode {
                handle: handle.root,
                tree: handle.id,
                parent: None,
                rank: 0,
                option: None,
            });
            staged.trees.push(StoredTree {
                handle,
                definition: tree.clone(),
            });
            Ok(handle)
        })
    }

    fn create_option(&self, name: &str, metadata: &LeafMetadata) -> StoreResult<OptionHandle> {
        self.with_staged(|_, staged| {
            let handle = OptionHandle::new();
            staged.options.push(StoredOption {
                handle,
                name: name.to_string(),
                metadata: metadata.clone(),
            });
            Ok(handle)
        })
    }

    fn create_node(
        &self,
        tree: &TreeHandle,
        parent: NodeHandle,
        rank: u32,
        option: OptionHandle,
    ) -> StoreResult<NodeHandle> {
        self.with_staged(|committed, staged| {
            if !staged.has_node(parent) && !committed.has_node(parent) {
                return Err(StoreError::UnknownNode(parent));
            }
            if !staged.has_option(option) && !committed.has_option(option) {
                return Err(StoreError::UnknownOption(option));
            }
            let handle = NodeHandle::new();
            staged.nodes.push(StoredNode {
                handle,
                tree: tree.id,
                parent: Some(parent),
                rank,
                option: Some(option),
            });
            Ok(handle)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_tree() -> NewTree {
        NewTree {
            context: "mission-1".into(),
            name: "Regions".into(),
            levels: vec!["Region".into()],
            geographic: false,
        }
    }

    #[test]
    fn given_no_transaction_when_creating_then_errors() {
        let store = MemoryStore::new();

        let result = store.create_tree(&new_tree());

        assert!(matches!(result, Err(StoreError::NoTransaction)));
    }

    #[test]
    fn given_committed_transaction_then_writes_visible() {
        // Arrange
        let store = MemoryStore::new();
        store.begin().unwrap();

        // Act
        let tree = store.create_tree(&new_tree()).unwrap();
        let option = store.create_option("North", &LeafMetadata::default()).unwrap();
        let node = store.create_node(&tree, tree.root, 1, option).unwrap();
        assert!(store.nodes().unwrap().is_empty(), "staged writes must stay invisible");
        store.commit().unwrap();

        // Assert
        assert_eq!(store.trees().unwrap().len(), 1);
        let children = store.children_of(tree.root).unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].handle, node);
        assert_eq!(store.option(option).unwrap().unwrap().name, "North");
    }

    #[test]
    fn given_rolled_back_transaction_then_nothing_visible() {
        let store = MemoryStore::new();
        store.begin().unwrap();
        store.create_tree(&new_tree()).unwrap();

        store.rollback().unwrap();

        assert!(store.trees().unwrap().is_empty());
        assert!(store.nodes().unwrap().is_empty());
    }

    #[test]
    fn given_unknown_parent_when_creating_node_then_errors() {
        let store = MemoryStore::new();
        store.begin().unwrap();
        let tree = store.create_tree(&new_tree()).unwrap();
        let option = store.create_option("X", &LeafMetadata::default()).unwrap();

        let result = store.create_node(&tree, NodeHandle::new(), 1, option);

        assert!(matches!(result, Err(StoreError::UnknownNode(_))));
    }

    #[test]
    fn given_open_transaction_when_beginning_again_then_errors() {
        let store = MemoryStore::new();
        store.begin().unwrap();

        assert!(matches!(store.begin(), Err(StoreError::TransactionActive)));
    }

    #[test]
    fn given_poisoned_lock_when_reading_committed_then_backend_error() {
        // Arrange
        let store = MemoryStore::new();
        std::thread::scope(|scope| {
            let poisoner = scope.spawn(|| {
                let _guard = store.state.lock().unwrap();
                panic!("poison the store lock");
            });
            assert!(poisoner.join().is_err());
        });

        // Act / Assert
        assert!(matches!(store.trees(), Err(StoreError::Backend(_))));
        assert!(matches!(store.options(), Err(StoreError::Backend(_))));
        assert!(matches!(store.nodes(), Err(StoreError::Backend(_))));
        assert!(matches!(
            store.children_of(NodeHandle::new()),
            Err(StoreError::Backend(_))
        ));
    }
}
