//! I/O boundary traits for testability
//!
//! These traits abstract the sheet source and the persistence layer, allowing the
//! import service to be tested with in-memory implementations.

use std::fmt;
use std::io;
use std::path::Path;

use thiserror::Error;
use uuid::Uuid;

use crate::domain::LeafMetadata;

/// A single tabular sheet addressed by 1-based row numbers.
pub trait Sheet {
    /// Index of the last row holding any populated cell (0 for an empty sheet).
    fn last_row(&self) -> usize;

    /// Cells of a row; rows past the end are empty.
    fn row(&self, index: usize) -> Vec<Option<String>>;
}

/// Opens a sheet from a source path.
pub trait SheetReader: Send + Sync {
    /// Read the first sheet of the source.
    fn open(&self, path: &Path) -> io::Result<Box<dyn Sheet>>;
}

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

handle!(
    /// Stable identity of a stored node.
    NodeHandle
);
handle!(
    /// Stable identity of a stored option.
    OptionHandle
);

/// Stable identity of a stored tree plus its root placeholder node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TreeHandle {
    pub id: Uuid,
    pub root: NodeHandle,
}

/// Everything needed to create the tree record itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTree {
    /// Target context (mission/tenant) identifier
    pub context: String,
    pub name: String,
    pub levels: Vec<String>,
    pub geographic: bool,
}

/// Errors raised by a persistence backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("no transaction in progress")]
    NoTransaction,

    #[error("transaction already in progress")]
    TransactionActive,

    #[error("unknown node: {0}")]
    UnknownNode(NodeHandle),

    #[error("unknown option: {0}")]
    UnknownOption(OptionHandle),

    #[error("storage backend failed: {0}")]
    Backend(String),
}

/// Result type for persistence operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence abstraction for option trees.
///
/// Writes happen between `begin` and `commit`; `rollback` discards them. Handles
/// returned inside a transaction are valid parent references for later calls in the
/// same transaction.
pub trait OptionStore: Send + Sync {
    fn begin(&self) -> StoreResult<()>;

    fn commit(&self) -> StoreResult<()>;

    fn rollback(&self) -> StoreResult<()>;

    /// Create the tree record and its root placeholder node.
    fn create_tree(&self, tree: &NewTree) -> StoreResult<TreeHandle>;

    fn create_option(&self, name: &str, metadata: &LeafMetadata) -> StoreResult<OptionHandle>;

    fn create_node(
        &self,
        tree: &TreeHandle,
        parent: NodeHandle,
        rank: u32,
        option: OptionHandle,
    ) -> StoreResult<NodeHandle>;
}
