//! Domain layer: entities and business logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod cell;
pub mod error;
pub mod header;
pub mod rows;
pub mod sort;
pub mod view;

pub use arena::{NodeData, OptionRecord, OptionTree, TreeNode};
pub use builder::TreeBuilder;
pub use cell::{is_blank, normalize, Cell, Limits, MAX_LEVEL_LENGTH, MAX_OPTION_LENGTH};
pub use error::{DomainError, DomainResult};
pub use header::{HeaderLayout, Level, ReservedColumn};
pub use rows::{has_blank_interior_cell, load_rows, LeafMetadata, LoadedSheet, Row};
pub use sort::{compare_rows, sort_and_dedup};
pub use view::{NodeView, TreeDisplay, TreeView};
