//! Option tree import service
//!
//! Validates a request, loads and cleans the sheet, builds the ranked tree and
//! persists it inside a single store transaction.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use generational_arena::Index;
use tracing::{debug, info, instrument, warn};

use crate::application::validation::{ImportRequest, ValidImport};
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{
    load_rows, sort_and_dedup, HeaderLayout, Limits, LoadedSheet, OptionTree, TreeBuilder,
};
use crate::infrastructure::traits::{
    NewTree, NodeHandle, OptionStore, Sheet, SheetReader, StoreResult, TreeHandle,
};

/// Cleaned, sorted and deduplicated sheet content, ready for building.
#[derive(Debug, Clone)]
pub struct PreparedSheet {
    pub loaded: LoadedSheet,
    /// Rows dropped as exact duplicates of an earlier row
    pub duplicates: usize,
}

/// Output of a committed import.
#[derive(Debug)]
pub struct ImportOutcome {
    pub handle: TreeHandle,
    pub tree: OptionTree,
    pub rows: usize,
    pub duplicates: usize,
}

/// Service turning cascading sheets into persisted option trees.
pub struct ImportService {
    reader: Arc<dyn SheetReader>,
    store: Arc<dyn OptionStore>,
    limits: Limits,
}

impl ImportService {
    pub fn new(reader: Arc<dyn SheetReader>, store: Arc<dyn OptionStore>, limits: Limits) -> Self {
        Self {
            reader,
            store,
            limits,
        }
    }

    /// Validate, load, build and persist.
    ///
    /// Validation failures are reported before the source is opened. Fatal input
    /// errors abort before the store is touched; store failures roll back.
    #[instrument(level = "debug", skip(self))]
    pub fn import(&self, request: &ImportRequest) -> ApplicationResult<ImportOutcome> {
        let valid = request.validate()?;
        let sheet = self.open(&valid.source)?;
        self.import_sheet(&valid, sheet.as_ref())
    }

    /// Load and clean a source without building or persisting anything.
    #[instrument(level = "debug", skip(self))]
    pub fn check(&self, source: &Path) -> ApplicationResult<PreparedSheet> {
        let sheet = self.open(source)?;
        self.prepare(sheet.as_ref())
    }

    /// Import from an already opened sheet.
    pub fn import_sheet(&self, target: &ValidImport, sheet: &dyn Sheet) -> ApplicationResult<ImportOutcome> {
        let prepared = self.prepare(sheet)?;
        let tree = TreeBuilder::from_loaded(&prepared.loaded).build(&prepared.loaded.rows);
        let handle = self.persist(target, &tree)?;
        info!(
            "imported '{}' into {}: {} nodes from {} rows",
            target.name,
            target.context,
            tree.node_count(),
            prepared.loaded.rows.len()
        );

        Ok(ImportOutcome {
            handle,
            rows: prepared.loaded.rows.len(),
            duplicates: prepared.duplicates,
            tree,
        })
    }

    /// Resolve headers, clean rows, then sort and deduplicate them.
    pub fn prepare(&self, sheet: &dyn Sheet) -> ApplicationResult<PreparedSheet> {
        let layout = HeaderLayout::resolve(&sheet.row(1), &self.limits);
        debug!(
            "prepare: {} levels, reserved {:?}, width {}",
            layout.levels.len(),
            layout.reserved,
            layout.width
        );

        let last_row = sheet.last_row();
        let raw_rows = (2..=last_row).map(|r| (r, sheet.row(r)));
        let mut loaded = load_rows(&layout, raw_rows, &self.limits)?;

        let before = loaded.rows.len();
        loaded.rows = sort_and_dedup(loaded.rows);
        let duplicates = before - loaded.rows.len();

        Ok(PreparedSheet { loaded, duplicates })
    }

    fn open(&self, source: &Path) -> ApplicationResult<Box<dyn Sheet>> {
        self.reader
            .open(source)
            .map_err(|e| ApplicationError::Source {
                path: source.to_path_buf(),
                source: e,
            })
    }

    /// Write the tree in creation order inside one transaction.
    fn persist(&self, target: &ValidImport, tree: &OptionTree) -> ApplicationResult<TreeHandle> {
        self.store
            .begin()
            .map_err(|e| ApplicationError::store("begin transaction", e))?;

        match self.write_tree(target, tree) {
            Ok(handle) => {
                self.store
                    .commit()
                    .map_err(|e| ApplicationError::store("commit", e))?;
                Ok(handle)
            }
            Err(e) => {
                if let Err(rollback_err) = self.store.rollback() {
                    warn!("rollback failed: {}", rollback_err);
                }
                Err(ApplicationError::store("write option tree", e))
            }
        }
    }

    fn write_tree(&self, target: &ValidImport, tree: &OptionTree) -> StoreResult<TreeHandle> {
        let handle = self.store.create_tree(&NewTree {
            context: target.context.clone(),
            name: target.name.clone(),
            levels: tree.levels().iter().map(|l| l.name.clone()).collect(),
            geographic: tree.is_geographic(),
        })?;

        let mut handles: HashMap<Index, NodeHandle> = HashMap::with_capacity(tree.node_count() + 1);
        handles.insert(tree.root(), handle.root);

        for &idx in tree.creation_order() {
            let node = tree
                .get_node(idx)
                .expect("creation order only lists live nodes");
            let data = node.data.as_ref().expect("non-root nodes carry data");
            let parent = node
                .parent
                .and_then(|p| handles.get(&p).copied())
                .expect("parents are written before their children");

            let option = self
                .store
                .create_option(&data.option.name, &data.option.metadata)?;
            let node_handle = self.store.create_node(&handle, parent, data.rank, option)?;
            handles.insert(idx, node_handle);
        }

        Ok(handle)
    }
}
