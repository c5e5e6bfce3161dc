//! Data row cleaning: reserved-column split, blank-row skipping and shape validation.

use serde::Serialize;
use tracing::{debug, trace};

use crate::domain::cell::{is_blank, normalize, Cell, Limits};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::header::{HeaderLayout, Level, ReservedColumn};

/// Values taken from reserved columns, attached to a row's terminal node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LeafMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<String>,
}

impl LeafMetadata {
    pub fn is_empty(&self) -> bool {
        self.identifier.is_none() && self.coordinates.is_none()
    }

    /// Store a populated value unless this kind already holds one.
    fn fill(&mut self, kind: ReservedColumn, raw: Option<String>) {
        let slot = match kind {
            ReservedColumn::Identifier => &mut self.identifier,
            ReservedColumn::Coordinates => &mut self.coordinates,
        };
        if slot.is_none() && !is_blank(raw.as_deref()) {
            *slot = raw.map(|v| v.trim().to_string());
        }
    }

    /// Parse coordinates of the form `"lat, lng"`.
    ///
    /// Returns `None` when absent, malformed or out of range; the raw value is kept
    /// either way.
    pub fn lat_lng(&self) -> Option<(f64, f64)> {
        let raw = self.coordinates.as_deref()?;
        let (lat, lng) = raw.split_once(',')?;
        let lat: f64 = lat.trim().parse().ok()?;
        let lng: f64 = lng.trim().parse().ok()?;
        ((-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng)).then_some((lat, lng))
    }
}

/// A cleaned data row: one cell per level plus its reserved-column values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    source_row: usize,
    cells: Vec<Cell>,
    metadata: LeafMetadata,
}

impl Row {
    pub fn new(source_row: usize, cells: Vec<Cell>, metadata: LeafMetadata) -> Self {
        Self {
            source_row,
            cells,
            metadata,
        }
    }

    /// 1-based row number in the source sheet.
    pub fn source_row(&self) -> usize {
        self.source_row
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn metadata(&self) -> &LeafMetadata {
        &self.metadata
    }

    /// Number of populated leading cells.
    pub fn depth(&self) -> usize {
        self.cells.iter().take_while(|c| c.is_some()).count()
    }

    /// True when every cell right of `col` is blank, i.e. `col` ends this row.
    pub fn ends_at(&self, col: usize) -> bool {
        self.cells[col + 1..].iter().all(Option::is_none)
    }
}

/// Result of loading a sheet: levels, reserved kinds and cleaned rows.
#[derive(Debug, Clone)]
pub struct LoadedSheet {
    pub levels: Vec<Level>,
    pub reserved: Vec<ReservedColumn>,
    pub rows: Vec<Row>,
}

impl LoadedSheet {
    /// A coordinates column makes the resulting tree geographic.
    pub fn is_geographic(&self) -> bool {
        self.reserved.contains(&ReservedColumn::Coordinates)
    }
}

/// Clean raw data rows against a resolved header layout.
///
/// `raw_rows` yields `(source_row, cells)` pairs with 1-based row numbers. Rows are
/// cut or padded to the header width, split into level cells and metadata, and
/// dropped when all level cells are blank.
///
/// # Errors
/// * [`DomainError::BlankInteriorCell`] when a populated level cell follows a blank one
/// * [`DomainError::NoRows`] when nothing is left to import
pub fn load_rows<I>(layout: &HeaderLayout, raw_rows: I, limits: &Limits) -> DomainResult<LoadedSheet>
where
    I: IntoIterator<Item = (usize, Vec<Option<String>>)>,
{
    let mut rows = Vec::new();
    for (source_row, raw) in raw_rows {
        if let Some(row) = clean_row(layout, source_row, raw, limits)? {
            rows.push(row);
        }
    }

    if rows.is_empty() {
        return Err(DomainError::NoRows);
    }
    debug!("load_rows: {} rows, {} levels", rows.len(), layout.levels.len());

    Ok(LoadedSheet {
        levels: layout.levels.clone(),
        reserved: layout.reserved_kinds(),
        rows,
    })
}

fn clean_row(
    layout: &HeaderLayout,
    source_row: usize,
    mut raw: Vec<Option<String>>,
    limits: &Limits,
) -> DomainResult<Option<Row>> {
    raw.resize(layout.width, None);

    let mut metadata = LeafMetadata::default();
    let mut level_cells = Vec::with_capacity(layout.levels.len());
    for (col, value) in raw.into_iter().enumerate() {
        match layout.reserved_at(col) {
            Some(kind) => metadata.fill(kind, value),
            None => level_cells.push(value),
        }
    }

    if level_cells.iter().all(|c| is_blank(c.as_deref())) {
        trace!("skipping blank row {}", source_row);
        return Ok(None);
    }

    let cells: Vec<Cell> = level_cells
        .iter()
        .map(|c| normalize(c.as_deref(), limits.max_option_length))
        .collect();

    if has_blank_interior_cell(&cells) {
        return Err(DomainError::BlankInteriorCell { row: source_row });
    }

    Ok(Some(Row::new(source_row, cells, metadata)))
}

/// True when a populated cell follows a blank one.
pub fn has_blank_interior_cell(cells: &[Cell]) -> bool {
    match cells.iter().position(Option::is_none) {
        Some(first_blank) => cells[first_blank..].iter().any(Option::is_some),
        None => false,
    }
}
