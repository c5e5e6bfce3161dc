//! Header row resolution: level names and reserved columns.

use std::fmt;

use serde::Serialize;
use tracing::warn;

use crate::domain::cell::{is_blank, normalize, Limits};

/// Columns carrying leaf metadata instead of a tree level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservedColumn {
    Identifier,
    Coordinates,
}

impl ReservedColumn {
    pub const ALL: [ReservedColumn; 2] = [ReservedColumn::Identifier, ReservedColumn::Coordinates];

    /// Exact header text that marks this column.
    pub fn header(self) -> &'static str {
        match self {
            ReservedColumn::Identifier => "Id",
            ReservedColumn::Coordinates => "Coordinates",
        }
    }

    /// Match a raw header cell. Case and whitespace must match exactly.
    pub fn from_header(header: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.header() == header)
    }
}

impl fmt::Display for ReservedColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

/// One depth of the tree, named by its header cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Level {
    pub name: String,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Column layout derived from the first row of a sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderLayout {
    /// Tree levels in column order, reserved columns removed.
    pub levels: Vec<Level>,
    /// Reserved columns keyed by their original column index, ascending.
    pub reserved: Vec<(usize, ReservedColumn)>,
    /// Number of columns read from every data row (levels plus reserved).
    pub width: usize,
}

impl HeaderLayout {
    /// Resolve the header row.
    ///
    /// The header list ends at the first blank cell; anything to the right of it is
    /// ignored for every row. Cells exactly matching a reserved name become reserved
    /// columns, all others become levels with names cut to the level limit.
    pub fn resolve(first_row: &[Option<String>], limits: &Limits) -> Self {
        let width = first_row
            .iter()
            .position(|h| is_blank(h.as_deref()))
            .unwrap_or(first_row.len());

        let mut levels = Vec::with_capacity(width);
        let mut reserved = Vec::new();

        for (col, header) in first_row[..width].iter().enumerate() {
            let raw = header.as_deref().unwrap_or_default();
            if let Some(kind) = ReservedColumn::from_header(raw) {
                if reserved.iter().any(|(_, k)| *k == kind) {
                    warn!("duplicate '{}' column {}: leftmost populated value wins", kind, col + 1);
                }
                reserved.push((col, kind));
            } else if let Some(name) = normalize(Some(raw), limits.max_level_length) {
                levels.push(Level { name });
            }
        }

        Self {
            levels,
            reserved,
            width,
        }
    }

    /// Reserved kind at an original column index, if any.
    pub fn reserved_at(&self, col: usize) -> Option<ReservedColumn> {
        self.reserved
            .iter()
            .find(|(idx, _)| *idx == col)
            .map(|(_, kind)| *kind)
    }

    /// Distinct reserved kinds present, in column order.
    pub fn reserved_kinds(&self) -> Vec<ReservedColumn> {
        let mut kinds: Vec<ReservedColumn> = Vec::new();
        for (_, kind) in &self.reserved {
            if !kinds.contains(kind) {
                kinds.push(*kind);
            }
        }
        kinds
    }

    pub fn has(&self, kind: ReservedColumn) -> bool {
        self.reserved.iter().any(|(_, k)| *k == kind)
    }
}
