//! Sheet sources: in-memory matrix plus CSV and workbook loaders.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use tracing::{debug, instrument};

use crate::domain::is_blank;
use crate::infrastructure::traits::{Sheet, SheetReader};

/// A sheet held fully in memory, row-major.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatrixSheet {
    rows: Vec<Vec<Option<String>>>,
}

impl MatrixSheet {
    pub fn new(rows: Vec<Vec<Option<String>>>) -> Self {
        Self { rows }
    }

    /// Build from string literals; empty strings become blank cells.
    pub fn from_strs(rows: &[&[&str]]) -> Self {
        Self::new(
            rows.iter()
                .map(|row| {
                    row.iter()
                        .map(|c| (!c.is_empty()).then(|| c.to_string()))
                        .collect()
                })
                .collect(),
        )
    }
}

impl Sheet for MatrixSheet {
    fn last_row(&self) -> usize {
        self.rows
            .iter()
            .rposition(|row| row.iter().any(|c| !is_blank(c.as_deref())))
            .map_or(0, |idx| idx + 1)
    }

    fn row(&self, index: usize) -> Vec<Option<String>> {
        index
            .checked_sub(1)
            .and_then(|i| self.rows.get(i))
            .cloned()
            .unwrap_or_default()
    }
}

/// Supported source formats, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    Csv,
    Workbook,
}

impl SheetFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(SheetFormat::Csv),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(SheetFormat::Workbook),
            _ => None,
        }
    }
}

/// Reads sheets from disk; CSV via `csv`, spreadsheets via `calamine` (first sheet).
#[derive(Debug, Default)]
pub struct FileSheetReader;

impl SheetReader for FileSheetReader {
    #[instrument(level = "debug", skip(self))]
    fn open(&self, path: &Path) -> io::Result<Box<dyn Sheet>> {
        let sheet = match SheetFormat::from_path(path) {
            Some(SheetFormat::Csv) => read_csv(path)?,
            Some(SheetFormat::Workbook) => read_workbook(path)?,
            None => {
                return Err(io::Error::new(
                    io::ErrorKind::Unsupported,
                    format!("unsupported sheet format: {}", path.display()),
                ))
            }
        };
        debug!("open: {} rows", sheet.last_row());
        Ok(Box::new(sheet))
    }
}

fn read_csv(path: &Path) -> io::Result<MatrixSheet> {
    let file = File::open(path)?;
    let mut reader = csv::ReaderBuilder::new()
        // The header row is part of the data; the loader resolves it.
        .has_headers(false)
        .flexible(true)
        .from_reader(BufReader::new(file));

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(io::Error::from)?;
        rows.push(
            record
                .iter()
                .map(|field| (!field.is_empty()).then(|| field.to_string()))
                .collect(),
        );
    }
    Ok(MatrixSheet::new(rows))
}

fn read_workbook(path: &Path) -> io::Result<MatrixSheet> {
    let invalid = |msg: String| io::Error::new(io::ErrorKind::InvalidData, msg);

    let mut workbook = open_workbook_auto(path).map_err(|e| invalid(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| invalid(format!("workbook has no sheets: {}", path.display())))?
        .map_err(|e| invalid(e.to_string()))?;

    // Ranges start at the first used cell; pad so row/column numbers stay absolute.
    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    let mut rows: Vec<Vec<Option<String>>> = vec![Vec::new(); start_row as usize];
    for data_row in range.rows() {
        let mut cells = vec![None; start_col as usize];
        cells.extend(data_row.iter().map(cell_text));
        rows.push(cells);
    }
    Ok(MatrixSheet::new(rows))
}

/// Text of a workbook cell. Whole floats print without a fraction so numeric
/// identifiers read back as typed.
fn cell_text(value: &Data) -> Option<String> {
    match value {
        Data::Empty => None,
        Data::String(s) => Some(s.clone()),
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => Some(format!("{}", *f as i64)),
        other => Some(other.to_string()),
    }
}
