//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Fatal input errors raised while loading a sheet.
/// Any of these aborts the whole import; nothing is built or committed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("blank interior cell at row {row}")]
    BlankInteriorCell { row: usize },

    #[error("no rows to import")]
    NoRows,
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
