//! Stable ordering and deduplication of cleaned rows.
//!
//! The tree builder relies on the order produced here: every row sharing a prefix of
//! level values must be contiguous, otherwise it would split one ancestor into
//! several sibling nodes.

use std::cmp::Ordering;

use tracing::debug;

use crate::domain::rows::Row;

/// Row ordering used before tree construction.
///
/// Level cells compare lexicographically, a blank cell sorting before any populated
/// value (so a row ending at depth d precedes deeper rows with the same prefix). Ties
/// fall back to the source row number, which keeps the sort stable by construction.
pub fn compare_rows(a: &Row, b: &Row) -> Ordering {
    a.cells()
        .cmp(b.cells())
        .then_with(|| a.source_row().cmp(&b.source_row()))
}

/// Sort rows and drop exact duplicates (level cells only, metadata ignored).
///
/// The earliest occurrence of each duplicate run is kept.
pub fn sort_and_dedup(mut rows: Vec<Row>) -> Vec<Row> {
    rows.sort_by(compare_rows);

    let before = rows.len();
    rows.dedup_by(|later, kept| later.cells() == kept.cells());
    debug!(
        "sort_and_dedup: {} rows, {} duplicates removed",
        rows.len(),
        before - rows.len()
    );

    rows
}
