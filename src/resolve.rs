//! Backward value resolution.
//!
//! A cell with no explicit value inherits from the nearest non-empty row
//! above it. This one walk serves feedback, editing and linked writes alike;
//! the scan is unbounded back to the first row, which is fine for pattern
//! lengths.

use crate::document::SongDocument;
use crate::kinds::LogicalColumn;

/// Nearest explicit (non-sentinel) value at or above `row`, or `None` when
/// the whole history is empty. Rows where the column does not exist count as
/// empty and the scan keeps going.
pub fn nearest_explicit(doc: &dyn SongDocument, column: LogicalColumn, row: usize) -> Option<i32> {
    let empty = column.kind.spec().empty;
    for r in (0..=row).rev() {
        if let Some(value) = doc.read_cell(r, column) {
            if value != empty {
                return Some(value);
            }
        }
    }
    None
}

/// Effective value at `row`: the raw value if explicitly written, else the
/// nearest explicit ancestor, else the kind's fallback default.
pub fn resolve(doc: &dyn SongDocument, column: LogicalColumn, row: usize) -> i32 {
    nearest_explicit(doc, column, row).unwrap_or(column.kind.spec().default)
}

/// Whether the current row itself carries an explicit value. Inherited values
/// do not count; this is what feedback coloring keys on.
pub fn explicit_at(doc: &dyn SongDocument, column: LogicalColumn, row: usize) -> bool {
    match doc.read_cell(row, column) {
        Some(value) => value != column.kind.spec().empty,
        None => false,
    }
}
