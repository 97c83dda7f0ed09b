//! Interface to the host composition document.
//!
//! The mapper never owns the song; it reads and writes cells through this
//! trait and reacts to change notifications the host delivers as plain
//! values. Absence is modeled as absence: a column that does not exist at a
//! row reads as `None` and refuses writes, it never errors.

use serde::{Deserialize, Serialize};

use crate::kinds::LogicalColumn;

/// Column visibility flags and counts for the active track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackLayout {
    pub note_columns: usize,
    pub effect_columns: usize,
    pub volume_visible: bool,
    pub panning_visible: bool,
    pub delay_visible: bool,
    /// The sample-fx amount/number pair inside note columns.
    pub sample_fx_visible: bool,
}

/// Current edit position. Rows are 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    pub row: usize,
    pub pattern: usize,
    pub track: usize,
}

/// Change notifications the host feeds into the event loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocChange {
    /// Column visibility or counts changed; the allocation must be rebuilt.
    Layout,
    /// Row, pattern or track selection moved; feedback must be refreshed.
    Selection,
}

/// Accessor for the host document. All row indices are 0-based.
pub trait SongDocument {
    fn layout(&self) -> TrackLayout;

    fn cursor(&self) -> Cursor;

    /// Number of rows in the current pattern.
    fn row_count(&self) -> usize;

    /// Raw cell value at `row`, or `None` when the column does not exist
    /// there (hidden, or the row has fewer columns).
    fn read_cell(&self, row: usize, column: LogicalColumn) -> Option<i32>;

    /// Write a raw cell value. Returns false when the target row or column
    /// does not exist; never panics.
    fn write_cell(&mut self, row: usize, column: LogicalColumn, value: i32) -> bool;
}
