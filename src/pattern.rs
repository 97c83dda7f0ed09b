//! In-memory pattern document.
//!
//! A complete `SongDocument` used as the stand-in host by the bridge binary
//! and as the fixture in tests. Cells start at their kind's sentinel, rows may
//! carry different column counts (older rows in real songs often do), and the
//! whole pattern can be loaded from JSON.

use serde::{Deserialize, Serialize};

use crate::document::{Cursor, SongDocument, TrackLayout};
use crate::kinds::{ColumnKind, Lane, LogicalColumn};

/// One note column cell bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteCell {
    pub note: i32,
    pub instrument: i32,
    pub volume: i32,
    pub panning: i32,
    pub delay: i32,
    pub fx_number: i32,
    pub fx_amount: i32,
}

impl Default for NoteCell {
    fn default() -> Self {
        NoteCell {
            note: ColumnKind::Note.spec().empty,
            instrument: ColumnKind::Instrument.spec().empty,
            volume: ColumnKind::Volume.spec().empty,
            panning: ColumnKind::Panning.spec().empty,
            delay: ColumnKind::Delay.spec().empty,
            fx_number: ColumnKind::FxNumber.spec().empty,
            fx_amount: ColumnKind::FxAmount.spec().empty,
        }
    }
}

impl NoteCell {
    fn get(&self, kind: ColumnKind) -> i32 {
        match kind {
            ColumnKind::Note => self.note,
            ColumnKind::Instrument => self.instrument,
            ColumnKind::Volume => self.volume,
            ColumnKind::Panning => self.panning,
            ColumnKind::Delay => self.delay,
            ColumnKind::FxNumber => self.fx_number,
            ColumnKind::FxAmount => self.fx_amount,
        }
    }

    fn set(&mut self, kind: ColumnKind, value: i32) {
        match kind {
            ColumnKind::Note => self.note = value,
            ColumnKind::Instrument => self.instrument = value,
            ColumnKind::Volume => self.volume = value,
            ColumnKind::Panning => self.panning = value,
            ColumnKind::Delay => self.delay = value,
            ColumnKind::FxNumber => self.fx_number = value,
            ColumnKind::FxAmount => self.fx_amount = value,
        }
    }
}

/// One effect column cell pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectCell {
    pub number: i32,
    pub amount: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternRow {
    pub note_cells: Vec<NoteCell>,
    pub effect_cells: Vec<EffectCell>,
}

impl PatternRow {
    fn sized(note_columns: usize, effect_columns: usize) -> Self {
        PatternRow {
            note_cells: vec![NoteCell::default(); note_columns],
            effect_cells: vec![EffectCell::default(); effect_columns],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternDocument {
    #[serde(default)]
    layout: TrackLayout,
    #[serde(skip)]
    cursor: Cursor,
    #[serde(default)]
    rows: Vec<PatternRow>,
}

impl PatternDocument {
    /// A pattern with `rows` uniformly sized rows.
    pub fn new(layout: TrackLayout, rows: usize) -> Self {
        PatternDocument {
            layout,
            cursor: Cursor::default(),
            rows: (0..rows)
                .map(|_| PatternRow::sized(layout.note_columns, layout.effect_columns))
                .collect(),
        }
    }

    pub fn from_json(json_str: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json_str)
    }

    /// Append a row with its own column counts. Rows narrower than the layout
    /// model history that predates a column being added.
    pub fn push_row_with(&mut self, note_columns: usize, effect_columns: usize) {
        self.rows.push(PatternRow::sized(note_columns, effect_columns));
    }

    pub fn set_row(&mut self, row: usize) {
        self.cursor.row = row;
    }

    pub fn set_cursor(&mut self, cursor: Cursor) {
        self.cursor = cursor;
    }

    pub fn set_layout(&mut self, layout: TrackLayout) {
        self.layout = layout;
    }
}

impl SongDocument for PatternDocument {
    fn layout(&self) -> TrackLayout {
        self.layout
    }

    fn cursor(&self) -> Cursor {
        self.cursor
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn read_cell(&self, row: usize, column: LogicalColumn) -> Option<i32> {
        let row = self.rows.get(row)?;
        match column.lane {
            Lane::NoteColumn => row.note_cells.get(column.index).map(|c| c.get(column.kind)),
            Lane::EffectColumn => {
                let cell = row.effect_cells.get(column.index)?;
                match column.kind {
                    ColumnKind::FxNumber => Some(cell.number),
                    ColumnKind::FxAmount => Some(cell.amount),
                    _ => None,
                }
            }
        }
    }

    fn write_cell(&mut self, row: usize, column: LogicalColumn, value: i32) -> bool {
        let Some(row) = self.rows.get_mut(row) else {
            return false;
        };
        match column.lane {
            Lane::NoteColumn => match row.note_cells.get_mut(column.index) {
                Some(cell) => {
                    cell.set(column.kind, value);
                    true
                }
                None => false,
            },
            Lane::EffectColumn => match row.effect_cells.get_mut(column.index) {
                Some(cell) => match column.kind {
                    ColumnKind::FxNumber => {
                        cell.number = value;
                        true
                    }
                    ColumnKind::FxAmount => {
                        cell.amount = value;
                        true
                    }
                    _ => false,
                },
                None => false,
            },
        }
    }
}
