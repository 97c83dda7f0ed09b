//! Column kinds and their value descriptors.
//!
//! Every editable cell in the pattern belongs to one of a closed set of
//! kinds. Each kind carries the numeric range of its values, the sentinel the
//! document stores for "nothing written here", and the value a fully empty
//! history falls back to. Keeping the set closed means an unhandled kind is a
//! compile error, not a silent fallthrough.

use crate::document::TrackLayout;

/// The closed set of editable column kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Note,
    Instrument,
    Volume,
    Panning,
    Delay,
    FxAmount,
    FxNumber,
}

/// Which sub-grid of the track a column lives in. Fx amount/number exist in
/// both: as the sample-fx pair inside a note column and as the pair on a
/// dedicated effect column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lane {
    NoteColumn,
    EffectColumn,
}

/// Uniform value descriptor for one column kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindSpec {
    /// Inclusive lower bound of writable values.
    pub min: i32,
    /// Inclusive upper bound of writable values.
    pub max: i32,
    /// Raw value the document stores for an empty cell.
    pub empty: i32,
    /// Effective value when no row in history carries an explicit one.
    pub default: i32,
}

/// Color grouping used by the feedback encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorClass {
    /// Note and instrument cells.
    NoteFamily,
    /// Volume, panning, delay.
    Param,
    /// Fx amount and fx number, on either lane.
    Effect,
}

impl ColumnKind {
    pub const fn spec(self) -> KindSpec {
        match self {
            // 48 = C-4, the conventional center of the note range
            ColumnKind::Note => KindSpec {
                min: 0,
                max: 119,
                empty: 121,
                default: 48,
            },
            ColumnKind::Instrument => KindSpec {
                min: 0,
                max: 254,
                empty: 255,
                default: 0,
            },
            ColumnKind::Volume => KindSpec {
                min: 0,
                max: 127,
                empty: 255,
                default: 127,
            },
            ColumnKind::Panning => KindSpec {
                min: 0,
                max: 127,
                empty: 255,
                default: 64,
            },
            // zero doubles as the sentinel for the fx-side kinds, so wrapping
            // past max lands on an erased cell
            ColumnKind::Delay => KindSpec {
                min: 0,
                max: 255,
                empty: 0,
                default: 0,
            },
            ColumnKind::FxAmount => KindSpec {
                min: 0,
                max: 255,
                empty: 0,
                default: 0,
            },
            ColumnKind::FxNumber => KindSpec {
                min: 0,
                max: 35,
                empty: 0,
                default: 0,
            },
        }
    }

    pub const fn color_class(self) -> ColorClass {
        match self {
            ColumnKind::Note | ColumnKind::Instrument => ColorClass::NoteFamily,
            ColumnKind::Volume | ColumnKind::Panning | ColumnKind::Delay => ColorClass::Param,
            ColumnKind::FxAmount | ColumnKind::FxNumber => ColorClass::Effect,
        }
    }
}

/// Address of one editable column within the active track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LogicalColumn {
    pub kind: ColumnKind,
    pub lane: Lane,
    /// Note-column index or effect-column index, depending on `lane`.
    pub index: usize,
}

impl LogicalColumn {
    pub fn on_note_column(kind: ColumnKind, index: usize) -> Self {
        LogicalColumn {
            kind,
            lane: Lane::NoteColumn,
            index,
        }
    }

    pub fn on_effect_column(kind: ColumnKind, index: usize) -> Self {
        LogicalColumn {
            kind,
            lane: Lane::EffectColumn,
            index,
        }
    }

    /// The fx-number column paired with this fx-amount column (same lane and
    /// index). Only meaningful for `FxAmount`.
    pub fn paired_number(&self) -> LogicalColumn {
        LogicalColumn {
            kind: ColumnKind::FxNumber,
            lane: self.lane,
            index: self.index,
        }
    }

    /// Whether this column currently exists under the given layout. Hidden
    /// sub-columns and out-of-range indices simply do not exist.
    pub fn exists_in(&self, layout: &TrackLayout) -> bool {
        match self.lane {
            Lane::NoteColumn => {
                if self.index >= layout.note_columns {
                    return false;
                }
                match self.kind {
                    ColumnKind::Note | ColumnKind::Instrument => true,
                    ColumnKind::Volume => layout.volume_visible,
                    ColumnKind::Panning => layout.panning_visible,
                    ColumnKind::Delay => layout.delay_visible,
                    ColumnKind::FxAmount | ColumnKind::FxNumber => layout.sample_fx_visible,
                }
            }
            Lane::EffectColumn => {
                self.index < layout.effect_columns
                    && matches!(self.kind, ColumnKind::FxAmount | ColumnKind::FxNumber)
            }
        }
    }
}
