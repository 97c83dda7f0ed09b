//! Physical control allocation.
//!
//! A fixed ordered pool of encoder CC ids is laid over the ordered list of
//! currently visible logical columns. The result is a plain immutable value,
//! rebuilt from scratch on every layout change and swapped in wholesale;
//! nothing ever mutates an allocation in place.

use crate::document::TrackLayout;
use crate::kinds::{ColumnKind, LogicalColumn};

/// Injective, order-preserving mapping from encoder CC id to logical column.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Allocation {
    entries: Vec<(u8, LogicalColumn)>,
}

impl Allocation {
    pub fn column_for(&self, control: u8) -> Option<LogicalColumn> {
        self.entries
            .iter()
            .find(|(c, _)| *c == control)
            .map(|(_, col)| *col)
    }

    pub fn contains(&self, control: u8) -> bool {
        self.entries.iter().any(|(c, _)| *c == control)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(u8, LogicalColumn)> + '_ {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Logical columns of the active track in fixed priority order: per note
/// column the note and instrument sub-columns always, then each optional
/// sub-column behind its visibility flag; after all note columns, one fx
/// amount per effect column.
pub fn enumerate_columns(layout: &TrackLayout) -> Vec<LogicalColumn> {
    let mut columns = Vec::new();
    for index in 0..layout.note_columns {
        columns.push(LogicalColumn::on_note_column(ColumnKind::Note, index));
        columns.push(LogicalColumn::on_note_column(ColumnKind::Instrument, index));
        if layout.volume_visible {
            columns.push(LogicalColumn::on_note_column(ColumnKind::Volume, index));
        }
        if layout.panning_visible {
            columns.push(LogicalColumn::on_note_column(ColumnKind::Panning, index));
        }
        if layout.delay_visible {
            columns.push(LogicalColumn::on_note_column(ColumnKind::Delay, index));
        }
        if layout.sample_fx_visible {
            columns.push(LogicalColumn::on_note_column(ColumnKind::FxAmount, index));
        }
    }
    for index in 0..layout.effect_columns {
        columns.push(LogicalColumn::on_effect_column(ColumnKind::FxAmount, index));
    }
    columns
}

/// Consume the pool in declared order until either side runs out. Columns
/// beyond the pool are silently unmapped; that is the paging model, not an
/// error.
pub fn build_allocation(pool: &[u8], layout: &TrackLayout) -> Allocation {
    Allocation {
        entries: pool
            .iter()
            .copied()
            .zip(enumerate_columns(layout))
            .collect(),
    }
}
