//! The mapper core.
//!
//! One `Mapper` owns the current allocation and the per-control repeat
//! states, and is driven from exactly three entry points: an inbound raw MIDI
//! message, a document change notification, and the periodic tick. Each entry
//! point finishes its work (including feedback sends) before returning, so
//! the next event always sees consistent state.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::allocator::{build_allocation, Allocation};
use crate::debounce::{DebounceState, Direction};
use crate::document::{DocChange, SongDocument};
use crate::feedback::{self, Feedback};
use crate::kinds::{ColumnKind, LogicalColumn};
use crate::message::CcMessage;
use crate::profile::Profile;
use crate::resolve;
use crate::transport::FeedbackSink;

pub struct Mapper {
    profile: Profile,
    allocation: Allocation,
    debounce: HashMap<u8, DebounceState>,
}

fn push(sink: &mut dyn FeedbackSink, fb: Feedback) {
    sink.send(fb.value.to_bytes());
    sink.send(fb.color.to_bytes());
}

impl Mapper {
    pub fn new(profile: Profile) -> Self {
        Mapper {
            profile,
            allocation: Allocation::default(),
            debounce: HashMap::new(),
        }
    }

    pub fn allocation(&self) -> &Allocation {
        &self.allocation
    }

    /// Initial sync: build the first allocation and push the full state so
    /// the rings reflect the document before any event arrives.
    pub fn attach(&mut self, doc: &dyn SongDocument, sink: &mut dyn FeedbackSink) {
        self.rebuild(doc, sink);
        self.refresh(doc, sink);
    }

    /// Route one host notification.
    pub fn on_change(
        &mut self,
        change: DocChange,
        doc: &dyn SongDocument,
        sink: &mut dyn FeedbackSink,
    ) {
        match change {
            DocChange::Layout => {
                self.rebuild(doc, sink);
                self.refresh(doc, sink);
            }
            DocChange::Selection => self.refresh(doc, sink),
        }
    }

    /// Recompute the allocation from the current layout. Controls that drop
    /// out get one reset pair (value 0, ring off) before they are forgotten,
    /// along with their repeat state. Idempotent for unchanged layouts.
    pub fn rebuild(&mut self, doc: &dyn SongDocument, sink: &mut dyn FeedbackSink) {
        let next = build_allocation(&self.profile.encoder_ccs, &doc.layout());
        for (control, _) in self.allocation.iter() {
            if !next.contains(*control) {
                push(sink, feedback::reset(*control, &self.profile));
                debug!("Encoder CC {} unmapped, ring cleared", control);
            }
        }

        let threshold = self.profile.repeat_threshold;
        self.debounce.retain(|control, _| next.contains(*control));
        for (control, _) in next.iter() {
            self.debounce
                .entry(*control)
                .or_insert_with(|| DebounceState::new(threshold));
        }

        if next != self.allocation {
            info!("Allocation rebuilt: {} encoders mapped", next.len());
        }
        self.allocation = next;
    }

    /// Push value + color for every mapped encoder. Entries whose column no
    /// longer exists are skipped; the pending layout notification will
    /// rebuild them away.
    pub fn refresh(&self, doc: &dyn SongDocument, sink: &mut dyn FeedbackSink) {
        let layout = doc.layout();
        if doc.cursor().row >= doc.row_count() {
            return;
        }
        for (control, column) in self.allocation.iter() {
            if !column.exists_in(&layout) {
                continue;
            }
            push(sink, feedback::encode(doc, *column, *control, &self.profile));
        }
    }

    /// Entry point for one raw inbound message.
    pub fn handle_raw(
        &mut self,
        doc: &mut dyn SongDocument,
        sink: &mut dyn FeedbackSink,
        data: &[u8],
    ) {
        let Some(msg) = CcMessage::parse(data) else {
            return;
        };
        let Some(state) = self.debounce.get_mut(&msg.control) else {
            return; // not an allocated encoder
        };
        let commit = state.feed(&msg, self.profile.repeat_threshold);
        if !commit || msg.channel != self.profile.control_channel {
            return;
        }
        let Some(column) = self.allocation.column_for(msg.control) else {
            return;
        };
        let direction = if msg.value == self.profile.increase_marker {
            Direction::Up
        } else if msg.value == self.profile.decrease_marker {
            Direction::Down
        } else {
            return; // confirmed commit without a direction marker: consumed
        };

        if let Some(value) = self.apply(doc, column, direction) {
            debug!(
                "Encoder CC {} -> {:?} {:?} = {}",
                msg.control, column.kind, direction, value
            );
            push(sink, feedback::encode(doc, column, msg.control, &self.profile));
        }
    }

    /// Resolve, step with full wraparound, write back, run linked writes.
    /// Returns `None` (and touches nothing) when the current row or the
    /// addressed column has vanished under the cursor.
    fn apply(
        &self,
        doc: &mut dyn SongDocument,
        column: LogicalColumn,
        direction: Direction,
    ) -> Option<i32> {
        let row = doc.cursor().row;
        if row >= doc.row_count() || !column.exists_in(&doc.layout()) {
            return None;
        }
        let spec = column.kind.spec();
        let current = resolve::resolve(doc, column, row);
        let next = match direction {
            Direction::Up => {
                if current >= spec.max {
                    spec.min
                } else {
                    current + 1
                }
            }
            Direction::Down => {
                if current <= spec.min {
                    spec.max
                } else {
                    current - 1
                }
            }
        };
        if !doc.write_cell(row, column, next) {
            return None;
        }
        if column.kind == ColumnKind::FxAmount && next != spec.empty {
            self.inherit_fx_number(doc, column, row);
        }
        Some(next)
    }

    /// An amount without an operator is musically dangling: when the paired
    /// fx-number on this row is empty, copy forward the nearest explicit one
    /// from history. No ancestor means the number stays empty.
    fn inherit_fx_number(&self, doc: &mut dyn SongDocument, amount: LogicalColumn, row: usize) {
        let number = amount.paired_number();
        if doc.read_cell(row, number) != Some(number.kind.spec().empty) {
            return; // already written, or no number column here
        }
        if let Some(value) = resolve::nearest_explicit(doc, number, row) {
            doc.write_cell(row, number, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debounce::{DATA_PRESS, DATA_RELEASE};
    use crate::document::TrackLayout;
    use crate::feedback::RING_OFF;
    use crate::pattern::PatternDocument;
    use crate::transport::MemorySink;

    fn create_test_profile(pool: Vec<u8>, threshold: u32) -> Profile {
        Profile {
            encoder_ccs: pool,
            repeat_threshold: threshold,
            ..Profile::default()
        }
    }

    fn create_test_doc(layout: TrackLayout) -> PatternDocument {
        PatternDocument::new(layout, 16)
    }

    fn full_layout() -> TrackLayout {
        TrackLayout {
            note_columns: 1,
            effect_columns: 1,
            volume_visible: true,
            panning_visible: true,
            delay_visible: false,
            sample_fx_visible: false,
        }
    }

    fn cc(channel: u8, control: u8, value: u8) -> Vec<u8> {
        CcMessage::new(channel, control, value).to_bytes().to_vec()
    }

    #[test]
    fn test_increment_and_decrement_wrap_at_the_bounds() {
        let mut doc = create_test_doc(full_layout());
        let mapper = Mapper::new(create_test_profile(vec![1], 1));
        let vol = LogicalColumn::on_note_column(ColumnKind::Volume, 0);

        doc.write_cell(0, vol, 127);
        assert_eq!(mapper.apply(&mut doc, vol, Direction::Up), Some(0));
        assert_eq!(mapper.apply(&mut doc, vol, Direction::Down), Some(127));
        doc.write_cell(0, vol, 64);
        assert_eq!(mapper.apply(&mut doc, vol, Direction::Up), Some(65));
        assert_eq!(mapper.apply(&mut doc, vol, Direction::Down), Some(64));
    }

    #[test]
    fn test_editing_an_inherited_cell_starts_from_the_inherited_value() {
        let mut doc = create_test_doc(full_layout());
        let mapper = Mapper::new(create_test_profile(vec![1], 1));
        let vol = LogicalColumn::on_note_column(ColumnKind::Volume, 0);

        doc.write_cell(2, vol, 80);
        doc.set_row(10);
        assert_eq!(mapper.apply(&mut doc, vol, Direction::Up), Some(81));
        // the edit landed on the current row, not the ancestor
        assert_eq!(doc.read_cell(10, vol), Some(81));
        assert_eq!(doc.read_cell(2, vol), Some(80));
    }

    #[test]
    fn test_apply_is_a_silent_noop_when_the_column_vanished() {
        let mut doc = create_test_doc(full_layout());
        let mut sink = MemorySink::default();
        let mut mapper = Mapper::new(create_test_profile(vec![1, 2, 3, 4], 1));
        mapper.attach(&doc, &mut sink);

        // volume disappears without a rebuild, as after a mid-flight toggle
        doc.set_layout(TrackLayout {
            volume_visible: false,
            ..full_layout()
        });
        sink.sent.clear();
        let vol_control = 3; // note, instrument, volume in pool order
        mapper.handle_raw(&mut doc, &mut sink, &cc(1, vol_control, 65));
        let vol = LogicalColumn::on_note_column(ColumnKind::Volume, 0);
        assert_eq!(
            doc.read_cell(0, vol),
            Some(ColumnKind::Volume.spec().empty)
        );
        assert!(sink.sent.is_empty()); // no feedback for a no-op
    }

    #[test]
    fn test_threshold_messages_produce_exactly_one_edit() {
        let mut doc = create_test_doc(full_layout());
        let mut sink = MemorySink::default();
        let mut mapper = Mapper::new(create_test_profile(vec![7], 3));
        mapper.attach(&doc, &mut sink);
        sink.sent.clear();

        let note = LogicalColumn::on_note_column(ColumnKind::Note, 0);
        mapper.handle_raw(&mut doc, &mut sink, &cc(1, 7, 65));
        mapper.handle_raw(&mut doc, &mut sink, &cc(1, 7, 65));
        assert_eq!(doc.read_cell(0, note), Some(ColumnKind::Note.spec().empty));
        assert!(sink.sent.is_empty());

        mapper.handle_raw(&mut doc, &mut sink, &cc(1, 7, 65));
        assert_eq!(doc.read_cell(0, note), Some(49)); // default 48 + 1
        assert_eq!(sink.sent.len(), 2); // one value + one color message
    }

    #[test]
    fn test_wrong_channel_counts_but_never_commits() {
        let mut doc = create_test_doc(full_layout());
        let mut sink = MemorySink::default();
        let mut mapper = Mapper::new(create_test_profile(vec![7], 2));
        mapper.attach(&doc, &mut sink);

        let note = LogicalColumn::on_note_column(ColumnKind::Note, 0);
        for _ in 0..8 {
            mapper.handle_raw(&mut doc, &mut sink, &cc(5, 7, 65));
        }
        assert_eq!(doc.read_cell(0, note), Some(ColumnKind::Note.spec().empty));
    }

    #[test]
    fn test_unmapped_controls_are_ignored() {
        let mut doc = create_test_doc(full_layout());
        let mut sink = MemorySink::default();
        let mut mapper = Mapper::new(create_test_profile(vec![7], 1));
        mapper.attach(&doc, &mut sink);
        sink.sent.clear();

        mapper.handle_raw(&mut doc, &mut sink, &cc(1, 99, 65));
        assert!(sink.sent.is_empty());
    }

    #[test]
    fn test_held_encoder_edits_on_every_message() {
        let mut doc = create_test_doc(full_layout());
        let mut sink = MemorySink::default();
        let mut mapper = Mapper::new(create_test_profile(vec![7], 4));
        mapper.attach(&doc, &mut sink);

        let note = LogicalColumn::on_note_column(ColumnKind::Note, 0);
        // press framing alone never edits
        for _ in 0..6 {
            mapper.handle_raw(&mut doc, &mut sink, &cc(1, 7, DATA_PRESS));
        }
        assert_eq!(doc.read_cell(0, note), Some(ColumnKind::Note.spec().empty));

        mapper.handle_raw(&mut doc, &mut sink, &cc(1, 7, 65));
        mapper.handle_raw(&mut doc, &mut sink, &cc(1, 7, 65));
        assert_eq!(doc.read_cell(0, note), Some(50));

        // release restores the configured pacing
        mapper.handle_raw(&mut doc, &mut sink, &cc(1, 7, DATA_RELEASE));
        mapper.handle_raw(&mut doc, &mut sink, &cc(1, 7, 65));
        assert_eq!(doc.read_cell(0, note), Some(50));
    }

    #[test]
    fn test_fx_amount_edit_inherits_the_nearest_fx_number() {
        let mut doc = create_test_doc(full_layout());
        let mapper = Mapper::new(create_test_profile(vec![1], 1));
        let amount = LogicalColumn::on_effect_column(ColumnKind::FxAmount, 0);
        let number = LogicalColumn::on_effect_column(ColumnKind::FxNumber, 0);

        doc.write_cell(1, number, 3);
        doc.set_row(6);
        assert_eq!(mapper.apply(&mut doc, amount, Direction::Up), Some(1));
        assert_eq!(doc.read_cell(6, number), Some(3));
    }

    #[test]
    fn test_fx_number_stays_empty_without_an_ancestor() {
        let mut doc = create_test_doc(full_layout());
        let mapper = Mapper::new(create_test_profile(vec![1], 1));
        let amount = LogicalColumn::on_effect_column(ColumnKind::FxAmount, 0);
        let number = LogicalColumn::on_effect_column(ColumnKind::FxNumber, 0);

        doc.set_row(6);
        assert_eq!(mapper.apply(&mut doc, amount, Direction::Up), Some(1));
        assert_eq!(doc.read_cell(6, number), Some(0));
    }

    #[test]
    fn test_an_explicit_fx_number_is_left_alone() {
        let mut doc = create_test_doc(full_layout());
        let mapper = Mapper::new(create_test_profile(vec![1], 1));
        let amount = LogicalColumn::on_effect_column(ColumnKind::FxAmount, 0);
        let number = LogicalColumn::on_effect_column(ColumnKind::FxNumber, 0);

        doc.write_cell(1, number, 3);
        doc.write_cell(6, number, 9);
        doc.set_row(6);
        mapper.apply(&mut doc, amount, Direction::Up);
        assert_eq!(doc.read_cell(6, number), Some(9));
    }

    #[test]
    fn test_a_dropped_control_is_reset_exactly_once() {
        let mut doc = create_test_doc(full_layout());
        let mut sink = MemorySink::default();
        let mut mapper = Mapper::new(create_test_profile(vec![1, 2, 3, 4], 3));
        mapper.attach(&doc, &mut sink);
        assert_eq!(mapper.allocation().len(), 4);

        // dropping panning and the effect column leaves three logical
        // columns, so exactly the last pooled encoder goes dark
        doc.set_layout(TrackLayout {
            panning_visible: false,
            effect_columns: 0,
            ..full_layout()
        });
        sink.sent.clear();
        mapper.rebuild(&doc, &mut sink);

        let profile = create_test_profile(vec![], 3);
        let off = feedback::reset(4, &profile);
        let resets: Vec<_> = sink
            .sent
            .iter()
            .filter(|m| **m == off.value.to_bytes() || **m == off.color.to_bytes())
            .collect();
        assert_eq!(resets.len(), 2); // one value-0 and one ring-off message

        // a second rebuild with the same layout sends nothing further
        sink.sent.clear();
        mapper.rebuild(&doc, &mut sink);
        assert!(sink.sent.is_empty());
    }

    #[test]
    fn test_rebuild_is_idempotent_for_unchanged_layouts() {
        let doc = create_test_doc(full_layout());
        let mut sink = MemorySink::default();
        let mut mapper = Mapper::new(create_test_profile(vec![1, 2, 3], 3));
        mapper.rebuild(&doc, &mut sink);
        let first = mapper.allocation().clone();
        mapper.rebuild(&doc, &mut sink);
        assert_eq!(*mapper.allocation(), first);
    }

    #[test]
    fn test_pool_exhaustion_leaves_visible_columns_unmapped() {
        // pool [12, 13] over note + instrument + visible volume
        let layout = TrackLayout {
            note_columns: 1,
            effect_columns: 0,
            volume_visible: true,
            ..TrackLayout::default()
        };
        let doc = create_test_doc(layout);
        let mut sink = MemorySink::default();
        let mut mapper = Mapper::new(create_test_profile(vec![12, 13], 3));
        mapper.attach(&doc, &mut sink);

        assert_eq!(
            mapper.allocation().column_for(12),
            Some(LogicalColumn::on_note_column(ColumnKind::Note, 0))
        );
        assert_eq!(
            mapper.allocation().column_for(13),
            Some(LogicalColumn::on_note_column(ColumnKind::Instrument, 0))
        );
        assert!(!mapper
            .allocation()
            .iter()
            .any(|(_, col)| col.kind == ColumnKind::Volume));
    }

    #[test]
    fn test_selection_change_refreshes_and_layout_change_rebuilds() {
        let mut doc = create_test_doc(full_layout());
        let mut sink = MemorySink::default();
        let mut mapper = Mapper::new(create_test_profile(vec![1, 2, 3, 4, 5], 3));
        mapper.attach(&doc, &mut sink);
        let mapped = mapper.allocation().len();

        sink.sent.clear();
        mapper.on_change(DocChange::Selection, &doc, &mut sink);
        assert_eq!(sink.sent.len(), mapped * 2);

        doc.set_layout(TrackLayout {
            panning_visible: false,
            ..full_layout()
        });
        sink.sent.clear();
        mapper.on_change(DocChange::Layout, &doc, &mut sink);
        assert!(mapper.allocation().len() < mapped);

        let reset_off = sink
            .sent
            .iter()
            .filter(|m| m[1] == 5 && m[2] == RING_OFF)
            .count();
        assert!(reset_off >= 1);
    }

    #[test]
    fn test_refresh_skips_when_the_cursor_row_is_gone() {
        let mut doc = create_test_doc(full_layout());
        let mut sink = MemorySink::default();
        let mut mapper = Mapper::new(create_test_profile(vec![1, 2], 3));
        mapper.attach(&doc, &mut sink);

        doc.set_row(99);
        sink.sent.clear();
        mapper.refresh(&doc, &mut sink);
        assert!(sink.sent.is_empty());
    }
}
