//! LED ring feedback encoding.
//!
//! Each allocated encoder gets two outgoing CC messages: the resolved value
//! on the value channel and a palette entry on the color channel, both under
//! the encoder's own CC id. A receiver can therefore split ring brightness
//! from state color without parsing anything.

use crate::document::SongDocument;
use crate::kinds::{ColorClass, LogicalColumn};
use crate::message::CcMessage;
use crate::profile::Profile;
use crate::resolve;

// Ring palette indices
pub const RING_OFF: u8 = 0;
pub const RING_GREEN: u8 = 1; // note family, value written
pub const RING_GREEN_DIM: u8 = 2; // note family, nothing on this row
pub const RING_RED: u8 = 3; // effect, value written
pub const RING_RED_DIM: u8 = 6; // effect, nothing on this row
pub const RING_ORANGE: u8 = 5; // parameter, value written
pub const RING_ORANGE_DIM: u8 = 4; // parameter, nothing on this row

/// Value + color message pair for one encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Feedback {
    pub value: CcMessage,
    pub color: CcMessage,
}

/// Palette entry for a column state. Presence is the strict reading: only a
/// value written on the current row itself counts, an inherited value is
/// shown on the ring but colored empty.
pub fn color_for(column: LogicalColumn, explicit: bool) -> u8 {
    match (column.kind.color_class(), explicit) {
        (ColorClass::NoteFamily, true) => RING_GREEN,
        (ColorClass::NoteFamily, false) => RING_GREEN_DIM,
        (ColorClass::Param, true) => RING_ORANGE,
        (ColorClass::Param, false) => RING_ORANGE_DIM,
        (ColorClass::Effect, true) => RING_RED,
        (ColorClass::Effect, false) => RING_RED_DIM,
    }
}

/// Encode the current state of `column` for the encoder at `control`. The
/// value is capped (not wrapped) to the 7-bit transmissible range; the stored
/// cell keeps its full-range value.
pub fn encode(
    doc: &dyn SongDocument,
    column: LogicalColumn,
    control: u8,
    profile: &Profile,
) -> Feedback {
    let row = doc.cursor().row;
    let value = resolve::resolve(doc, column, row).clamp(0, 127) as u8;
    let explicit = resolve::explicit_at(doc, column, row);
    Feedback {
        value: CcMessage::new(profile.value_channel, control, value),
        color: CcMessage::new(profile.color_channel, control, color_for(column, explicit)),
    }
}

/// The pair sent to a control that just left the allocation: value zero and
/// ring off.
pub fn reset(control: u8, profile: &Profile) -> Feedback {
    Feedback {
        value: CcMessage::new(profile.value_channel, control, 0),
        color: CcMessage::new(profile.color_channel, control, RING_OFF),
    }
}
