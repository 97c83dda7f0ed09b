//! Debounce / repeat decoding for relative encoders.
//!
//! One physical detent arrives as a burst of identical CC messages. The
//! decoder spreads a detent over `threshold` messages so light touches do not
//! over-trigger, and drops the threshold to 1 while the encoder is pressed so
//! a held click scrubs continuously. Data values 127 and 0 are press/release
//! framing, never edits.

use crate::message::CcMessage;

/// Data value the encoder sends while pressed / at its limit.
pub const DATA_PRESS: u8 = 127;
/// Data value the encoder sends on release.
pub const DATA_RELEASE: u8 = 0;

/// Edit direction, derived from the configured marker values after a commit
/// is confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Per-control repeat state. Created when the control enters the allocation,
/// discarded when it leaves.
#[derive(Debug, Clone)]
pub struct DebounceState {
    last: Option<(u8, u8, u8)>,
    count: u32,
    threshold: u32,
}

impl DebounceState {
    pub fn new(threshold: u32) -> Self {
        DebounceState {
            last: None,
            count: 0,
            threshold: threshold.max(1),
        }
    }

    /// Feed one message addressed to this control. Returns true when the
    /// caller should commit one increment or decrement.
    ///
    /// Press/release framing adjusts the threshold and bypasses the counter
    /// entirely. The counter resets to 1 (not 0) when it grows past the
    /// threshold; the reset itself never commits, the comparison below does.
    pub fn feed(&mut self, msg: &CcMessage, default_threshold: u32) -> bool {
        if msg.value == DATA_PRESS {
            self.threshold = 1;
            return false;
        }
        if msg.value == DATA_RELEASE {
            self.threshold = default_threshold.max(1);
            return false;
        }

        let triple = msg.triple();
        if self.last == Some(triple) {
            self.count += 1;
            if self.count > self.threshold {
                self.count = 1;
            }
        } else {
            self.last = Some(triple);
            self.count = 1;
        }
        self.count >= self.threshold
    }
}
