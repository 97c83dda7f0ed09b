//! Control Change message codec.
//!
//! Everything on the wire is a 3-byte message `[status, data1, data2]`.
//! The status byte packs the command into the high nibble and the 0-based
//! channel into the low nibble; channels are exposed 1-based everywhere else.

/// Control Change command nibble, already shifted (0xB0).
pub const COMMAND_CONTROL_CHANGE: u8 = 0xB0;

/// One decoded Control Change message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CcMessage {
    /// Command class (high nibble of the status byte, shifted: 0xB0 for CC).
    pub command: u8,
    /// 1-based MIDI channel.
    pub channel: u8,
    /// Control id (data1, 0-127).
    pub control: u8,
    /// Value (data2, 0-127).
    pub value: u8,
}

impl CcMessage {
    pub fn new(channel: u8, control: u8, value: u8) -> Self {
        CcMessage {
            command: COMMAND_CONTROL_CHANGE,
            channel,
            control,
            value,
        }
    }

    /// Decode a raw MIDI message. Returns `None` for anything that is not a
    /// complete 3-byte Control Change.
    pub fn parse(data: &[u8]) -> Option<CcMessage> {
        if data.len() < 3 {
            return None;
        }
        let status = data[0];
        if status & 0xF0 != COMMAND_CONTROL_CHANGE {
            return None;
        }
        Some(CcMessage {
            command: status & 0xF0,
            channel: (status & 0x0F) + 1,
            control: data[1],
            value: data[2],
        })
    }

    /// Encode back into the 3-byte wire form.
    pub fn to_bytes(&self) -> [u8; 3] {
        [
            self.command | (self.channel.saturating_sub(1) & 0x0F),
            self.control & 0x7F,
            self.value & 0x7F,
        ]
    }

    /// The identity triple tracked by the debounce decoder.
    pub fn triple(&self) -> (u8, u8, u8) {
        (self.command, self.channel, self.control)
    }
}
