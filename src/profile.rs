//! Controller profile.
//!
//! Everything hardware-specific lives here so one binary can serve different
//! encoder boxes: the port name to look for, the CC ids of the encoder pool
//! in pool order, the relative up/down marker values the firmware emits, and
//! the repeat threshold that paces detents.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Number of encoders on the default box.
pub const NUM_ENCODERS: usize = 16;
/// CC id of the first encoder; the pool is contiguous from here.
const FIRST_ENCODER_CC: u8 = 1;

lazy_static::lazy_static! {
    static ref ENCODER_CCS: [u8; NUM_ENCODERS] = {
        let mut ccs = [0u8; NUM_ENCODERS];
        for (i, cc) in ccs.iter_mut().enumerate() {
            *cc = FIRST_ENCODER_CC + i as u8;
        }
        ccs
    };
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    /// Substring matched against MIDI port names, case-insensitive.
    pub device_name: String,
    /// 1-based channel the encoders transmit on.
    pub control_channel: u8,
    /// 1-based channel for outbound ring values.
    pub value_channel: u8,
    /// 1-based channel for outbound ring colors.
    pub color_channel: u8,
    /// Physical pool in its fixed declared order.
    pub encoder_ccs: Vec<u8>,
    /// Data value meaning "one step up" (twos-complement around 64 firmware).
    pub increase_marker: u8,
    /// Data value meaning "one step down".
    pub decrease_marker: u8,
    /// Messages per detent before a commit; a held encoder drops this to 1.
    pub repeat_threshold: u32,
}

impl Default for Profile {
    fn default() -> Self {
        Profile {
            device_name: "POCKET DIAL".to_string(),
            control_channel: 1,
            value_channel: 1,
            color_channel: 2,
            encoder_ccs: ENCODER_CCS.to_vec(),
            increase_marker: 65,
            decrease_marker: 63,
            repeat_threshold: 3,
        }
    }
}

impl Profile {
    pub fn from_json(json_str: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json_str)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read profile {}", path.display()))?;
        Profile::from_json(&raw)
            .with_context(|| format!("Failed to parse profile {}", path.display()))
    }
}
