//! MIDI transport.
//!
//! Ports are found by case-insensitive name substring. A missing input device
//! means the core never activates; a missing output only disables feedback,
//! every send becomes a no-op. Sends are fire-and-forget with no retry.

use midir::{Ignore, MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Outbound feedback target. The engine only ever pushes 3-byte messages.
pub trait FeedbackSink {
    fn send(&mut self, data: [u8; 3]);
}

/// Real device output. `None` inside means no device was found and sends
/// silently disappear.
pub struct MidirSink {
    conn: Option<MidiOutputConnection>,
}

impl MidirSink {
    pub fn new(conn: Option<MidiOutputConnection>) -> Self {
        MidirSink { conn }
    }
}

impl FeedbackSink for MidirSink {
    fn send(&mut self, data: [u8; 3]) {
        if let Some(conn) = self.conn.as_mut() {
            if let Err(e) = conn.send(&data) {
                warn!("Failed to send feedback message: {}", e);
            }
        }
    }
}

/// Capturing sink for tests and headless runs.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub sent: Vec<[u8; 3]>,
}

impl FeedbackSink for MemorySink {
    fn send(&mut self, data: [u8; 3]) {
        self.sent.push(data);
    }
}

/// Open the input port whose name contains `device` and forward every raw
/// message into the event funnel. Returns `None` when no such port exists.
pub fn open_input(device: &str, tx: mpsc::Sender<Vec<u8>>) -> Option<MidiInputConnection<()>> {
    let mut midi_in = match MidiInput::new("encoder-mapper-in") {
        Ok(m) => m,
        Err(e) => {
            warn!("Failed to create MIDI input: {}", e);
            return None;
        }
    };
    midi_in.ignore(Ignore::None);

    let wanted = device.to_uppercase();
    let ports = midi_in.ports();
    let port = ports.iter().find(|p| {
        let name = midi_in.port_name(p).unwrap_or_default();
        if name.to_uppercase().contains(&wanted) {
            true
        } else {
            info!("Available MIDI In Port: {}", name);
            false
        }
    })?;

    let name = midi_in.port_name(port).unwrap_or_default();
    info!("Connecting to MIDI Input: {}", name);
    match midi_in.connect(
        port,
        "encoder-mapper-in",
        move |_timestamp, message, _| {
            // dropped messages are fine, the next detent re-sends
            let _ = tx.try_send(message.to_vec());
        },
        (),
    ) {
        Ok(conn) => Some(conn),
        Err(e) => {
            warn!("Failed to connect to MIDI input: {}", e);
            None
        }
    }
}

/// Open the output port whose name contains `device`. Returns `None` when no
/// such port exists.
pub fn open_output(device: &str) -> Option<MidiOutputConnection> {
    let midi_out = match MidiOutput::new("encoder-mapper-out") {
        Ok(m) => m,
        Err(e) => {
            warn!("Failed to create MIDI output: {}", e);
            return None;
        }
    };

    let wanted = device.to_uppercase();
    let ports = midi_out.ports();
    let port = ports.iter().find(|p| {
        let name = midi_out.port_name(p).unwrap_or_default();
        if name.to_uppercase().contains(&wanted) {
            true
        } else {
            info!("Available MIDI Out Port: {}", name);
            false
        }
    })?;

    let name = midi_out.port_name(port).unwrap_or_default();
    info!("Connecting to MIDI Output: {}", name);
    match midi_out.connect(port, "encoder-mapper-out") {
        Ok(conn) => Some(conn),
        Err(e) => {
            warn!("Failed to connect to MIDI output: {}", e);
            None
        }
    }
}

/// Owns the observer side of a running session: the input connection and the
/// tick task. Detaching twice is safe and does nothing the second time.
pub struct Bridge {
    attached: bool,
    input: Option<MidiInputConnection<()>>,
    tick: Option<JoinHandle<()>>,
}

impl Bridge {
    pub fn new(input: Option<MidiInputConnection<()>>, tick: Option<JoinHandle<()>>) -> Self {
        Bridge {
            attached: true,
            input,
            tick,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn detach(&mut self) {
        if !self.attached {
            return;
        }
        if let Some(conn) = self.input.take() {
            conn.close();
        }
        if let Some(task) = self.tick.take() {
            task.abort();
        }
        self.attached = false;
        info!("Detached from controller");
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        self.detach();
    }
}
