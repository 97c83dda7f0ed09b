use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use encoder_mapper_rust::document::{DocChange, SongDocument, TrackLayout};
use encoder_mapper_rust::engine::Mapper;
use encoder_mapper_rust::pattern::PatternDocument;
use encoder_mapper_rust::profile::Profile;
use encoder_mapper_rust::transport::{self, Bridge, MidirSink};

// Demo pattern used when no --pattern file is given
const DEMO_ROWS: usize = 64;

// --- Command Line Arguments ---
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct CliArgs {
    /// Controller profile JSON; defaults are built in.
    #[clap(long)]
    profile: Option<PathBuf>,
    /// Override the profile's device name substring.
    #[clap(long)]
    device: Option<String>,
    /// Pattern JSON to serve as the host document.
    #[clap(long)]
    pattern: Option<PathBuf>,
    #[clap(long, default_value_t = 1000)]
    tick_ms: u64,
}

// --- Event funnel ---
// Every source feeds this one channel; the single consumer below owns the
// mapper and the document, so entry points never overlap.
enum Event {
    Midi(Vec<u8>),
    Tick,
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Setting default subscriber failed");

    let args = CliArgs::parse();
    info!("Starting encoder mapper with args: {:?}", args);

    let mut profile = match &args.profile {
        Some(path) => Profile::load(path)?,
        None => Profile::default(),
    };
    if let Some(device) = &args.device {
        profile.device_name = device.clone();
    }

    let mut doc = match &args.pattern {
        Some(path) => PatternDocument::from_json(&std::fs::read_to_string(path)?)?,
        None => demo_pattern(),
    };

    let (tx, mut rx) = mpsc::channel::<Event>(64);

    // --- MIDI wiring ---
    let midi_tx = tx.clone();
    let (midi_raw_tx, mut midi_raw_rx) = mpsc::channel::<Vec<u8>>(64);
    let input = transport::open_input(&profile.device_name, midi_raw_tx);
    if input.is_none() {
        // reconnection is a matter of restarting; nothing to tear down
        info!(
            "No MIDI input matching '{}' found, controller stays inactive",
            profile.device_name
        );
        return Ok(());
    }
    tokio::spawn(async move {
        while let Some(raw) = midi_raw_rx.recv().await {
            if midi_tx.send(Event::Midi(raw)).await.is_err() {
                break;
            }
        }
    });

    let output = transport::open_output(&profile.device_name);
    if output.is_none() {
        warn!("No MIDI output found, ring feedback disabled");
    }
    let mut sink = MidirSink::new(output);

    // --- Tick task ---
    let tick_tx = tx.clone();
    let tick_ms = args.tick_ms;
    let tick_task = tokio::spawn(async move {
        let mut timer = interval(Duration::from_millis(tick_ms.max(100)));
        loop {
            timer.tick().await;
            if tick_tx.send(Event::Tick).await.is_err() {
                break;
            }
        }
    });

    let mut bridge = Bridge::new(input, Some(tick_task));
    drop(tx);

    // --- Initial sync ---
    let pool_size = profile.encoder_ccs.len();
    let mut mapper = Mapper::new(profile);
    mapper.attach(&doc, &mut sink);
    info!(
        "Mapper running: {} of {} encoders allocated",
        mapper.allocation().len(),
        pool_size
    );

    // --- Event loop ---
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
            event = rx.recv() => {
                let Some(event) = event else { break };
                match event {
                    Event::Midi(raw) => mapper.handle_raw(&mut doc, &mut sink, &raw),
                    Event::Tick => {
                        // stand-in host: walk the cursor one row per tick so
                        // the rings track a moving edit position
                        let rows = doc.row_count();
                        if rows > 0 {
                            let next = (doc.cursor().row + 1) % rows;
                            doc.set_row(next);
                            debug!("Cursor at row {}", next);
                        }
                        mapper.on_change(DocChange::Selection, &doc, &mut sink);
                    }
                }
            }
        }
    }

    bridge.detach();
    Ok(())
}

fn demo_pattern() -> PatternDocument {
    PatternDocument::new(
        TrackLayout {
            note_columns: 2,
            effect_columns: 1,
            volume_visible: true,
            panning_visible: true,
            delay_visible: false,
            sample_fx_visible: false,
        },
        DEMO_ROWS,
    )
}
