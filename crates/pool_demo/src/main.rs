//! Chord progression demo
//!
//! Prepares an instrument from a directory of note samples and plays a
//! short progression through a [`Player`]. Pass a `.toml` or `.ron` file
//! as the first argument to override the defaults.

use serde::{Deserialize, Serialize};
use sound_pool::foundation::logging;
use sound_pool::prelude::*;
use std::time::{Duration, Instant};

/// A chord and when it starts on the timeline
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChordCue {
    notes: Vec<String>,
    at_ms: u64,
}

/// Demo settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct DemoConfig {
    /// Sample name prefix
    instrument: String,
    /// Directory holding `<instrument>_<note>` files
    sound_dir: String,
    pool: PoolConfig,
    player: PlayerOptions,
    progression: Vec<ChordCue>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        let chord = |notes: &[&str], at_ms| ChordCue {
            notes: notes.iter().map(|note| (*note).to_string()).collect(),
            at_ms,
        };
        Self {
            instrument: "acoustic_grand_piano".to_string(),
            sound_dir: "assets/sounds".to_string(),
            pool: PoolConfig::default(),
            player: PlayerOptions {
                duration_ms: 1000,
                ..PlayerOptions::default()
            },
            progression: vec![
                chord(&["c5", "e5", "g5"], 0),
                chord(&["c5", "f5", "a5"], 1000),
                chord(&["d5", "f5", "b5"], 2000),
                chord(&["c5", "g5", "c6"], 3000),
            ],
        }
    }
}

impl Config for DemoConfig {}

impl DemoConfig {
    /// Every distinct note the progression uses
    fn notes(&self) -> Vec<String> {
        let mut notes: Vec<String> = Vec::new();
        for note in self.progression.iter().flat_map(|cue| cue.notes.iter()) {
            if !notes.contains(note) {
                notes.push(note.clone());
            }
        }
        notes
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading demo configuration from {}", path);
            DemoConfig::load_from_file(&path)?
        }
        None => DemoConfig::default(),
    };

    let resolver = DirectoryResolver::new(&config.sound_dir);
    let controller = PoolController::new(resolver, create_default_engine);
    let instrument = Instrument::new(config.instrument.clone(), controller, &config.pool)?;
    let mut player = Player::with_options(instrument, config.player);

    let notes = config.notes();
    log::info!("Preparing {} notes of {}", notes.len(), config.instrument);
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(player.prepare(&notes))?;

    for cue in &config.progression {
        player.play(&cue.notes, Duration::from_millis(cue.at_ms))?;
    }

    let frame = Duration::from_millis(16);
    while !player.is_idle() {
        std::thread::sleep(frame);
        player.update(Instant::now());
    }

    log::info!("Progression finished");
    player.instrument_mut().release();
    Ok(())
}
