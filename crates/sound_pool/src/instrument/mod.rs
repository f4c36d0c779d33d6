//! Instruments: families of note samples sharing one pool
//!
//! An instrument named `acoustic_grand_piano` plays the note `c5` from the
//! resource `acoustic_grand_piano_c5`. Notes are matched case-insensitively.

pub mod pitch;
pub mod player;

pub use pitch::{generate_pitch_list, NOTES, OCTAVES};
pub use player::Player;

use crate::config::PoolConfig;
use crate::engine::{SoundId, StreamId};
use crate::error::PoolError;
use crate::pool::{LoadOutcome, LoadTicket, PoolController};
use std::collections::HashMap;
use std::ops::RangeInclusive;
use thiserror::Error;

/// Accepted playback rates
pub const SPEED_RANGE: RangeInclusive<f32> = 0.5..=2.0;

/// Accepted playback gains
pub const GAIN_RANGE: RangeInclusive<f32> = 0.0..=1.0;

/// Instrument errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InstrumentError {
    /// The note has not been prepared
    #[error("Note not prepared: {0}")]
    NotPrepared(String),

    /// A playback parameter is outside its accepted range
    #[error("{what} out of range: {value}")]
    OutOfRange {
        /// Parameter name
        what: &'static str,
        /// Rejected value
        value: f32,
    },

    /// Some notes could not be loaded
    #[error("Failed to prepare notes: {0:?}")]
    PrepareFailed(Vec<String>),

    /// Pool operation failed
    #[error("Pool error: {0}")]
    Pool(#[from] PoolError),
}

/// A named set of note samples
pub struct Instrument {
    name: String,
    pool: PoolController,
    sounds: HashMap<String, SoundId>,
}

impl Instrument {
    /// Create an instrument and the pool it plays through
    ///
    /// # Errors
    /// - `Pool` if the pool's engine cannot be created
    pub fn new(name: impl Into<String>, mut pool: PoolController, config: &PoolConfig) -> Result<Self, InstrumentError> {
        pool.create_with(config)?;
        Ok(Self {
            name: name.into(),
            pool,
            sounds: HashMap::new(),
        })
    }

    /// Instrument name prefix
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pool the instrument plays through
    pub fn pool(&self) -> &PoolController {
        &self.pool
    }

    /// Check if `note` is ready to play
    pub fn is_prepared(&self, note: &str) -> bool {
        self.sounds.contains_key(&note.to_lowercase())
    }

    /// Load every note not yet prepared and wait for all of them
    ///
    /// Notes that load stay usable even when others fail.
    ///
    /// # Errors
    /// - `PrepareFailed` listing the notes that could not be loaded
    pub async fn prepare<S: AsRef<str>>(&mut self, notes: &[S]) -> Result<(), InstrumentError> {
        let mut failed = Vec::new();
        for (note, ticket) in self.request(notes) {
            let outcome = ticket.await;
            self.record(note, outcome, &mut failed);
        }
        self.finish_prepare(notes, failed)
    }

    /// Blocking form of [`prepare`](Self::prepare) for synchronous hosts
    ///
    /// # Errors
    /// - `PrepareFailed` listing the notes that could not be loaded
    ///
    /// # Panics
    /// Panics when called from within an asynchronous runtime context;
    /// await [`prepare`](Self::prepare) there instead.
    pub fn prepare_blocking<S: AsRef<str>>(&mut self, notes: &[S]) -> Result<(), InstrumentError> {
        let mut failed = Vec::new();
        for (note, ticket) in self.request(notes) {
            let outcome = ticket.wait();
            self.record(note, outcome, &mut failed);
        }
        self.finish_prepare(notes, failed)
    }

    /// Issue loads for the notes that are not prepared yet
    fn request<S: AsRef<str>>(&mut self, notes: &[S]) -> Vec<(String, LoadTicket)> {
        let mut requests: Vec<(String, LoadTicket)> = Vec::new();
        for note in notes {
            let note = note.as_ref().to_lowercase();
            if self.sounds.contains_key(&note) || requests.iter().any(|(queued, _)| *queued == note) {
                continue;
            }
            let resource = format!("{}_{}", self.name, note);
            requests.push((note, self.pool.load(&resource)));
        }
        requests
    }

    fn record(&mut self, note: String, outcome: LoadOutcome, failed: &mut Vec<String>) {
        match outcome {
            Ok(sound) => {
                self.sounds.insert(note, sound);
            }
            Err(e) => {
                log::error!("Failed to load {}: {}", note, e);
                failed.push(note);
            }
        }
    }

    fn finish_prepare<S: AsRef<str>>(&self, notes: &[S], failed: Vec<String>) -> Result<(), InstrumentError> {
        if failed.is_empty() {
            log::debug!("Finished preparing {} notes of {}", notes.len(), self.name);
            Ok(())
        } else {
            Err(InstrumentError::PrepareFailed(failed))
        }
    }

    /// Check playback parameters and map notes to their sounds
    pub(crate) fn resolve<S: AsRef<str>>(&self, notes: &[S], speed: f32, gain: f32) -> Result<Vec<SoundId>, InstrumentError> {
        if !SPEED_RANGE.contains(&speed) {
            return Err(InstrumentError::OutOfRange { what: "speed", value: speed });
        }
        if !GAIN_RANGE.contains(&gain) {
            return Err(InstrumentError::OutOfRange { what: "gain", value: gain });
        }

        notes
            .iter()
            .map(|note| {
                let note = note.as_ref().to_lowercase();
                self.sounds
                    .get(&note)
                    .copied()
                    .ok_or(InstrumentError::NotPrepared(note))
            })
            .collect()
    }

    /// Play notes together
    ///
    /// Either every note starts or none does.
    ///
    /// # Arguments
    /// * `notes` - Prepared notes; several are started as one chord
    /// * `speed` - Playback rate (0.5 to 2.0)
    /// * `gain` - Playback gain (0.0 to 1.0)
    ///
    /// # Errors
    /// - `OutOfRange` if `speed` or `gain` is outside its range
    /// - `NotPrepared` for the first note that is not prepared
    /// - `Pool` if the pool could not start every stream
    pub fn play<S: AsRef<str>>(&mut self, notes: &[S], speed: f32, gain: f32) -> Result<Vec<StreamId>, InstrumentError> {
        let sounds = self.resolve(notes, speed, gain)?;
        Ok(self.pool.play_chord(&sounds, 0, speed, gain)?)
    }

    /// Stop streams immediately
    pub fn stop(&mut self, streams: &[StreamId]) {
        for &stream in streams {
            self.pool.stop(stream);
        }
    }

    /// Pause streams
    pub fn pause(&mut self, streams: &[StreamId]) {
        for &stream in streams {
            self.pool.pause(stream);
        }
    }

    /// Resume paused streams
    pub fn resume(&mut self, streams: &[StreamId]) {
        for &stream in streams {
            self.pool.resume(stream);
        }
    }

    /// Pause every stream in the pool
    pub fn pause_all(&mut self) {
        self.pool.suspend_all();
    }

    /// Resume every stream paused by [`pause_all`](Self::pause_all)
    pub fn resume_all(&mut self) {
        self.pool.resume_all();
    }

    /// Release the pool and forget every prepared note
    pub fn release(&mut self) {
        self.sounds.clear();
        self.pool.release();
    }
}
