//! Timeline playback of chords on an instrument
//!
//! A [`Player`] schedules chords relative to a timeline that starts with
//! the first chord and ends once every scheduled chord has been stopped.
//! Nothing runs in the background: call [`Player::update`] once per frame
//! to start and stop chords as they fall due.

use super::{Instrument, InstrumentError};
use crate::config::PlayerOptions;
use crate::engine::StreamId;
use std::time::{Duration, Instant};

/// Something the timeline has to do at a given instant
#[derive(Debug, Clone, PartialEq, Eq)]
enum Cue {
    /// Start a chord
    Start { due: Instant, notes: Vec<String> },
    /// Stop a sounding chord
    Stop { due: Instant, chord: u64 },
}

impl Cue {
    fn due(&self) -> Instant {
        match self {
            Self::Start { due, .. } | Self::Stop { due, .. } => *due,
        }
    }
}

/// A chord that is currently sounding
#[derive(Debug, Clone)]
struct Chord {
    id: u64,
    streams: Vec<StreamId>,
}

/// Plays chords of an instrument on a timeline
pub struct Player {
    instrument: Instrument,
    options: PlayerOptions,
    origin: Option<Instant>,
    cues: Vec<Cue>,
    sounding: Vec<Chord>,
    next_chord: u64,
}

impl Player {
    /// Create a player with default options
    pub fn new(instrument: Instrument) -> Self {
        Self::with_options(instrument, PlayerOptions::default())
    }

    /// Create a player with explicit options
    pub fn with_options(instrument: Instrument, options: PlayerOptions) -> Self {
        Self {
            instrument,
            options,
            origin: None,
            cues: Vec::new(),
            sounding: Vec::new(),
            next_chord: 0,
        }
    }

    /// Replace the player's options
    pub fn config(&mut self, options: PlayerOptions) -> &mut Self {
        self.options = options;
        self
    }

    /// Current options
    pub fn options(&self) -> &PlayerOptions {
        &self.options
    }

    /// Instrument being played
    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    /// Mutable access to the instrument
    pub fn instrument_mut(&mut self) -> &mut Instrument {
        &mut self.instrument
    }

    /// Prepare notes on the instrument
    ///
    /// # Errors
    /// - `PrepareFailed` listing the notes that could not be loaded
    pub async fn prepare<S: AsRef<str>>(&mut self, notes: &[S]) -> Result<&mut Self, InstrumentError> {
        self.instrument.prepare(notes).await?;
        Ok(self)
    }

    /// Schedule a chord `when` after the start of the timeline
    ///
    /// # Errors
    /// - `OutOfRange` if the configured speed or gain is invalid
    /// - `NotPrepared` if a note has not been prepared
    pub fn play<S: AsRef<str>>(&mut self, notes: &[S], when: Duration) -> Result<&mut Self, InstrumentError> {
        self.schedule(notes, when, Instant::now())
    }

    /// Schedule a chord `when` after the start of the timeline, at time `now`
    ///
    /// The first chord scheduled on an idle player starts the timeline at
    /// `now`. Chords already due start immediately.
    ///
    /// # Errors
    /// - `OutOfRange` if the configured speed or gain is invalid
    /// - `NotPrepared` if a note has not been prepared
    /// - `Pool` if a chord due now could not start every stream
    pub fn schedule<S: AsRef<str>>(&mut self, notes: &[S], when: Duration, now: Instant) -> Result<&mut Self, InstrumentError> {
        self.instrument.resolve(notes, self.options.speed, self.options.gain)?;

        let origin = *self.origin.get_or_insert(now);
        let due = origin + when;
        let notes: Vec<String> = notes.iter().map(|note| note.as_ref().to_string()).collect();

        let started = if due <= now {
            self.start(notes, now)
        } else {
            self.cues.push(Cue::Start { due, notes });
            Ok(())
        };
        self.settle_timeline();
        started.map(|()| self)
    }

    /// Start and stop every chord due at `now`
    ///
    /// A chord that cannot start is logged and skipped.
    pub fn update(&mut self, now: Instant) {
        while let Some(index) = self.next_due(now) {
            match self.cues.remove(index) {
                Cue::Start { due, notes } => {
                    if let Err(e) = self.start(notes, due) {
                        log::error!("Failed to play chord: {}", e);
                    }
                }
                Cue::Stop { chord, .. } => self.stop_chord(chord),
            }
        }
        self.settle_timeline();
    }

    /// Stop every chord this player started
    pub fn stop(&mut self) -> &mut Self {
        let streams = self.active_streams();
        self.instrument.stop(&streams);
        self.sounding.clear();
        self.cues.retain(|cue| matches!(cue, Cue::Start { .. }));
        self.settle_timeline();
        self
    }

    /// Pause every chord this player started
    ///
    /// Only this player's streams are paused; other players sharing the
    /// instrument keep playing.
    pub fn pause(&mut self) -> &mut Self {
        let streams = self.active_streams();
        self.instrument.pause(&streams);
        self
    }

    /// Resume every chord this player paused
    pub fn resume(&mut self) -> &mut Self {
        let streams = self.active_streams();
        self.instrument.resume(&streams);
        self
    }

    /// Streams of every chord currently sounding
    pub fn active_streams(&self) -> Vec<StreamId> {
        self.sounding
            .iter()
            .flat_map(|chord| chord.streams.iter().copied())
            .collect()
    }

    /// Check if nothing is sounding or scheduled
    pub fn is_idle(&self) -> bool {
        self.origin.is_none()
    }

    /// Index of the earliest cue due at `now`
    fn next_due(&self, now: Instant) -> Option<usize> {
        self.cues
            .iter()
            .enumerate()
            .filter(|(_, cue)| cue.due() <= now)
            .min_by_key(|(_, cue)| cue.due())
            .map(|(index, _)| index)
    }

    /// Start a chord at `at`, scheduling its stop
    ///
    /// A chord that fails leaves no stream behind.
    fn start(&mut self, notes: Vec<String>, at: Instant) -> Result<(), InstrumentError> {
        let streams = self.instrument.play(&notes, self.options.speed, self.options.gain)?;

        let id = self.next_chord;
        self.next_chord += 1;
        self.sounding.push(Chord { id, streams });
        self.cues.push(Cue::Stop {
            due: at + self.options.duration() + self.options.release(),
            chord: id,
        });
        Ok(())
    }

    fn stop_chord(&mut self, id: u64) {
        if let Some(index) = self.sounding.iter().position(|chord| chord.id == id) {
            let chord = self.sounding.remove(index);
            self.instrument.stop(&chord.streams);
        }
    }

    /// End the timeline once nothing is sounding or scheduled
    fn settle_timeline(&mut self) {
        if self.cues.is_empty() && self.sounding.is_empty() {
            self.origin = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PoolError;
    use crate::instrument::tests::piano;

    fn player() -> Player {
        let mut piano = piano(6);
        piano.prepare_blocking(&["c5", "e5", "g5", "f5", "a5"]).unwrap();
        Player::with_options(
            piano,
            PlayerOptions {
                duration_ms: 1000,
                release_ms: 0,
                ..PlayerOptions::default()
            },
        )
    }

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn test_immediate_chord_stops_after_duration() {
        let mut player = player();
        let t0 = Instant::now();

        player.schedule(&["c5", "e5", "g5"], Duration::ZERO, t0).unwrap();
        assert_eq!(player.active_streams().len(), 3);
        assert!(!player.is_idle());

        player.update(t0 + ms(999));
        assert_eq!(player.active_streams().len(), 3);

        player.update(t0 + ms(1000));
        assert!(player.active_streams().is_empty());
        assert!(player.is_idle());
    }

    #[test]
    fn test_deferred_chord_uses_timeline_origin() {
        let mut player = player();
        let t0 = Instant::now();

        player.schedule(&["c5"], Duration::ZERO, t0).unwrap();
        // Scheduled later, but relative to the timeline start
        player.schedule(&["f5", "a5"], ms(500), t0 + ms(200)).unwrap();
        assert_eq!(player.active_streams().len(), 1);

        player.update(t0 + ms(500));
        assert_eq!(player.active_streams().len(), 3);

        player.update(t0 + ms(1000));
        assert_eq!(player.active_streams().len(), 2);

        player.update(t0 + ms(1500));
        assert!(player.is_idle());
    }

    #[test]
    fn test_late_update_processes_in_order() {
        let mut player = player();
        let t0 = Instant::now();

        player.schedule(&["c5"], ms(100), t0).unwrap();
        assert!(player.active_streams().is_empty());

        // One late frame both starts and stops the chord
        player.update(t0 + ms(5000));
        assert!(player.active_streams().is_empty());
        assert!(player.is_idle());
    }

    #[test]
    fn test_release_extends_chord() {
        let mut player = player();
        player.config(PlayerOptions {
            duration_ms: 1000,
            release_ms: 300,
            ..PlayerOptions::default()
        });
        let t0 = Instant::now();

        player.schedule(&["e5"], Duration::ZERO, t0).unwrap();
        player.update(t0 + ms(1200));
        assert_eq!(player.active_streams().len(), 1);
        player.update(t0 + ms(1300));
        assert!(player.active_streams().is_empty());
    }

    #[test]
    fn test_stop_keeps_future_chords() {
        let mut player = player();
        let t0 = Instant::now();

        player.schedule(&["c5"], Duration::ZERO, t0).unwrap();
        player.schedule(&["g5"], ms(2000), t0).unwrap();
        player.stop();
        assert!(player.active_streams().is_empty());
        assert!(!player.is_idle());

        player.update(t0 + ms(2000));
        assert_eq!(player.active_streams().len(), 1);
    }

    #[test]
    fn test_unprepared_note_is_rejected() {
        let mut player = player();
        let result = player.schedule(&["b5"], Duration::ZERO, Instant::now());
        assert!(matches!(result, Err(InstrumentError::NotPrepared(note)) if note == "b5"));
        assert!(player.is_idle());
    }

    #[test]
    fn test_chord_beyond_stream_limit_leaves_pool_free() {
        let mut piano = piano(2);
        piano.prepare_blocking(&["c5", "e5", "g5"]).unwrap();
        let mut player = Player::new(piano);
        let t0 = Instant::now();

        let result = player.schedule(&["c5", "e5", "g5"], Duration::ZERO, t0);
        assert!(matches!(
            result,
            Err(InstrumentError::Pool(PoolError::InternalError(_)))
        ));
        assert!(player.active_streams().is_empty());
        assert!(player.is_idle());

        // Both stream slots are still free for the next chord
        player.schedule(&["c5", "e5"], Duration::ZERO, t0).unwrap();
        assert_eq!(player.active_streams().len(), 2);
    }

    #[test]
    fn test_late_chord_beyond_stream_limit_is_skipped() {
        let mut piano = piano(2);
        piano.prepare_blocking(&["c5", "e5", "g5"]).unwrap();
        let mut player = Player::new(piano);
        let t0 = Instant::now();

        player.schedule(&["c5", "e5", "g5"], ms(100), t0).unwrap();
        player.update(t0 + ms(100));
        assert!(player.active_streams().is_empty());
        assert!(player.is_idle());

        let streams = player.instrument_mut().play(&["g5", "e5"], 1.0, 1.0).unwrap();
        assert_eq!(streams.len(), 2);
    }

    #[test]
    fn test_pause_and_resume_own_streams() {
        let mut player = player();
        player.schedule(&["c5", "e5"], Duration::ZERO, Instant::now()).unwrap();
        player.pause().resume();
        assert_eq!(player.active_streams().len(), 2);
    }
}
