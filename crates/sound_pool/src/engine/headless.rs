//! Headless decode engine
//!
//! An engine without an output device. It tracks decoded sounds and active
//! streams exactly like a real mixer would, which makes it suitable for
//! servers, tools and tests. A [`HeadlessProbe`] obtained from the engine
//! stays valid after the engine is moved into a pool and can deliver
//! completions from any thread.
//!
//! # Example
//!
//! ```
//! use sound_pool::engine::{DecodeEngine, EngineConfig, SoundId, LOAD_SUCCESS};
//! use sound_pool::engine::headless::HeadlessEngine;
//! use std::sync::Arc;
//!
//! let mut engine = HeadlessEngine::manual(&EngineConfig { max_streams: 2 });
//! let probe = engine.probe();
//! engine.set_completion_listener(Arc::new(|sound: SoundId, status: i32| {
//!     println!("sound {sound} finished with status {status}");
//! }));
//!
//! let sound = engine.submit(b"RIFF....".to_vec(), 1);
//! probe.complete(sound, LOAD_SUCCESS);
//! ```

use super::{CompletionListener, DecodeEngine, EngineConfig, PlayParams, SoundId, StreamId, LOAD_SUCCESS};
use crate::assets::AudioFormat;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

/// Status reported when threaded decoding rejects the bytes
pub const UNSUPPORTED_FORMAT: i32 = 1;

/// How submitted sounds reach completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionMode {
    /// Completions are delivered only through [`HeadlessProbe::complete`]
    Manual,
    /// Each submission is "decoded" on its own thread
    Threaded,
}

/// One call to [`DecodeEngine::play`] as the engine received it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayCall {
    /// Sound that was requested
    pub sound: SoundId,
    /// Parameters passed with the request
    pub params: PlayParams,
    /// Stream returned to the caller
    pub stream: StreamId,
}

/// State of an active stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ActiveStream {
    sound: SoundId,
    paused: bool,
    auto_paused: bool,
}

/// State shared between the engine and its probes
#[derive(Default)]
struct HeadlessState {
    listener: Option<CompletionListener>,
    next_sound: u32,
    next_stream: u32,
    submissions: Vec<SoundId>,
    decoded: HashSet<SoundId>,
    active: HashMap<StreamId, ActiveStream>,
    plays: Vec<PlayCall>,
    released: bool,
}

fn lock(state: &Mutex<HeadlessState>) -> MutexGuard<'_, HeadlessState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Deliver a completion to the installed listener
///
/// The listener is cloned out so the state lock is not held while it runs.
fn deliver(state: &Mutex<HeadlessState>, sound: SoundId, status: i32) {
    let listener = {
        let mut guard = lock(state);
        if status == LOAD_SUCCESS {
            guard.decoded.insert(sound);
        }
        guard.listener.clone()
    };

    match listener {
        Some(listener) => listener(sound, status),
        None => log::warn!("Completion for sound {} dropped: no listener installed", sound),
    }
}

/// Decode engine without an audio device
pub struct HeadlessEngine {
    state: Arc<Mutex<HeadlessState>>,
    mode: CompletionMode,
    max_streams: usize,
}

impl HeadlessEngine {
    /// Create an engine whose completions are delivered by hand
    pub fn manual(config: &EngineConfig) -> Self {
        Self::with_mode(config, CompletionMode::Manual)
    }

    /// Create an engine that completes each submission on a background thread
    pub fn threaded(config: &EngineConfig) -> Self {
        Self::with_mode(config, CompletionMode::Threaded)
    }

    /// Create an engine with an explicit completion mode
    pub fn with_mode(config: &EngineConfig, mode: CompletionMode) -> Self {
        Self {
            state: Arc::new(Mutex::new(HeadlessState::default())),
            mode,
            max_streams: config.max_streams as usize,
        }
    }

    /// Get a probe onto this engine's state
    pub fn probe(&self) -> HeadlessProbe {
        HeadlessProbe {
            state: Arc::clone(&self.state),
        }
    }

    /// Completion mode of this engine
    pub fn mode(&self) -> CompletionMode {
        self.mode
    }
}

impl DecodeEngine for HeadlessEngine {
    fn set_completion_listener(&mut self, listener: CompletionListener) {
        lock(&self.state).listener = Some(listener);
    }

    fn submit(&mut self, bytes: Vec<u8>, _priority: i32) -> SoundId {
        let sound = {
            let mut state = lock(&self.state);
            state.next_sound += 1;
            let sound = SoundId(state.next_sound);
            state.submissions.push(sound);
            sound
        };

        if self.mode == CompletionMode::Threaded {
            let state = Arc::clone(&self.state);
            thread::spawn(move || {
                let status = if AudioFormat::detect(&bytes).is_known() {
                    LOAD_SUCCESS
                } else {
                    UNSUPPORTED_FORMAT
                };
                deliver(&state, sound, status);
            });
        }

        sound
    }

    fn unload(&mut self, sound: SoundId) {
        lock(&self.state).decoded.remove(&sound);
    }

    fn play(&mut self, sound: SoundId, params: PlayParams) -> StreamId {
        let mut state = lock(&self.state);

        let stream = if state.released
            || !state.decoded.contains(&sound)
            || state.active.len() >= self.max_streams
        {
            StreamId::NONE
        } else {
            state.next_stream += 1;
            let stream = StreamId(state.next_stream);
            state.active.insert(
                stream,
                ActiveStream {
                    sound,
                    paused: false,
                    auto_paused: false,
                },
            );
            stream
        };

        state.plays.push(PlayCall { sound, params, stream });
        stream
    }

    fn stop(&mut self, stream: StreamId) {
        lock(&self.state).active.remove(&stream);
    }

    fn pause(&mut self, stream: StreamId) {
        if let Some(active) = lock(&self.state).active.get_mut(&stream) {
            active.paused = true;
        }
    }

    fn resume(&mut self, stream: StreamId) {
        if let Some(active) = lock(&self.state).active.get_mut(&stream) {
            active.paused = false;
            active.auto_paused = false;
        }
    }

    fn pause_all(&mut self) {
        for active in lock(&self.state).active.values_mut() {
            if !active.paused {
                active.paused = true;
                active.auto_paused = true;
            }
        }
    }

    fn resume_all(&mut self) {
        for active in lock(&self.state).active.values_mut() {
            if active.auto_paused {
                active.paused = false;
                active.auto_paused = false;
            }
        }
    }

    fn release(&mut self) {
        let mut state = lock(&self.state);
        state.active.clear();
        state.decoded.clear();
        state.released = true;
        log::debug!("Headless engine released");
    }
}

/// Cloneable view onto a [`HeadlessEngine`]
#[derive(Clone)]
pub struct HeadlessProbe {
    state: Arc<Mutex<HeadlessState>>,
}

impl HeadlessProbe {
    /// Deliver a completion for `sound` as the decoder thread would
    pub fn complete(&self, sound: SoundId, status: i32) {
        deliver(&self.state, sound, status);
    }

    /// End a stream as if it had played to completion
    pub fn finish(&self, stream: StreamId) {
        lock(&self.state).active.remove(&stream);
    }

    /// Sounds submitted so far, in submission order
    pub fn submissions(&self) -> Vec<SoundId> {
        lock(&self.state).submissions.clone()
    }

    /// Every play request received, in call order
    pub fn play_calls(&self) -> Vec<PlayCall> {
        lock(&self.state).plays.clone()
    }

    /// Check if the engine currently holds decoded data for `sound`
    pub fn is_decoded(&self, sound: SoundId) -> bool {
        lock(&self.state).decoded.contains(&sound)
    }

    /// Number of active streams
    pub fn active_count(&self) -> usize {
        lock(&self.state).active.len()
    }

    /// Check if `stream` is active
    pub fn is_active(&self, stream: StreamId) -> bool {
        lock(&self.state).active.contains_key(&stream)
    }

    /// Check if `stream` is active and paused
    pub fn is_paused(&self, stream: StreamId) -> bool {
        lock(&self.state)
            .active
            .get(&stream)
            .is_some_and(|active| active.paused)
    }

    /// Sound an active stream is playing
    pub fn stream_sound(&self, stream: StreamId) -> Option<SoundId> {
        lock(&self.state).active.get(&stream).map(|active| active.sound)
    }

    /// Check if the engine has been released
    pub fn is_released(&self) -> bool {
        lock(&self.state).released
    }
}
