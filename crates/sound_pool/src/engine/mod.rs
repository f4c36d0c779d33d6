//! Decode engine implementations
//!
//! Platform-independent abstraction over the component that decodes clip
//! bytes and mixes playback streams. The pool only ever talks to
//! [`DecodeEngine`]; concrete engines live in the submodules.

pub mod headless;
#[cfg(feature = "rodio")]
pub mod rodio_engine;

use crate::error::PoolError;
use std::fmt;
use std::sync::Arc;

/// Handle to a decoded (or decoding) sound, issued by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SoundId(pub u32);

impl fmt::Display for SoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle to one active playback stream
///
/// Stream ids may be reused by the engine once a stream has ended, so they
/// only identify a stream for as long as it is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamId(pub u32);

impl StreamId {
    /// Sentinel returned by engines that could not start a stream
    pub const NONE: Self = Self(0);

    /// Check if this handle refers to a started stream
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status value engines report for a successful decode
pub const LOAD_SUCCESS: i32 = 0;

/// Callback invoked by the engine when a submitted sound finishes decoding
///
/// Receives the sound id returned from [`DecodeEngine::submit`] and the
/// engine status (`0` on success). May be called from any thread.
pub type CompletionListener = Arc<dyn Fn(SoundId, i32) + Send + Sync>;

/// Parameters for starting a stream
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayParams {
    /// Left channel gain (0.0 to 1.0)
    pub left_gain: f32,
    /// Right channel gain (0.0 to 1.0)
    pub right_gain: f32,
    /// Stream priority
    pub priority: i32,
    /// Extra repetitions after the first pass (-1 = loop forever)
    pub loops: i32,
    /// Playback rate (1.0 = original speed)
    pub rate: f32,
}

/// Decode and mixing engine contract
///
/// # Threading
/// Engines are driven from a single caller-facing sequence and need not be
/// `Send`. Only the completion listener crosses threads. An engine must
/// never invoke the listener synchronously from inside [`submit`]; the pool
/// holds its bookkeeping lock across that call.
///
/// [`submit`]: DecodeEngine::submit
pub trait DecodeEngine {
    /// Install the listener that receives decode completions
    fn set_completion_listener(&mut self, listener: CompletionListener);

    /// Submit encoded bytes for decoding, returning a provisional sound id
    fn submit(&mut self, bytes: Vec<u8>, priority: i32) -> SoundId;

    /// Drop the decoded data of a sound
    fn unload(&mut self, sound: SoundId);

    /// Start a stream, returning [`StreamId::NONE`] when none can be allocated
    fn play(&mut self, sound: SoundId, params: PlayParams) -> StreamId;

    /// Stop a stream (unknown streams are ignored)
    fn stop(&mut self, stream: StreamId);

    /// Pause a stream (unknown streams are ignored)
    fn pause(&mut self, stream: StreamId);

    /// Resume a paused stream (unknown streams are ignored)
    fn resume(&mut self, stream: StreamId);

    /// Pause every active stream
    fn pause_all(&mut self);

    /// Resume every stream paused by [`pause_all`](DecodeEngine::pause_all)
    fn resume_all(&mut self);

    /// Release all engine resources
    fn release(&mut self);
}

/// Configuration for engine construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Maximum number of simultaneous streams
    pub max_streams: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { max_streams: 6 }
    }
}

/// Builds a fresh engine for every pool instance
pub trait EngineFactory {
    /// Construct an engine configured for `config`
    fn build(&self, config: &EngineConfig) -> Result<Box<dyn DecodeEngine>, PoolError>;
}

impl<F> EngineFactory for F
where
    F: Fn(&EngineConfig) -> Result<Box<dyn DecodeEngine>, PoolError>,
{
    fn build(&self, config: &EngineConfig) -> Result<Box<dyn DecodeEngine>, PoolError> {
        self(config)
    }
}

/// Create the default engine for the platform
///
/// Uses the rodio output device when the `rodio` feature is enabled,
/// otherwise a headless engine that decodes on background threads.
pub fn create_default_engine(config: &EngineConfig) -> Result<Box<dyn DecodeEngine>, PoolError> {
    #[cfg(feature = "rodio")]
    {
        let engine = rodio_engine::RodioEngine::new(config)?;
        Ok(Box::new(engine))
    }
    #[cfg(not(feature = "rodio"))]
    {
        Ok(Box::new(headless::HeadlessEngine::threaded(config)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_sentinel() {
        assert!(!StreamId::NONE.is_valid());
        assert!(StreamId(3).is_valid());
    }

    #[test]
    fn test_closure_factory() {
        let factory = |config: &EngineConfig| -> Result<Box<dyn DecodeEngine>, PoolError> {
            Ok(Box::new(headless::HeadlessEngine::manual(config)))
        };
        assert!(factory.build(&EngineConfig::default()).is_ok());
    }

    #[test]
    fn test_default_engine_builds() {
        // The rodio engine needs an output device, which CI may not have
        if cfg!(not(feature = "rodio")) {
            assert!(create_default_engine(&EngineConfig { max_streams: 2 }).is_ok());
        }
    }
}
