//! Error types surfaced by the sound pool

use crate::engine::SoundId;
use thiserror::Error;

/// Errors reported by [`PoolController`](crate::pool::PoolController) operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// No pool instance is live (call `create` first)
    #[error("No sound pool has been created")]
    NoPool,

    /// The asset name did not resolve to any resource
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// The decode engine reported a nonzero completion status
    #[error("Failed to load {name} with status {status}")]
    DecodeFailed {
        /// Name the caller asked for
        name: String,
        /// Status reported by the engine
        status: i32,
    },

    /// The name is already being decoded for an earlier caller
    #[error("Sound loading: {0}")]
    StillLoading(String),

    /// The name was decoded before and the engine rejected it
    #[error("Sound failed to load previously: {0}")]
    PreviouslyFailed(String),

    /// The sound is not ready for playback
    #[error("Sound not loaded {0}")]
    NotLoaded(SoundId),

    /// The engine could not allocate a stream
    #[error("Internal error: no stream available for sound {0}")]
    InternalError(SoundId),

    /// The pool was released before the load completed
    #[error("Pool released while {0} was loading")]
    Released(String),

    /// The completion channel closed without delivering an outcome
    #[error("Load abandoned without an outcome")]
    Abandoned,

    /// The decode engine could not be constructed
    #[error("Engine initialization failed: {0}")]
    EngineInit(String),
}
