//! # Sound Pool
//!
//! Asynchronous loading and bounded, low-latency playback of short audio
//! clips.
//!
//! ## Features
//!
//! - **Asynchronous Loading**: Decodes run in the background; every load
//!   hands back a [`LoadTicket`](pool::LoadTicket) that settles exactly once
//! - **Bounded Playback**: A fixed number of simultaneous streams per pool
//! - **Synchronized Starts**: Chords start all of their streams or none
//! - **Pluggable Engines**: Rodio output or a headless engine for tests
//! - **Instruments**: Note sample families played through a shared pool
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sound_pool::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let resolver = DirectoryResolver::new("assets/sounds");
//!     let mut pool = PoolController::new(resolver, create_default_engine);
//!     pool.create(6)?;
//!
//!     let sound = pool.load("laser").wait()?;
//!     let stream = pool.play(sound, 0, 1.0, 0.8)?;
//!     pool.stop(stream);
//!     pool.release();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::missing_errors_doc)]

pub mod assets;
pub mod config;
pub mod engine;
pub mod error;
pub mod foundation;
pub mod instrument;
pub mod pool;

pub use error::PoolError;

/// Common imports for pool users
pub mod prelude {
    pub use crate::{
        assets::{AssetResolver, DirectoryResolver, MemoryResolver},
        config::{Config, PlayerOptions, PoolConfig},
        engine::{create_default_engine, DecodeEngine, EngineConfig, SoundId, StreamId},
        instrument::{generate_pitch_list, Instrument, InstrumentError, Player},
        pool::{LoadTicket, PoolController},
        PoolError,
    };
}
