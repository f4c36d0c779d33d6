//! Pool lifecycle and playback operations
//!
//! [`PoolController`] owns at most one live pool. A pool bundles a decode
//! engine with the ledger of asset registrations, ready sounds and pending
//! completions. The ledger sits behind a single mutex because the engine
//! reports decode completions from its own threads while the caller keeps
//! issuing operations.
//!
//! # Example
//!
//! ```
//! use sound_pool::assets::MemoryResolver;
//! use sound_pool::engine::headless::HeadlessEngine;
//! use sound_pool::engine::{DecodeEngine, EngineConfig};
//! use sound_pool::pool::PoolController;
//! use sound_pool::PoolError;
//!
//! let resolver = MemoryResolver::new().with("explosion", b"RIFF....WAVE".to_vec());
//! let factory = |config: &EngineConfig| -> Result<Box<dyn DecodeEngine>, PoolError> {
//!     Ok(Box::new(HeadlessEngine::threaded(config)))
//! };
//! let mut pool = PoolController::new(resolver, factory);
//! pool.create(4).unwrap();
//!
//! let sound = pool.load("explosion").wait().unwrap();
//! let stream = pool.play(sound, 0, 1.0, 1.0).unwrap();
//! pool.stop(stream);
//! pool.release();
//! ```

use super::pending::PendingCompletions;
use super::readiness::ReadinessSet;
use super::registry::AssetRegistry;
use super::ticket::LoadTicket;
use crate::assets::{AssetResolver, ResolveError};
use crate::config::PoolConfig;
use crate::engine::{DecodeEngine, EngineFactory, PlayParams, SoundId, StreamId, LOAD_SUCCESS};
use crate::error::PoolError;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Bookkeeping shared with the engine's completion listener
#[derive(Debug, Default)]
struct Ledger {
    registry: AssetRegistry,
    readiness: ReadinessSet,
    pending: PendingCompletions,
}

impl Ledger {
    /// Apply a decode completion reported by the engine
    fn complete(&mut self, sound: SoundId, status: i32) {
        let Some(pending) = self.pending.take(sound) else {
            log::debug!("Ignoring completion for sound {} with no pending load", sound);
            return;
        };

        if status == LOAD_SUCCESS {
            self.readiness.insert(sound);
            log::debug!("Loaded {} as sound {}", pending.name, sound);
            pending.settle(Ok(sound));
        } else {
            log::warn!("Failed to load {} with status {}", pending.name, status);
            let name = pending.name.clone();
            pending.settle(Err(PoolError::DecodeFailed { name, status }));
        }
    }

    /// Reject every pending load and forget all registrations
    fn clear(&mut self) {
        for pending in self.pending.drain() {
            log::warn!("Pool released while {} was loading", pending.name);
            let name = pending.name.clone();
            pending.settle(Err(PoolError::Released(name)));
        }
        self.registry.clear();
        self.readiness.clear();
    }
}

fn lock(ledger: &Mutex<Ledger>) -> MutexGuard<'_, Ledger> {
    // Every mutation leaves the ledger consistent, so a poisoned lock is still usable
    ledger.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One live pool instance
struct Pool {
    engine: Box<dyn DecodeEngine>,
    ledger: Arc<Mutex<Ledger>>,
    config: PoolConfig,
}

/// Owner of the single live sound pool
pub struct PoolController {
    resolver: Box<dyn AssetResolver>,
    factory: Box<dyn EngineFactory>,
    defaults: PoolConfig,
    pool: Option<Pool>,
}

impl PoolController {
    /// Create a controller with no live pool
    ///
    /// # Arguments
    /// * `resolver` - Maps asset names to clip bytes
    /// * `factory` - Builds a fresh engine on every `create`
    pub fn new(resolver: impl AssetResolver + 'static, factory: impl EngineFactory + 'static) -> Self {
        Self::with_config(resolver, factory, PoolConfig::default())
    }

    /// Create a controller whose pools use `defaults` for priorities
    pub fn with_config(
        resolver: impl AssetResolver + 'static,
        factory: impl EngineFactory + 'static,
        defaults: PoolConfig,
    ) -> Self {
        Self {
            resolver: Box::new(resolver),
            factory: Box::new(factory),
            defaults,
            pool: None,
        }
    }

    /// Create a pool allowing `max_streams` simultaneous streams
    ///
    /// Any live pool is released first.
    ///
    /// # Errors
    /// - `EngineInit` if the engine factory fails
    pub fn create(&mut self, max_streams: u32) -> Result<(), PoolError> {
        let config = PoolConfig {
            max_streams,
            ..self.defaults
        };
        self.create_with(&config)
    }

    /// Create a pool from a full configuration, releasing any live pool first
    ///
    /// # Errors
    /// - `EngineInit` if the engine factory fails
    pub fn create_with(&mut self, config: &PoolConfig) -> Result<(), PoolError> {
        if self.pool.is_some() {
            self.release();
        }

        let mut engine = self.factory.build(&config.engine())?;
        let ledger = Arc::new(Mutex::new(Ledger::default()));

        // The listener only holds a weak reference so completions that
        // outlive the pool find nothing to update
        let weak = Arc::downgrade(&ledger);
        engine.set_completion_listener(Arc::new(move |sound: SoundId, status: i32| {
            match weak.upgrade() {
                Some(ledger) => lock(&ledger).complete(sound, status),
                None => log::debug!("Completion for sound {} arrived after release", sound),
            }
        }));

        self.defaults = *config;
        self.pool = Some(Pool {
            engine,
            ledger,
            config: *config,
        });
        log::info!("Created sound pool with {} max streams", config.max_streams);
        Ok(())
    }

    /// Release the live pool
    ///
    /// Loads still waiting on the engine are rejected with `Released`.
    pub fn release(&mut self) {
        let Some(mut pool) = self.pool.take() else {
            log::warn!("Release requested with no live sound pool");
            return;
        };

        lock(&pool.ledger).clear();
        pool.engine.release();
        log::info!("Released sound pool");
    }

    /// Load the asset named `name`
    ///
    /// The returned ticket resolves with the sound id once the engine has
    /// decoded the asset. Assets that are already ready resolve immediately.
    ///
    /// The ticket is rejected with:
    /// - `NoPool` if no pool is live
    /// - `StillLoading` if an earlier load of `name` has not completed
    /// - `PreviouslyFailed` if an earlier load of `name` failed to decode
    /// - `ResourceNotFound` if the resolver has no such asset
    /// - `DecodeFailed` if the engine reports a nonzero status
    pub fn load(&mut self, name: &str) -> LoadTicket {
        let Some(pool) = self.pool.as_mut() else {
            return LoadTicket::settled(Err(PoolError::NoPool));
        };

        {
            let ledger = lock(&pool.ledger);
            if let Some(sound) = ledger.registry.lookup(name) {
                let outcome = if ledger.readiness.contains(sound) {
                    Ok(sound)
                } else if ledger.pending.contains(sound) {
                    Err(PoolError::StillLoading(name.to_string()))
                } else {
                    Err(PoolError::PreviouslyFailed(name.to_string()))
                };
                return LoadTicket::settled(outcome);
            }
        }

        let bytes = match self.resolver.resolve(name) {
            Ok(bytes) => bytes,
            Err(ResolveError::NotFound(_)) => {
                log::warn!("Resource not found: {}", name);
                return LoadTicket::settled(Err(PoolError::ResourceNotFound(name.to_string())));
            }
            Err(e) => {
                log::warn!("Failed to read resource {}: {}", name, e);
                return LoadTicket::settled(Err(PoolError::ResourceNotFound(name.to_string())));
            }
        };

        let (waiter, ticket) = LoadTicket::pending();

        // Hold the ledger across submission so the completion cannot be
        // handled before the pending entry exists
        let mut ledger = lock(&pool.ledger);
        let sound = pool.engine.submit(bytes, pool.config.load_priority);
        if let Err(waiter) = ledger.pending.insert(sound, name, waiter) {
            log::error!("Engine reissued sound {} while it was still loading", sound);
            let _ = waiter.send(Err(PoolError::StillLoading(name.to_string())));
            return ticket;
        }
        ledger.registry.record(name, sound);
        log::debug!("Submitted {} as sound {}", name, sound);

        ticket
    }

    /// Unload a ready sound
    ///
    /// Unknown or already unloaded sounds are ignored. The name registration
    /// is forgotten too, so a later `load` of the same name decodes afresh.
    /// Sounds whose decode failed are forgotten the same way.
    pub fn unload(&mut self, sound: SoundId) {
        let Some(pool) = self.pool.as_mut() else {
            log::warn!("Unload of sound {} with no live sound pool", sound);
            return;
        };

        let mut ledger = lock(&pool.ledger);
        if ledger.readiness.remove(sound) {
            pool.engine.unload(sound);
            ledger.registry.forget(sound);
            log::debug!("Unloaded sound {}", sound);
        } else if !ledger.pending.contains(sound) {
            if let Some(name) = ledger.registry.forget(sound) {
                pool.engine.unload(sound);
                log::debug!("Forgot failed load of {} (sound {})", name, sound);
            }
        }
    }

    /// Start playing a ready sound
    ///
    /// # Arguments
    /// * `sound` - Sound returned by `load`
    /// * `loops` - Extra repetitions (-1 = loop forever)
    /// * `rate` - Playback rate (1.0 = original speed)
    /// * `gain` - Gain applied to both channels
    ///
    /// # Errors
    /// - `NoPool` if no pool is live
    /// - `NotLoaded` if the sound is not ready
    /// - `InternalError` if the engine could not allocate a stream
    pub fn play(&mut self, sound: SoundId, loops: i32, rate: f32, gain: f32) -> Result<StreamId, PoolError> {
        let pool = self.pool.as_mut().ok_or(PoolError::NoPool)?;

        if !lock(&pool.ledger).readiness.contains(sound) {
            return Err(PoolError::NotLoaded(sound));
        }

        let params = play_params(&pool.config, loops, rate, gain);
        start_stream(pool.engine.as_mut(), sound, params)
    }

    /// Start several ready sounds back to back
    ///
    /// Every sound is checked before any stream starts; if one is not
    /// ready, nothing plays. Streams are then started in input order with
    /// no work in between. This is a best-effort approximation of a
    /// simultaneous start, not an atomic one: if the engine runs out of
    /// streams partway, the call fails and the streams already started
    /// keep playing.
    ///
    /// # Errors
    /// - `NoPool` if no pool is live
    /// - `NotLoaded` naming the first sound that is not ready
    /// - `InternalError` naming the sound that could not get a stream
    pub fn play_synchronized(
        &mut self,
        sounds: &[SoundId],
        loops: i32,
        rate: f32,
        gain: f32,
    ) -> Result<Vec<StreamId>, PoolError> {
        let pool = self.pool.as_mut().ok_or(PoolError::NoPool)?;

        if let Some(missing) = lock(&pool.ledger).readiness.first_missing(sounds) {
            return Err(PoolError::NotLoaded(missing));
        }

        let params = play_params(&pool.config, loops, rate, gain);
        start_streams(pool.engine.as_mut(), sounds, params).map_err(|(_started, e)| e)
    }

    /// Start several ready sounds as one chord
    ///
    /// Behaves like [`play_synchronized`](Self::play_synchronized) except
    /// when the engine runs out of streams partway: the streams already
    /// started are stopped again, so either every sound plays or none does.
    ///
    /// # Errors
    /// - `NoPool` if no pool is live
    /// - `NotLoaded` naming the first sound that is not ready
    /// - `InternalError` naming the sound that could not get a stream
    pub fn play_chord(
        &mut self,
        sounds: &[SoundId],
        loops: i32,
        rate: f32,
        gain: f32,
    ) -> Result<Vec<StreamId>, PoolError> {
        let pool = self.pool.as_mut().ok_or(PoolError::NoPool)?;

        if let Some(missing) = lock(&pool.ledger).readiness.first_missing(sounds) {
            return Err(PoolError::NotLoaded(missing));
        }

        let params = play_params(&pool.config, loops, rate, gain);
        start_streams(pool.engine.as_mut(), sounds, params).map_err(|(started, e)| {
            for stream in started {
                pool.engine.stop(stream);
            }
            e
        })
    }

    /// Stop a stream
    pub fn stop(&mut self, stream: StreamId) {
        if let Some(pool) = self.pool.as_mut() {
            pool.engine.stop(stream);
        }
    }

    /// Pause a stream
    pub fn pause(&mut self, stream: StreamId) {
        if let Some(pool) = self.pool.as_mut() {
            pool.engine.pause(stream);
        }
    }

    /// Resume a paused stream
    pub fn resume(&mut self, stream: StreamId) {
        if let Some(pool) = self.pool.as_mut() {
            pool.engine.resume(stream);
        }
    }

    /// Pause every active stream in the pool
    pub fn suspend_all(&mut self) {
        if let Some(pool) = self.pool.as_mut() {
            pool.engine.pause_all();
        }
    }

    /// Resume every stream paused by [`suspend_all`](Self::suspend_all)
    pub fn resume_all(&mut self) {
        if let Some(pool) = self.pool.as_mut() {
            pool.engine.resume_all();
        }
    }

    /// Check if a pool is live
    pub fn is_live(&self) -> bool {
        self.pool.is_some()
    }

    /// Stream limit of the live pool
    pub fn max_streams(&self) -> Option<u32> {
        self.pool.as_ref().map(|pool| pool.config.max_streams)
    }

    /// Check if `sound` is ready for playback
    pub fn is_loaded(&self, sound: SoundId) -> bool {
        self.pool
            .as_ref()
            .is_some_and(|pool| lock(&pool.ledger).readiness.contains(sound))
    }

    /// Sound id registered for `name`, whether ready, loading or failed
    pub fn sound_id(&self, name: &str) -> Option<SoundId> {
        self.pool
            .as_ref()
            .and_then(|pool| lock(&pool.ledger).registry.lookup(name))
    }

    /// Number of loads waiting on the engine
    pub fn pending_count(&self) -> usize {
        self.pool
            .as_ref()
            .map_or(0, |pool| lock(&pool.ledger).pending.len())
    }
}

impl Drop for PoolController {
    fn drop(&mut self) {
        if self.pool.is_some() {
            self.release();
        }
    }
}

fn play_params(config: &PoolConfig, loops: i32, rate: f32, gain: f32) -> PlayParams {
    PlayParams {
        left_gain: gain,
        right_gain: gain,
        priority: config.play_priority,
        loops,
        rate,
    }
}

fn start_stream(engine: &mut dyn DecodeEngine, sound: SoundId, params: PlayParams) -> Result<StreamId, PoolError> {
    let stream = engine.play(sound, params);
    if stream.is_valid() {
        Ok(stream)
    } else {
        log::warn!("Engine could not allocate a stream for sound {}", sound);
        Err(PoolError::InternalError(sound))
    }
}

/// Start `sounds` back to back in input order
///
/// On failure the streams started so far are handed back with the error.
fn start_streams(
    engine: &mut dyn DecodeEngine,
    sounds: &[SoundId],
    params: PlayParams,
) -> Result<Vec<StreamId>, (Vec<StreamId>, PoolError)> {
    let mut streams = Vec::with_capacity(sounds.len());
    for &sound in sounds {
        match start_stream(engine, sound, params) {
            Ok(stream) => streams.push(stream),
            Err(e) => return Err((streams, e)),
        }
    }
    Ok(streams)
}
