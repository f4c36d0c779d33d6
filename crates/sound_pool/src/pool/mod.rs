//! Sound pool: asynchronous loading and bounded playback
//!
//! The controller coordinates three pieces of bookkeeping:
//! - [`AssetRegistry`]: asset name to engine sound id
//! - [`ReadinessSet`]: sounds that finished decoding and may be played
//! - `PendingCompletions`: the caller waiting on each in-flight decode

mod controller;
mod pending;
pub mod readiness;
pub mod registry;
mod ticket;

pub use controller::PoolController;
pub use readiness::ReadinessSet;
pub use registry::AssetRegistry;
pub use ticket::{LoadOutcome, LoadTicket};
