//! Callers awaiting decode completions

use super::ticket::{LoadOutcome, LoadSender};
use crate::engine::SoundId;
use std::collections::HashMap;

/// A load waiting for its engine completion
#[derive(Debug)]
pub(crate) struct PendingLoad {
    /// Name the caller asked for
    pub name: String,
    waiter: LoadSender,
}

impl PendingLoad {
    /// Settle the caller's ticket
    pub fn settle(self, outcome: LoadOutcome) {
        if self.waiter.send(outcome).is_err() {
            log::debug!("Load of {} settled after its ticket was dropped", self.name);
        }
    }
}

/// Mapping from sound id to the single caller awaiting its decode
#[derive(Debug, Default)]
pub(crate) struct PendingCompletions {
    waiting: HashMap<SoundId, PendingLoad>,
}

impl PendingCompletions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the caller awaiting `sound`
    ///
    /// At most one caller may wait per sound. A second registration is
    /// refused and its sender handed back.
    pub fn insert(&mut self, sound: SoundId, name: &str, waiter: LoadSender) -> Result<(), LoadSender> {
        if self.waiting.contains_key(&sound) {
            return Err(waiter);
        }
        self.waiting.insert(
            sound,
            PendingLoad {
                name: name.to_string(),
                waiter,
            },
        );
        Ok(())
    }

    /// Remove and return the caller awaiting `sound`
    pub fn take(&mut self, sound: SoundId) -> Option<PendingLoad> {
        self.waiting.remove(&sound)
    }

    pub fn contains(&self, sound: SoundId) -> bool {
        self.waiting.contains_key(&sound)
    }

    pub fn len(&self) -> usize {
        self.waiting.len()
    }

    /// Remove every pending caller
    pub fn drain(&mut self) -> Vec<PendingLoad> {
        self.waiting.drain().map(|(_, pending)| pending).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PoolError;
    use crate::pool::ticket::LoadTicket;

    #[test]
    fn test_single_waiter_per_sound() {
        let mut pending = PendingCompletions::new();
        let (first, _first_ticket) = LoadTicket::pending();
        let (second, _second_ticket) = LoadTicket::pending();

        assert!(pending.insert(SoundId(1), "a", first).is_ok());
        assert!(pending.insert(SoundId(1), "b", second).is_err());
        assert_eq!(pending.len(), 1);
    }

    #[test]
    fn test_take_settles_once() {
        let mut pending = PendingCompletions::new();
        let (sender, mut ticket) = LoadTicket::pending();
        pending.insert(SoundId(5), "explosion", sender).unwrap();

        let entry = pending.take(SoundId(5)).unwrap();
        assert_eq!(entry.name, "explosion");
        entry.settle(Ok(SoundId(5)));

        assert!(pending.take(SoundId(5)).is_none());
        assert!(!pending.contains(SoundId(5)));
        assert_eq!(ticket.try_outcome(), Some(Ok(SoundId(5))));
    }

    #[test]
    fn test_drain_empties() {
        let mut pending = PendingCompletions::new();
        let (sender, ticket) = LoadTicket::pending();
        pending.insert(SoundId(2), "laser", sender).unwrap();

        for entry in pending.drain() {
            let name = entry.name.clone();
            entry.settle(Err(PoolError::Released(name)));
        }
        assert_eq!(pending.len(), 0);
        assert_eq!(ticket.wait(), Err(PoolError::Released("laser".into())));
    }
}
