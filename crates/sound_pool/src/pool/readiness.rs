//! Set of sounds confirmed playable

use crate::engine::SoundId;
use std::collections::HashSet;

/// Sounds whose decode completed successfully
#[derive(Debug, Default)]
pub struct ReadinessSet {
    ready: HashSet<SoundId>,
}

impl ReadinessSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `sound` ready
    pub fn insert(&mut self, sound: SoundId) {
        self.ready.insert(sound);
    }

    /// Remove `sound`, returning whether it was ready
    pub fn remove(&mut self, sound: SoundId) -> bool {
        self.ready.remove(&sound)
    }

    /// Check if `sound` is ready for playback
    pub fn contains(&self, sound: SoundId) -> bool {
        self.ready.contains(&sound)
    }

    /// First sound in `sounds` that is not ready, in input order
    pub fn first_missing(&self, sounds: &[SoundId]) -> Option<SoundId> {
        sounds.iter().copied().find(|sound| !self.contains(*sound))
    }

    /// Forget every ready sound
    pub fn clear(&mut self) {
        self.ready.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_remove() {
        let mut set = ReadinessSet::new();
        set.insert(SoundId(3));
        assert!(set.contains(SoundId(3)));
        assert!(set.remove(SoundId(3)));
        assert!(!set.remove(SoundId(3)));
        assert!(!set.contains(SoundId(3)));
    }

    #[test]
    fn test_first_missing_respects_order() {
        let mut set = ReadinessSet::new();
        set.insert(SoundId(1));
        set.insert(SoundId(4));

        assert_eq!(set.first_missing(&[SoundId(1), SoundId(4)]), None);
        assert_eq!(set.first_missing(&[SoundId(1), SoundId(3), SoundId(2)]), Some(SoundId(3)));
        assert_eq!(set.first_missing(&[]), None);
    }
}
