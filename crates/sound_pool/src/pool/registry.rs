//! Name to sound id bookkeeping

use crate::engine::SoundId;
use std::collections::HashMap;

/// Mapping from asset name to the sound id the engine assigned it
///
/// A name maps to at most one sound, and the reverse index lets unload
/// forget a registration by sound id.
#[derive(Debug, Default)]
pub struct AssetRegistry {
    by_name: HashMap<String, SoundId>,
    by_sound: HashMap<SoundId, String>,
}

impl AssetRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Sound id recorded for `name`
    pub fn lookup(&self, name: &str) -> Option<SoundId> {
        self.by_name.get(name).copied()
    }

    /// Record `name -> sound`
    ///
    /// Callers must check [`lookup`](Self::lookup) first; an existing
    /// registration for the name is replaced.
    pub fn record(&mut self, name: &str, sound: SoundId) {
        if let Some(previous) = self.by_name.insert(name.to_string(), sound) {
            self.by_sound.remove(&previous);
        }
        self.by_sound.insert(sound, name.to_string());
    }

    /// Forget the registration of `sound`, returning its name
    pub fn forget(&mut self, sound: SoundId) -> Option<String> {
        let name = self.by_sound.remove(&sound)?;
        self.by_name.remove(&name);
        Some(name)
    }

    /// Forget every registration
    pub fn clear(&mut self) {
        self.by_name.clear();
        self.by_sound.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_lookup() {
        let mut registry = AssetRegistry::new();
        registry.record("explosion", SoundId(7));

        assert_eq!(registry.lookup("explosion"), Some(SoundId(7)));
        assert_eq!(registry.lookup("laser"), None);
    }

    #[test]
    fn test_forget_removes_both_directions() {
        let mut registry = AssetRegistry::new();
        registry.record("explosion", SoundId(7));

        assert_eq!(registry.forget(SoundId(7)).as_deref(), Some("explosion"));
        assert_eq!(registry.lookup("explosion"), None);
        assert!(registry.forget(SoundId(7)).is_none());
    }

    #[test]
    fn test_rerecord_drops_stale_reverse_entry() {
        let mut registry = AssetRegistry::new();
        registry.record("explosion", SoundId(1));
        registry.record("explosion", SoundId(2));

        assert_eq!(registry.forget(SoundId(1)), None);
        assert_eq!(registry.lookup("explosion"), Some(SoundId(2)));
    }
}
