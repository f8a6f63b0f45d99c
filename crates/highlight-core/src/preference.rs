//! Persisted platform preference
//!
//! The dashboard remembers the last selected platform between visits. The
//! storage mechanism sits behind [`PreferenceStore`] so the controller does
//! not care whether it is `localStorage`, a file, or memory.

use thiserror::Error;

use crate::platform::Platform;

/// Storage key for the selected platform
pub const PLATFORM_PREFERENCE_KEY: &str = "highlighter.platform";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Preference storage error: {0}")]
pub struct PreferenceError(pub String);

/// A string-valued key/value store for user preferences
pub trait PreferenceStore {
    fn load(&self, key: &str) -> Result<Option<String>, PreferenceError>;
    fn save(&mut self, key: &str, value: &str) -> Result<(), PreferenceError>;
    fn clear(&mut self, key: &str) -> Result<(), PreferenceError>;
}

/// In-memory store, used natively and in tests
#[derive(Debug, Default, Clone)]
pub struct MemoryPreferenceStore {
    entries: std::collections::HashMap<String, String>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn load(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), PreferenceError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&mut self, key: &str) -> Result<(), PreferenceError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Typed view of the platform preference on top of a [`PreferenceStore`]
#[derive(Debug)]
pub struct PlatformPreference<S> {
    store: S,
}

impl<S: PreferenceStore> PlatformPreference<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Read the remembered platform. Unreadable or unknown values count as unset.
    pub fn restore(&self) -> Option<Platform> {
        self.store
            .load(PLATFORM_PREFERENCE_KEY)
            .ok()
            .flatten()
            .and_then(|value| value.parse().ok())
    }

    /// Persist a selection; `None` removes the stored key.
    pub fn remember(&mut self, platform: Option<Platform>) -> Result<(), PreferenceError> {
        match platform {
            Some(p) => self.store.save(PLATFORM_PREFERENCE_KEY, p.as_str()),
            None => self.store.clear(PLATFORM_PREFERENCE_KEY),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remember_and_restore() {
        let mut pref = PlatformPreference::new(MemoryPreferenceStore::new());
        assert_eq!(pref.restore(), None);

        pref.remember(Some(Platform::T360)).unwrap();
        assert_eq!(pref.restore(), Some(Platform::T360));

        pref.remember(Some(Platform::CounselLink)).unwrap();
        assert_eq!(pref.restore(), Some(Platform::CounselLink));
    }

    #[test]
    fn test_clearing_removes_key() {
        let mut pref = PlatformPreference::new(MemoryPreferenceStore::new());
        pref.remember(Some(Platform::T360)).unwrap();
        pref.remember(None).unwrap();

        let store = pref.into_inner();
        assert!(!store.contains(PLATFORM_PREFERENCE_KEY));

        // A fresh session over the same storage starts unselected
        let fresh = PlatformPreference::new(store);
        assert_eq!(fresh.restore(), None);
    }

    #[test]
    fn test_unknown_stored_value_is_unset() {
        let mut store = MemoryPreferenceStore::new();
        store.save(PLATFORM_PREFERENCE_KEY, "Legacy").unwrap();
        assert_eq!(PlatformPreference::new(store).restore(), None);
    }
}
