//! In-process save slots.
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex, PoisonError};

use crate::GameStorage;

/// Save slots held in memory. Clones share the same slots.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slots: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of the occupied slots, sorted.
    #[must_use]
    pub fn slots(&self) -> Vec<String> {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

impl GameStorage for MemoryStorage {
    type Error = Infallible;

    fn save_game(&self, save_name: &str, blob: &str) -> Result<(), Self::Error> {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(save_name.to_string(), blob.to_string());
        Ok(())
    }

    fn load_game(&self, save_name: &str) -> Result<Option<String>, Self::Error> {
        Ok(self
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(save_name)
            .cloned())
    }

    fn delete_save(&self, save_name: &str) -> Result<(), Self::Error> {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(save_name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_slots() {
        let storage = MemoryStorage::new();
        let handle = storage.clone();
        storage.save_game("b", "two").unwrap();
        storage.save_game("a", "one").unwrap();
        assert_eq!(handle.slots(), vec!["a", "b"]);
        assert_eq!(handle.load_game("a").unwrap().as_deref(), Some("one"));
        handle.delete_save("a").unwrap();
        assert!(storage.load_game("a").unwrap().is_none());
    }
}
