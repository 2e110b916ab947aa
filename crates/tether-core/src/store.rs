//! Credential store abstraction.

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use crate::error::StoreError;

/// Named slots persisted by a credential store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    AccessToken,
    RefreshToken,
    /// Cached profile of the signed-in user, as a JSON document.
    Identity,
}

impl Slot {
    pub const ALL: [Slot; 3] = [Slot::AccessToken, Slot::RefreshToken, Slot::Identity];

    /// Stable key used by persistent stores.
    pub fn key(self) -> &'static str {
        match self {
            Slot::AccessToken => "access_token",
            Slot::RefreshToken => "refresh_token",
            Slot::Identity => "identity",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Synchronous, process-local key-value storage for session credentials.
pub trait CredentialStore: Send + Sync {
    fn get(&self, slot: Slot) -> Result<Option<String>, StoreError>;

    fn set(&self, slot: Slot, value: &str) -> Result<(), StoreError>;

    /// Write several slots as one update.
    ///
    /// Persistent stores override this so that readers never observe a
    /// partially written set. The default writes slot by slot.
    fn set_many(&self, entries: &[(Slot, &str)]) -> Result<(), StoreError> {
        for (slot, value) in entries {
            self.set(*slot, value)?;
        }
        Ok(())
    }

    /// Remove a slot. Removing an empty slot is not an error.
    fn remove(&self, slot: Slot) -> Result<(), StoreError>;
}

/// In-memory credential store.
#[derive(Default)]
pub struct MemoryStore {
    slots: RwLock<HashMap<Slot, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable {
        message: "memory store lock poisoned".to_string(),
    }
}

impl CredentialStore for MemoryStore {
    fn get(&self, slot: Slot) -> Result<Option<String>, StoreError> {
        let slots = self.slots.read().map_err(|_| poisoned())?;
        Ok(slots.get(&slot).cloned())
    }

    fn set(&self, slot: Slot, value: &str) -> Result<(), StoreError> {
        let mut slots = self.slots.write().map_err(|_| poisoned())?;
        slots.insert(slot, value.to_string());
        Ok(())
    }

    fn set_many(&self, entries: &[(Slot, &str)]) -> Result<(), StoreError> {
        let mut slots = self.slots.write().map_err(|_| poisoned())?;
        for (slot, value) in entries {
            slots.insert(*slot, value.to_string());
        }
        Ok(())
    }

    fn remove(&self, slot: Slot) -> Result<(), StoreError> {
        let mut slots = self.slots.write().map_err(|_| poisoned())?;
        slots.remove(&slot);
        Ok(())
    }
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("slots", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get(Slot::AccessToken).unwrap(), None);

        store.set(Slot::AccessToken, "a1").unwrap();
        assert_eq!(store.get(Slot::AccessToken).unwrap().as_deref(), Some("a1"));
        assert_eq!(store.get(Slot::RefreshToken).unwrap(), None);

        store.remove(Slot::AccessToken).unwrap();
        store.remove(Slot::AccessToken).unwrap();
        assert_eq!(store.get(Slot::AccessToken).unwrap(), None);
    }

    #[test]
    fn slot_keys_are_stable() {
        let keys: Vec<_> = Slot::ALL.iter().map(|s| s.key()).collect();
        assert_eq!(keys, ["access_token", "refresh_token", "identity"]);
    }
}
