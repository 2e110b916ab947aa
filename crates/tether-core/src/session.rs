//! Credential Manager: the single owner of the current session.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::store::{CredentialStore, MemoryStore, Slot};
use crate::tokens::{AccessToken, RefreshToken};

/// Owns the access/refresh token pair and the cached user identity.
///
/// All reads and writes of the session go through this type; it never
/// touches the network. It is cheap to clone (clones share the same store),
/// so one instance can be injected into several executors.
///
/// # Example
///
/// ```
/// use tether_core::{AccessToken, CredentialManager, RefreshToken};
///
/// let credentials = CredentialManager::in_memory();
/// credentials
///     .set_session(AccessToken::new("a1"), Some(RefreshToken::new("r1")))
///     .unwrap();
/// assert!(credentials.is_authenticated().unwrap());
///
/// credentials.clear_session().unwrap();
/// assert!(credentials.access_token().unwrap().is_none());
/// ```
#[derive(Clone)]
pub struct CredentialManager {
    store: Arc<dyn CredentialStore>,
}

impl CredentialManager {
    /// Create a manager over the given store.
    pub fn new(store: impl CredentialStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Create a manager over a shared store.
    pub fn from_shared(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Create a manager backed by a fresh in-memory store.
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    /// The current access token, or `None` when unauthenticated.
    pub fn access_token(&self) -> Result<Option<AccessToken>, StoreError> {
        Ok(self.read(Slot::AccessToken)?.map(AccessToken::new))
    }

    /// The current refresh token, if any.
    pub fn refresh_token(&self) -> Result<Option<RefreshToken>, StoreError> {
        Ok(self.read(Slot::RefreshToken)?.map(RefreshToken::new))
    }

    /// True when an access token is stored.
    pub fn is_authenticated(&self) -> Result<bool, StoreError> {
        Ok(self.access_token()?.is_some())
    }

    /// Persist a new token pair.
    ///
    /// A `None` refresh token keeps the one already stored.
    pub fn set_session(
        &self,
        access_token: AccessToken,
        refresh_token: Option<RefreshToken>,
    ) -> Result<(), StoreError> {
        let mut entries = vec![(Slot::AccessToken, access_token.as_str())];
        if let Some(refresh_token) = &refresh_token {
            entries.push((Slot::RefreshToken, refresh_token.as_str()));
        }
        self.store.set_many(&entries)?;
        debug!("Session tokens stored");
        Ok(())
    }

    /// Erase both tokens and the cached identity. Idempotent.
    ///
    /// Every slot is attempted; the first failure is returned.
    pub fn clear_session(&self) -> Result<(), StoreError> {
        let mut first_err = None;
        for slot in Slot::ALL {
            if let Err(e) = self.store.remove(slot)
                && first_err.is_none()
            {
                first_err = Some(e);
            }
        }
        info!("Session cleared");
        first_err.map_or(Ok(()), Err)
    }

    /// Cache the signed-in user's profile.
    pub fn set_identity(&self, identity: &Value) -> Result<(), StoreError> {
        self.store.set(Slot::Identity, &identity.to_string())
    }

    /// Forget the cached user profile, keeping the tokens.
    pub fn clear_identity(&self) -> Result<(), StoreError> {
        self.store.remove(Slot::Identity)
    }

    /// The cached user profile, if any.
    pub fn identity(&self) -> Result<Option<Value>, StoreError> {
        match self.read(Slot::Identity)? {
            None => Ok(None),
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| StoreError::Corrupt {
                    message: format!("cached identity is not JSON: {}", e),
                }),
        }
    }

    // Empty strings are treated as absent.
    fn read(&self, slot: Slot) -> Result<Option<String>, StoreError> {
        Ok(self.store.get(slot)?.filter(|v| !v.is_empty()))
    }
}

impl Default for CredentialManager {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl fmt::Debug for CredentialManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialManager")
            .field("tokens", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn manager_with(access: &str, refresh: &str) -> CredentialManager {
        let credentials = CredentialManager::in_memory();
        credentials
            .set_session(AccessToken::new(access), Some(RefreshToken::new(refresh)))
            .unwrap();
        credentials
    }

    #[test]
    fn empty_session_is_unauthenticated() {
        let credentials = CredentialManager::in_memory();
        assert!(credentials.access_token().unwrap().is_none());
        assert!(credentials.refresh_token().unwrap().is_none());
        assert!(!credentials.is_authenticated().unwrap());
    }

    #[test]
    fn set_session_without_refresh_keeps_previous() {
        let credentials = manager_with("a1", "r1");
        credentials
            .set_session(AccessToken::new("a2"), None)
            .unwrap();

        assert_eq!(credentials.access_token().unwrap().unwrap().as_str(), "a2");
        assert_eq!(credentials.refresh_token().unwrap().unwrap().as_str(), "r1");
    }

    #[test]
    fn set_session_replaces_both() {
        let credentials = manager_with("a1", "r1");
        credentials
            .set_session(AccessToken::new("a2"), Some(RefreshToken::new("r2")))
            .unwrap();

        assert_eq!(credentials.access_token().unwrap().unwrap().as_str(), "a2");
        assert_eq!(credentials.refresh_token().unwrap().unwrap().as_str(), "r2");
    }

    #[test]
    fn clear_session_is_idempotent() {
        let credentials = manager_with("a1", "r1");
        credentials.set_identity(&json!({"id": 1})).unwrap();

        credentials.clear_session().unwrap();
        credentials.clear_session().unwrap();

        assert!(credentials.access_token().unwrap().is_none());
        assert!(credentials.refresh_token().unwrap().is_none());
        assert!(credentials.identity().unwrap().is_none());
    }

    #[test]
    fn clones_share_state() {
        let credentials = CredentialManager::in_memory();
        let other = credentials.clone();
        credentials
            .set_session(AccessToken::new("a1"), None)
            .unwrap();
        assert!(other.is_authenticated().unwrap());
    }

    #[test]
    fn identity_roundtrip_and_corruption() {
        let store = Arc::new(MemoryStore::new());
        let credentials = CredentialManager::from_shared(store.clone());
        credentials
            .set_identity(&json!({"id": 3, "role": "admin"}))
            .unwrap();
        assert_eq!(
            credentials.identity().unwrap(),
            Some(json!({"id": 3, "role": "admin"}))
        );

        store.set(Slot::Identity, "{not json").unwrap();
        assert!(matches!(
            credentials.identity(),
            Err(StoreError::Corrupt { .. })
        ));
    }

    /// Accepts only batched writes, so a pair split across two `set` calls
    /// fails loudly.
    #[derive(Default)]
    struct BatchOnlyStore {
        inner: MemoryStore,
        batches: std::sync::Mutex<Vec<Vec<Slot>>>,
    }

    impl CredentialStore for BatchOnlyStore {
        fn get(&self, slot: Slot) -> Result<Option<String>, StoreError> {
            self.inner.get(slot)
        }

        fn set(&self, slot: Slot, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable {
                message: format!("unbatched write to {}", slot),
            })
        }

        fn set_many(&self, entries: &[(Slot, &str)]) -> Result<(), StoreError> {
            self.batches
                .lock()
                .unwrap()
                .push(entries.iter().map(|(slot, _)| *slot).collect());
            self.inner.set_many(entries)
        }

        fn remove(&self, slot: Slot) -> Result<(), StoreError> {
            self.inner.remove(slot)
        }
    }

    #[test]
    fn token_pair_is_written_in_one_batch() {
        let store = Arc::new(BatchOnlyStore::default());
        let credentials = CredentialManager::from_shared(store.clone());

        credentials
            .set_session(AccessToken::new("a1"), Some(RefreshToken::new("r1")))
            .unwrap();
        credentials.set_session(AccessToken::new("a2"), None).unwrap();

        let batches = store.batches.lock().unwrap().clone();
        assert_eq!(
            batches,
            vec![
                vec![Slot::AccessToken, Slot::RefreshToken],
                vec![Slot::AccessToken]
            ]
        );
        assert_eq!(credentials.access_token().unwrap().unwrap().as_str(), "a2");
        assert_eq!(credentials.refresh_token().unwrap().unwrap().as_str(), "r1");
    }

    #[test]
    fn clear_identity_keeps_tokens() {
        let credentials = manager_with("a1", "r1");
        credentials.set_identity(&json!({"id": 1})).unwrap();

        credentials.clear_identity().unwrap();
        credentials.clear_identity().unwrap();

        assert!(credentials.identity().unwrap().is_none());
        assert!(credentials.is_authenticated().unwrap());
    }

    #[test]
    fn debug_hides_tokens() {
        let credentials = manager_with("secret-access", "secret-refresh");
        let debug = format!("{:?}", credentials);
        assert!(!debug.contains("secret"));
    }
}
