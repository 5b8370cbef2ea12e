use rsvp_contract::{CacheError, CacheKind, CacheStore, GuestId};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

/// Typed, guest-scoped view over a [`CacheStore`].
#[derive(Clone)]
pub struct LocalCache {
    store: Arc<dyn CacheStore>,
}

impl LocalCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &dyn CacheStore {
        self.store.as_ref()
    }

    /// Overwrite the entry for `(kind, guest_id)`.
    pub fn save<T: Serialize + ?Sized>(
        &self,
        kind: CacheKind,
        guest_id: GuestId,
        payload: &T,
    ) -> Result<(), CacheError> {
        let raw = serde_json::to_string(payload)
            .map_err(|e| CacheError::Serialization(e.to_string()))?;
        self.store.set(&kind.key(guest_id), &raw)
    }

    /// Last saved payload, or `None` when nothing is stored or the stored
    /// value cannot be read back.
    pub fn load<T: DeserializeOwned>(&self, kind: CacheKind, guest_id: GuestId) -> Option<T> {
        let key = kind.key(guest_id);
        let raw = match self.store.get(&key) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(error = %e, key = %key, "failed to read cache entry");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(error = %e, key = %key, "ignoring corrupt cache entry");
                None
            }
        }
    }

    /// [`Self::save`] for callers that only log failures.
    pub(crate) fn write_through<T: Serialize + ?Sized>(
        &self,
        kind: CacheKind,
        guest_id: GuestId,
        payload: &T,
    ) {
        if let Err(e) = self.save(kind, guest_id, payload) {
            warn!(error = %e, ?kind, "failed to write cache entry");
        }
    }
}
