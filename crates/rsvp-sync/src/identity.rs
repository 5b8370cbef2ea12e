use rand::Rng;
use rsvp_contract::{CacheStore, GuestId, HostContext, IDENTITY_KEY};
use std::ops::RangeInclusive;
use tracing::{debug, warn};

/// Range pseudo guest ids are drawn from.
pub const PSEUDO_ID_RANGE: RangeInclusive<i64> = 100_000..=999_999;

/// Resolve the stable guest id for this device.
///
/// The platform id wins and is persisted as canonical. Otherwise a stored
/// pseudo-id is reused, or a fresh one is generated and stored. Never fails:
/// persistence problems are logged and the id is returned anyway.
pub fn resolve_identity(host: &HostContext, store: &dyn CacheStore) -> GuestId {
    resolve_identity_with(host, store, &mut rand::thread_rng())
}

/// [`resolve_identity`] with an explicit random source.
pub fn resolve_identity_with<R: Rng + ?Sized>(
    host: &HostContext,
    store: &dyn CacheStore,
    rng: &mut R,
) -> GuestId {
    if let Some(id) = host.platform_id() {
        persist(store, id);
        return id;
    }

    match store.get(IDENTITY_KEY) {
        Ok(Some(raw)) => match raw.parse::<GuestId>() {
            Ok(id) => return id,
            Err(e) => warn!(error = %e, "stored guest id is not an integer, replacing it"),
        },
        Ok(None) => {}
        Err(e) => warn!(error = %e, "failed to read stored guest id"),
    }

    let id = GuestId::new(rng.gen_range(PSEUDO_ID_RANGE));
    debug!(guest_id = %id, "generated pseudo guest id");
    persist(store, id);
    id
}

fn persist(store: &dyn CacheStore, id: GuestId) {
    if let Err(e) = store.set(IDENTITY_KEY, &id.to_string()) {
        warn!(error = %e, "failed to persist guest id");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rsvp_contract::{CacheError, PlatformUser};
    use rsvp_store_adapters::MemoryCacheStore;

    fn platform_host(id: i64) -> HostContext {
        HostContext {
            user: Some(PlatformUser {
                id: Some(id),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn platform_id_is_returned_and_persisted() {
        let store = MemoryCacheStore::new();
        store.set(IDENTITY_KEY, "123456").unwrap();

        let id = resolve_identity(&platform_host(987654321), &store);
        assert_eq!(id, GuestId::new(987654321));
        assert_eq!(
            store.get(IDENTITY_KEY).unwrap().as_deref(),
            Some("987654321")
        );
    }

    #[test]
    fn pseudo_id_is_stable_across_reloads() {
        let store = MemoryCacheStore::new();
        let host = HostContext::default();
        let mut rng = StdRng::seed_from_u64(7);

        let first = resolve_identity_with(&host, &store, &mut rng);
        assert!(PSEUDO_ID_RANGE.contains(&first.get()));
        let second = resolve_identity_with(&host, &store, &mut rng);
        assert_eq!(first, second);
    }

    #[test]
    fn non_numeric_stored_id_is_replaced() {
        let store = MemoryCacheStore::new();
        store.set(IDENTITY_KEY, "not-a-number").unwrap();

        let id = resolve_identity(&HostContext::default(), &store);
        assert!(PSEUDO_ID_RANGE.contains(&id.get()));
        assert_eq!(store.get(IDENTITY_KEY).unwrap(), Some(id.to_string()));
    }

    struct BrokenStore;

    impl CacheStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
            Err(CacheError::InvalidKey("unavailable".into()))
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), CacheError> {
            Err(CacheError::InvalidKey("unavailable".into()))
        }
    }

    #[test]
    fn storage_failure_still_yields_an_id() {
        let id = resolve_identity(&HostContext::default(), &BrokenStore);
        assert!(PSEUDO_ID_RANGE.contains(&id.get()));
        assert_eq!(
            resolve_identity(&platform_host(42), &BrokenStore),
            GuestId::new(42)
        );
    }
}
