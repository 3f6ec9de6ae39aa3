//! In-memory identity → display-name cache.
//!
//! Hydrated fully from the store at process start, appended to on each
//! successful enrollment, never evicted. An identity present in the
//! trained model but absent here resolves to the "Unknown" sentinel
//! rather than an error.

use crate::db::{AttendanceStore, StoreError};
use std::collections::HashMap;

/// Sentinel display name for identities not present in the cache.
pub const UNKNOWN_NAME: &str = "Unknown";

/// Read-optimized shadow of the store's user set.
#[derive(Debug, Default)]
pub struct IdentityCache {
    names: HashMap<i64, String>,
}

impl IdentityCache {
    /// Read the full identity set from the store, once, at startup.
    pub fn hydrate(store: &AttendanceStore) -> Result<Self, StoreError> {
        let mut names = HashMap::new();
        for user in store.list_users()? {
            names.insert(user.id, user.name);
        }
        tracing::info!(identities = names.len(), "identity cache hydrated");
        Ok(Self { names })
    }

    /// Resolve a display name, defaulting to [`UNKNOWN_NAME`].
    pub fn lookup(&self, identity: i64) -> &str {
        self.names.get(&identity).map(String::as_str).unwrap_or(UNKNOWN_NAME)
    }

    /// Record a freshly enrolled identity. Called synchronously after the
    /// store commit and before training begins.
    pub fn insert(&mut self, identity: i64, name: String) {
        self.names.insert(identity, name);
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_insert_visible_immediately() {
        let mut cache = IdentityCache::default();
        cache.insert(3, "Alice".to_string());
        assert_eq!(cache.lookup(3), "Alice");
    }

    #[test]
    fn test_missing_identity_is_unknown() {
        let cache = IdentityCache::default();
        assert_eq!(cache.lookup(42), UNKNOWN_NAME);
    }

    #[test]
    fn test_hydrate_reads_full_user_set() {
        let store = AttendanceStore::open_in_memory().unwrap();
        let ts = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let alice = store.insert_user("Alice", ts).unwrap();
        let bob = store.insert_user("Bob", ts).unwrap();

        let cache = IdentityCache::hydrate(&store).unwrap();
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.lookup(alice), "Alice");
        assert_eq!(cache.lookup(bob), "Bob");
    }

    #[test]
    fn test_insert_does_not_require_rehydration() {
        let store = AttendanceStore::open_in_memory().unwrap();
        let ts = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let mut cache = IdentityCache::hydrate(&store).unwrap();

        let carol = store.insert_user("Carol", ts).unwrap();
        assert_eq!(cache.lookup(carol), UNKNOWN_NAME);
        cache.insert(carol, "Carol".to_string());
        assert_eq!(cache.lookup(carol), "Carol");
    }
}
