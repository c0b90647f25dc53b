use crate::clock::{Clock, SystemClock};
use crate::entry::{CacheEntry, EntryOptions, Invalidation};
use crate::error::CacheError;
use configuration::CacheSettings;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Occupancy of a single namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamespaceStats {
    pub namespace: String,
    pub entries: usize,
    pub max_entries: usize,
    pub memory_usage: usize,
}

/// Store-wide counters for observability widgets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub total_memory_usage: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub namespaces: Vec<NamespaceStats>,
}

#[derive(Debug)]
struct Namespace {
    entries: HashMap<String, CacheEntry>,
    max_entries: usize,
}

#[derive(Debug, Default)]
struct Inner {
    namespaces: HashMap<String, Namespace>,
    next_sequence: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
}

/// An in-memory key/value store partitioned into namespaces.
///
/// All operations are synchronous and take the store lock for their full
/// duration, so a reader never observes a half-written entry. Every write
/// replaces the whole entry. Construct one per application and share it
/// through an `Arc`.
pub struct CacheStore {
    inner: Mutex<Inner>,
    settings: CacheSettings,
    clock: Arc<dyn Clock>,
}

impl CacheStore {
    pub fn new(settings: CacheSettings) -> Self {
        Self::with_clock(settings, Arc::new(SystemClock))
    }

    pub fn with_clock(settings: CacheSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            settings,
            clock,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores `value` under `key`.
    ///
    /// When the namespace is full, the lowest-priority entries are evicted first
    /// and, among equal priorities, the oldest. Returns `false` only when the
    /// namespace cannot hold any entry at all.
    pub fn set(&self, namespace: &str, key: &str, value: Value, options: EntryOptions) -> bool {
        let now = self.clock.now();
        let mut inner = self.lock();
        let sequence = inner.next_sequence;
        inner.next_sequence += 1;

        let max_entries = self.settings.max_entries_for(namespace);
        let ns = inner
            .namespaces
            .entry(namespace.to_string())
            .or_insert_with(|| Namespace {
                entries: HashMap::new(),
                max_entries,
            });

        if ns.max_entries == 0 {
            tracing::warn!(namespace, key, "Cache namespace has no capacity; write rejected.");
            return false;
        }

        let mut evicted = 0;
        if !ns.entries.contains_key(key) {
            ns.entries.retain(|_, entry| !entry.is_expired(now));
            while ns.entries.len() >= ns.max_entries {
                let victim = ns
                    .entries
                    .values()
                    .min_by_key(|entry| (entry.priority, entry.sequence))
                    .map(|entry| entry.key.clone());
                match victim {
                    Some(victim) => {
                        ns.entries.remove(&victim);
                        evicted += 1;
                        tracing::debug!(namespace, key = %victim, "Evicted cache entry.");
                    }
                    None => break,
                }
            }
        }

        let entry = CacheEntry {
            key: key.to_string(),
            value,
            created_at: now,
            ttl: options.ttl.unwrap_or_else(|| self.settings.ttl()),
            tags: options.tags,
            priority: options.priority,
            sequence,
        };
        ns.entries.insert(key.to_string(), entry);
        inner.evictions += evicted;
        true
    }

    /// Serializes `value` and stores it.
    pub fn set_as<T: Serialize>(
        &self,
        namespace: &str,
        key: &str,
        value: &T,
        options: EntryOptions,
    ) -> Result<bool, CacheError> {
        let value = serde_json::to_value(value)?;
        Ok(self.set(namespace, key, value, options))
    }

    /// Returns the value if present and not expired.
    ///
    /// An expired entry reads as a miss but stays in place, so `get_stale` can
    /// still serve it; `purge_expired`, eviction and overwrites remove it.
    pub fn get(&self, namespace: &str, key: &str) -> Option<Value> {
        let now = self.clock.now();
        let mut inner = self.lock();

        let lookup = inner
            .namespaces
            .get(namespace)
            .and_then(|ns| ns.entries.get(key))
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.value.clone());

        match lookup {
            Some(value) => {
                inner.hits += 1;
                Some(value)
            }
            None => {
                inner.misses += 1;
                None
            }
        }
    }

    /// Typed `get`. A value that no longer deserializes into `T` counts as a miss.
    pub fn get_as<T: DeserializeOwned>(&self, namespace: &str, key: &str) -> Option<T> {
        let value = self.get(namespace, key)?;
        match serde_json::from_value(value) {
            Ok(typed) => Some(typed),
            Err(e) => {
                tracing::warn!(namespace, key, error = %e, "Cached value has an unexpected shape.");
                None
            }
        }
    }

    /// Returns the value even if it has expired. Never removes anything and
    /// does not touch the hit/miss counters.
    pub fn get_stale(&self, namespace: &str, key: &str) -> Option<Value> {
        let inner = self.lock();
        inner
            .namespaces
            .get(namespace)
            .and_then(|ns| ns.entries.get(key))
            .map(|entry| entry.value.clone())
    }

    pub fn get_stale_as<T: DeserializeOwned>(&self, namespace: &str, key: &str) -> Option<T> {
        self.get_stale(namespace, key)
            .and_then(|value| serde_json::from_value(value).ok())
    }

    /// Metadata of the entry under `key`, expired or not.
    pub fn entry(&self, namespace: &str, key: &str) -> Option<CacheEntry> {
        let inner = self.lock();
        inner
            .namespaces
            .get(namespace)
            .and_then(|ns| ns.entries.get(key))
            .cloned()
    }

    /// Removes every entry matching any of the criteria and returns how many were removed.
    pub fn invalidate(&self, namespace: &str, criteria: &Invalidation) -> usize {
        let now = self.clock.now();
        let mut inner = self.lock();
        let Some(ns) = inner.namespaces.get_mut(namespace) else {
            return 0;
        };

        let before = ns.entries.len();
        ns.entries.retain(|_, entry| !criteria.matches(entry, now));
        let removed = before - ns.entries.len();

        tracing::debug!(namespace, removed, "Cache invalidation complete.");
        removed
    }

    /// Always calls `fetch`; on success stores the result with `options` and returns it.
    ///
    /// A failed fetch leaves any existing entry untouched and returns the error.
    pub async fn refresh<T, E, F, Fut>(
        &self,
        namespace: &str,
        key: &str,
        options: EntryOptions,
        fetch: F,
    ) -> Result<T, E>
    where
        T: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let value = fetch().await?;
        match self.set_as(namespace, key, &value, options) {
            Ok(true) => {}
            Ok(false) => tracing::warn!(namespace, key, "Refreshed value was not cached."),
            Err(e) => tracing::warn!(namespace, key, error = %e, "Refreshed value could not be cached."),
        }
        Ok(value)
    }

    /// Drops expired entries in every namespace and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut inner = self.lock();
        inner
            .namespaces
            .values_mut()
            .map(|ns| {
                let before = ns.entries.len();
                ns.entries.retain(|_, entry| !entry.is_expired(now));
                before - ns.entries.len()
            })
            .sum()
    }

    /// Number of live (unexpired) entries in `namespace`.
    pub fn len(&self, namespace: &str) -> usize {
        let now = self.clock.now();
        let inner = self.lock();
        inner
            .namespaces
            .get(namespace)
            .map(|ns| ns.entries.values().filter(|e| !e.is_expired(now)).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self, namespace: &str) -> bool {
        self.len(namespace) == 0
    }

    /// Counts and memory usage across live entries.
    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let inner = self.lock();

        let mut namespaces: Vec<NamespaceStats> = inner
            .namespaces
            .iter()
            .map(|(name, ns)| {
                let live = ns.entries.values().filter(|e| !e.is_expired(now));
                let (entries, memory_usage) =
                    live.fold((0, 0), |(n, bytes), e| (n + 1, bytes + e.memory_usage()));
                NamespaceStats {
                    namespace: name.clone(),
                    entries,
                    max_entries: ns.max_entries,
                    memory_usage,
                }
            })
            .collect();
        namespaces.sort_by(|a, b| a.namespace.cmp(&b.namespace));

        CacheStats {
            total_entries: namespaces.iter().map(|ns| ns.entries).sum(),
            total_memory_usage: namespaces.iter().map(|ns| ns.memory_usage).sum(),
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
            namespaces,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::entry::priority;
    use configuration::NamespaceSettings;
    use serde_json::json;
    use std::time::Duration;

    fn store_with_capacity(max_entries: usize) -> (CacheStore, Arc<ManualClock>) {
        let mut settings = CacheSettings::default();
        settings
            .namespaces
            .insert("test".to_string(), NamespaceSettings { max_entries });
        let clock = Arc::new(ManualClock::default());
        (CacheStore::with_clock(settings, clock.clone()), clock)
    }

    #[test]
    fn set_then_get_round_trips() {
        let (store, _) = store_with_capacity(10);
        assert!(store.set("test", "a", json!({"x": 1}), EntryOptions::new()));
        assert_eq!(store.get("test", "a"), Some(json!({"x": 1})));
        assert_eq!(store.get("test", "missing"), None);
        assert_eq!(store.get("other", "a"), None);
    }

    #[test]
    fn expired_entries_miss_but_are_kept_for_stale_reads() {
        let (store, clock) = store_with_capacity(10);
        store.set(
            "test",
            "a",
            json!(1),
            EntryOptions::new().with_ttl(Duration::from_secs(5)),
        );

        clock.advance(Duration::from_secs(5));
        assert_eq!(store.get("test", "a"), Some(json!(1)));

        clock.advance(Duration::from_millis(1));
        assert_eq!(store.get("test", "a"), None);
        assert!(store.entry("test", "a").is_some());
        assert_eq!(store.len("test"), 0);

        assert_eq!(store.purge_expired(), 1);
        assert!(store.entry("test", "a").is_none());
    }

    #[test]
    fn stale_reads_ignore_expiry() {
        let (store, clock) = store_with_capacity(10);
        store.set(
            "test",
            "a",
            json!("old"),
            EntryOptions::new().with_ttl(Duration::from_secs(1)),
        );
        clock.advance(Duration::from_secs(10));

        assert_eq!(store.get_stale("test", "a"), Some(json!("old")));
        assert!(store.entry("test", "a").is_some());
    }

    #[test]
    fn invalidating_by_tag_removes_exactly_the_tagged_entries() {
        let (store, _) = store_with_capacity(10);
        store.set("test", "one", json!(1), EntryOptions::new().with_tags(["group1", "test"]));
        store.set("test", "two", json!(2), EntryOptions::new().with_tags(["group1", "test"]));
        store.set("test", "three", json!(3), EntryOptions::new().with_tags(["group2", "test"]));
        store.set("test", "four", json!(4), EntryOptions::new().with_tags(["old"]));

        let removed = store.invalidate("test", &Invalidation::tags(["group1"]));

        assert_eq!(removed, 2);
        assert_eq!(store.get("test", "one"), None);
        assert_eq!(store.get("test", "two"), None);
        assert_eq!(store.get("test", "three"), Some(json!(3)));
        assert_eq!(store.get("test", "four"), Some(json!(4)));
    }

    #[test]
    fn invalidating_by_pattern_and_age() {
        let (store, clock) = store_with_capacity(10);
        store.set("test", "user:1:funds", json!(1), EntryOptions::new());
        store.set("test", "user:2:funds", json!(2), EntryOptions::new());
        clock.advance(Duration::from_secs(30));
        store.set("test", "leaderboard", json!(3), EntryOptions::new());

        let by_pattern = Invalidation::all().with_key_pattern("^user:1:").unwrap();
        assert_eq!(store.invalidate("test", &by_pattern), 1);

        let by_age = Invalidation::all().with_max_age(Duration::from_secs(10));
        assert_eq!(store.invalidate("test", &by_age), 1);
        assert_eq!(store.get("test", "leaderboard"), Some(json!(3)));
    }

    #[test]
    fn invalidating_without_criteria_clears_the_namespace() {
        let (store, _) = store_with_capacity(10);
        store.set("test", "a", json!(1), EntryOptions::new());
        store.set("test", "b", json!(2), EntryOptions::new());
        store.set("dashboard", "c", json!(3), EntryOptions::new());

        assert_eq!(store.invalidate("test", &Invalidation::all()), 2);
        assert!(store.is_empty("test"));
        assert_eq!(store.len("dashboard"), 1);
        assert_eq!(store.invalidate("nowhere", &Invalidation::all()), 0);
    }

    #[test]
    fn eviction_prefers_low_priority_then_oldest() {
        let (store, _) = store_with_capacity(3);
        store.set("test", "high", json!(1), EntryOptions::new().with_priority(priority::HIGH));
        store.set("test", "low-old", json!(2), EntryOptions::new().with_priority(priority::LOW));
        store.set("test", "low-new", json!(3), EntryOptions::new().with_priority(priority::LOW));

        assert!(store.set("test", "fresh", json!(4), EntryOptions::new()));
        assert_eq!(store.get("test", "low-old"), None);
        assert!(store.get("test", "low-new").is_some());

        assert!(store.set("test", "fresher", json!(5), EntryOptions::new()));
        assert_eq!(store.get("test", "low-new"), None);
        assert!(store.get("test", "high").is_some());
        assert_eq!(store.len("test"), 3);
        assert_eq!(store.stats().evictions, 2);
    }

    #[test]
    fn replacing_a_key_never_evicts() {
        let (store, _) = store_with_capacity(2);
        store.set("test", "a", json!(1), EntryOptions::new());
        store.set("test", "b", json!(2), EntryOptions::new());
        store.set("test", "a", json!(10), EntryOptions::new());

        assert_eq!(store.get("test", "a"), Some(json!(10)));
        assert_eq!(store.get("test", "b"), Some(json!(2)));
    }

    #[test]
    fn zero_capacity_namespace_rejects_writes() {
        let (store, _) = store_with_capacity(0);
        assert!(!store.set("test", "a", json!(1), EntryOptions::new()));
        assert_eq!(store.get("test", "a"), None);
    }

    #[tokio::test]
    async fn refresh_always_fetches_and_stores() {
        let (store, _) = store_with_capacity(10);
        store.set("test", "k", json!("cached"), EntryOptions::new());

        let fresh: Result<String, String> = store
            .refresh("test", "k", EntryOptions::new().with_tag("t"), || async {
                Ok("fresh".to_string())
            })
            .await;

        assert_eq!(fresh.unwrap(), "fresh");
        assert_eq!(store.get("test", "k"), Some(json!("fresh")));
        assert!(store.entry("test", "k").unwrap().tags.contains("t"));
    }

    #[tokio::test]
    async fn failed_refresh_keeps_the_previous_entry() {
        let (store, _) = store_with_capacity(10);
        store.set("test", "k", json!("cached"), EntryOptions::new());

        let result: Result<String, &str> =
            store.refresh("test", "k", EntryOptions::new(), || async { Err("boom") }).await;

        assert_eq!(result, Err("boom"));
        assert_eq!(store.get("test", "k"), Some(json!("cached")));
    }

    #[test]
    fn stats_count_live_entries_and_memory() {
        let (store, clock) = store_with_capacity(10);
        store.set("test", "ab", json!("xyz"), EntryOptions::new());
        store.set(
            "test",
            "short",
            json!(1),
            EntryOptions::new().with_ttl(Duration::from_secs(1)),
        );
        store.get("test", "ab");
        store.get("test", "zz");
        clock.advance(Duration::from_secs(2));

        let stats = store.stats();
        assert_eq!(stats.total_entries, 1);
        // "ab" + "\"xyz\""
        assert_eq!(stats.total_memory_usage, 2 + 5);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(store.purge_expired(), 1);
    }

    #[test]
    fn typed_helpers_round_trip() {
        let (store, _) = store_with_capacity(10);
        store
            .set_as("test", "nums", &vec![1u32, 2, 3], EntryOptions::new())
            .unwrap();
        assert_eq!(store.get_as::<Vec<u32>>("test", "nums"), Some(vec![1, 2, 3]));
        assert_eq!(store.get_as::<String>("test", "nums"), None);
    }
}
