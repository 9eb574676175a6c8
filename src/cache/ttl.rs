//! Time-bounded result cache shared by concurrent queries.
//!
//! Entries are built completely before they are published under the write lock, so a
//! reader sees either the previous entry or the new one. Concurrent misses on the same
//! key may compute twice; the last insert wins.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

#[derive(Debug)]
pub struct CacheEntry<V> {
    pub payload: Arc<V>,
    pub created_at: DateTime<Utc>,
    inserted: Instant,
}

impl<V> CacheEntry<V> {
    fn new(payload: Arc<V>) -> Self {
        Self {
            payload,
            created_at: Utc::now(),
            inserted: Instant::now(),
        }
    }

    pub fn age(&self) -> Duration {
        self.inserted.elapsed()
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.age() > ttl
    }
}

pub struct TtlCache<K, V> {
    entries: RwLock<HashMap<K, Arc<CacheEntry<V>>>>,
    ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Live entry for `key`; expired entries read as misses and are left for `purge_expired`.
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        self.get_entry(key).map(|entry| entry.payload.clone())
    }

    pub fn get_entry(&self, key: &K) -> Option<Arc<CacheEntry<V>>> {
        self.read()
            .get(key)
            .filter(|entry| !entry.is_expired(self.ttl))
            .cloned()
    }

    pub fn insert(&self, key: K, payload: V) -> Arc<V> {
        let payload = Arc::new(payload);
        let entry = Arc::new(CacheEntry::new(payload.clone()));
        self.write().insert(key, entry);
        payload
    }

    pub fn invalidate(&self, key: &K) -> bool {
        self.write().remove(key).is_some()
    }

    /// Drop every entry whose key matches; returns how many went.
    pub fn invalidate_where<P>(&self, predicate: P) -> usize
    where
        P: Fn(&K) -> bool,
    {
        let mut entries = self.write();
        let before = entries.len();
        entries.retain(|key, _| !predicate(key));
        before - entries.len()
    }

    pub fn purge_expired(&self) -> usize {
        let ttl = self.ttl;
        let mut entries = self.write();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(ttl));
        before - entries.len()
    }

    /// Stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Entries are replaced whole, so a poisoned map is still consistent.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<K, Arc<CacheEntry<V>>>> {
        self.entries.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<K, Arc<CacheEntry<V>>>> {
        self.entries.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
