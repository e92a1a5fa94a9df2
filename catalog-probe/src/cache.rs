//! Small in-process TTL cache for metadata-heavy catalog calls.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::Serialize;

/// Cache entry with its expiry and recency stamps.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
    last_access: Instant,
}

/// Per-entry TTL cache with least-recently-used eviction.
///
/// The cache is disabled when either the TTL or the capacity is zero; a
/// disabled cache stores nothing and reports every lookup as a miss.
#[derive(Debug)]
pub struct TtlCache<V> {
    entries: HashMap<String, CacheEntry<V>>,
    ttl: Duration,
    max_entries: usize,
    counters: Counters,
}

#[derive(Debug, Default, Clone, Copy)]
struct Counters {
    hits: u64,
    misses: u64,
    sets: u64,
    evictions: u64,
    expirations: u64,
}

/// Snapshot of cache configuration and counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub enabled: bool,
    pub ttl_seconds: u64,
    pub max_entries: usize,
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub evictions: u64,
    pub expirations: u64,
}

impl<V: Clone> TtlCache<V> {
    /// Creates a cache with the given TTL and capacity.
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            max_entries,
            counters: Counters::default(),
        }
    }

    pub fn enabled(&self) -> bool {
        !self.ttl.is_zero() && self.max_entries > 0
    }

    /// Returns a clone of the cached value if present and not expired.
    pub fn get(&mut self, key: &str) -> Option<V> {
        if !self.enabled() {
            self.counters.misses += 1;
            return None;
        }

        let now = Instant::now();
        match self.entries.get_mut(key) {
            None => {
                self.counters.misses += 1;
                return None;
            }
            Some(entry) if entry.expires_at > now => {
                entry.last_access = now;
                self.counters.hits += 1;
                return Some(entry.value.clone());
            }
            Some(_) => {}
        }

        self.entries.remove(key);
        self.counters.misses += 1;
        self.counters.expirations += 1;
        None
    }

    /// Inserts or replaces a value. Past capacity, expired entries are dropped
    /// first, then the least recently used ones.
    pub fn set(&mut self, key: impl Into<String>, value: V) {
        if !self.enabled() {
            return;
        }

        let now = Instant::now();
        self.entries.insert(
            key.into(),
            CacheEntry {
                value,
                expires_at: now + self.ttl,
                last_access: now,
            },
        );
        self.counters.sets += 1;

        if self.entries.len() > self.max_entries {
            self.purge_expired();
        }
        while self.entries.len() > self.max_entries {
            self.evict_oldest();
        }
    }

    /// Removes expired entries and returns how many were dropped.
    pub fn purge_expired(&mut self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        let removed = before - self.entries.len();
        self.counters.expirations += removed as u64;
        removed
    }

    /// Clears the entire cache. Counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            enabled: self.enabled(),
            ttl_seconds: self.ttl.as_secs(),
            max_entries: self.max_entries,
            size: self.entries.len(),
            hits: self.counters.hits,
            misses: self.counters.misses,
            sets: self.counters.sets,
            evictions: self.counters.evictions,
            expirations: self.counters.expirations,
        }
    }

    fn evict_oldest(&mut self) {
        if let Some(oldest_key) = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_access)
            .map(|(k, _)| k.clone())
        {
            self.entries.remove(&oldest_key);
            self.counters.evictions += 1;
        }
    }
}
