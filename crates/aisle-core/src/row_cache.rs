//! Row navigation cache.
//!
//! Shared cache of previously fetched product slices, keyed by row scope and
//! the backend group index the fetch started at. Supports range queries
//! ("give me `[start, start + capacity)` if fully cached") and incremental
//! merge when overlapping ranges are fetched later.
//!
//! Staleness is checked lazily at read time; there is no purge thread. The
//! cache is shared across all row components through the client store, never
//! through a process global.

use std::collections::{BTreeMap, HashMap};

use crate::path::RowKey;
use crate::product::Product;

/// Five minutes, the default freshness window for cached slices.
pub const DEFAULT_TTL_MS: u64 = 5 * 60 * 1000;

/// Tuning knobs for the row navigation cache.
#[derive(Debug, Clone)]
pub struct RowCacheConfig {
    /// Time-to-live for an entry, in milliseconds.
    pub ttl_ms: u64,
}

impl Default for RowCacheConfig {
    fn default() -> Self {
        Self {
            ttl_ms: DEFAULT_TTL_MS,
        }
    }
}

/// Hit/miss counters, shared by both cache layers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from cache.
    pub hits: u64,
    /// Lookups that fell through to the backend.
    pub misses: u64,
    /// Entries dropped by explicit invalidation.
    pub invalidations: u64,
}

impl CacheStats {
    /// Fraction of lookups answered from cache.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// One cached contiguous run of products.
///
/// Invariant: `products.len() == range_end - range_start`.
#[derive(Debug, Clone, PartialEq)]
pub struct RowCacheEntry {
    /// Products covering `[range_start, range_end)`, in virtual-offset order.
    pub products: Vec<Product>,
    /// First virtual offset covered.
    pub range_start: usize,
    /// One past the last virtual offset covered.
    pub range_end: usize,
    /// When the entry was stored, in cache-clock milliseconds.
    pub stored_at: u64,
    /// Best known grand total for the path.
    pub total: usize,
    /// Whether more items exist beyond this entry's range.
    pub has_more: bool,
}

impl RowCacheEntry {
    /// Build an entry covering `[range_start, range_start + products.len())`.
    ///
    /// `stored_at` is stamped by the cache at store time.
    #[must_use]
    pub fn new(products: Vec<Product>, range_start: usize, total: usize, has_more: bool) -> Self {
        let range_end = range_start + products.len();
        Self {
            products,
            range_start,
            range_end,
            stored_at: 0,
            total,
            has_more,
        }
    }

    /// Whether the entry upholds the length invariant.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.range_end >= self.range_start
            && self.products.len() == self.range_end - self.range_start
    }

    /// Whether the entry fully contains `[start, start + capacity)`.
    #[must_use]
    pub fn covers(&self, start: usize, capacity: usize) -> bool {
        start >= self.range_start && start + capacity <= self.range_end
    }
}

/// A successful range lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeHit {
    /// Exactly the requested slice.
    pub products: Vec<Product>,
    /// Best known grand total for the path.
    pub total: usize,
    /// `has_more` recorded when the covering entry was stored.
    pub has_more: bool,
}

/// What [`RowNavigationCache::store_group`] did with an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    /// Fresh slot, entry stored as-is.
    Stored,
    /// Existing slot, ranges merged.
    Merged,
    /// Existing slot with a non-mergeable (disjoint) range, replaced.
    Replaced,
    /// Entry violated the length invariant and was dropped.
    Rejected,
}

/// Keyed cache of fetched product runs per row scope and group index.
#[derive(Debug, Default)]
pub struct RowNavigationCache {
    config: RowCacheConfig,
    entries: HashMap<RowKey, HashMap<usize, RowCacheEntry>>,
    /// Cache clock, advanced by the owner.
    timestamp: u64,
    stats: CacheStats,
}

impl RowNavigationCache {
    /// Cache with the given configuration.
    #[must_use]
    pub fn new(config: RowCacheConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Advance the cache clock. Expiry is evaluated against this value on
    /// every read.
    pub fn set_timestamp(&mut self, now_ms: u64) {
        self.timestamp = self.timestamp.max(now_ms);
    }

    /// Return the slice `[start, start + capacity)` if some unexpired entry
    /// for this scope fully contains it.
    pub fn products_in_range(
        &mut self,
        key: &RowKey,
        start: usize,
        capacity: usize,
    ) -> Option<RangeHit> {
        let ttl = self.config.ttl_ms;
        let now = self.timestamp;
        let hit = self.entries.get(key).and_then(|slots| {
            slots
                .values()
                .filter(|entry| now.saturating_sub(entry.stored_at) < ttl)
                .find(|entry| entry.covers(start, capacity))
                .map(|entry| {
                    let from = start - entry.range_start;
                    RangeHit {
                        products: entry.products[from..from + capacity].to_vec(),
                        total: entry.total,
                        has_more: entry.has_more,
                    }
                })
        });
        if hit.is_some() {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
        }
        hit
    }

    /// Store or merge an entry at `(key, group_index)`.
    ///
    /// Overlapping or adjacent ranges merge into their union: the union array
    /// is rebuilt index-by-index from a sparse map so no gaps or duplicate
    /// indices occur, later writes win on overlap, and `total` is
    /// monotonically maxed. Disjoint ranges cannot be represented by one
    /// contiguous entry, so the newer range replaces the older one.
    pub fn store_group(
        &mut self,
        key: &RowKey,
        group_index: usize,
        mut entry: RowCacheEntry,
    ) -> StoreOutcome {
        if !entry.is_consistent() {
            return StoreOutcome::Rejected;
        }
        entry.stored_at = self.timestamp;
        let slots = self.entries.entry(key.clone()).or_default();
        match slots.remove(&group_index) {
            None => {
                slots.insert(group_index, entry);
                StoreOutcome::Stored
            }
            Some(existing) => {
                let disjoint = entry.range_start > existing.range_end
                    || existing.range_start > entry.range_end;
                if disjoint {
                    slots.insert(group_index, entry);
                    StoreOutcome::Replaced
                } else {
                    let merged = Self::merge(existing, entry, self.timestamp);
                    slots.insert(group_index, merged);
                    StoreOutcome::Merged
                }
            }
        }
    }

    fn merge(existing: RowCacheEntry, newer: RowCacheEntry, now: u64) -> RowCacheEntry {
        let union_start = existing.range_start.min(newer.range_start);
        let union_end = existing.range_end.max(newer.range_end);

        let mut by_offset: BTreeMap<usize, Product> = BTreeMap::new();
        for (i, product) in existing.products.into_iter().enumerate() {
            by_offset.insert(existing.range_start + i, product);
        }
        // Later write wins on overlapping indices.
        for (i, product) in newer.products.into_iter().enumerate() {
            by_offset.insert(newer.range_start + i, product);
        }

        let products: Vec<Product> = by_offset.into_values().collect();
        debug_assert_eq!(products.len(), union_end - union_start);

        RowCacheEntry {
            products,
            range_start: union_start,
            range_end: union_end,
            stored_at: now,
            total: existing.total.max(newer.total),
            has_more: existing.has_more || newer.has_more,
        }
    }

    /// Drop every entry for one row scope. Returns how many slots were
    /// dropped.
    pub fn invalidate_scope(&mut self, key: &RowKey) -> usize {
        let dropped = self.entries.remove(key).map_or(0, |slots| slots.len());
        self.stats.invalidations += dropped as u64;
        dropped
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Lookup counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Number of cached slots across all scopes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    /// Whether the cache holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
