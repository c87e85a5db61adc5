//! Category, subcategory and product-type result cache.
//!
//! Backs the initial landing data for a browsing view, independent of
//! row-level pagination: whole-category previews, whole-subcategory sets and
//! product-type sets in preview or full detail. Entries expire five minutes
//! after being stored and are treated as absent past that point. Expiry is
//! evaluated lazily at read time; nothing is proactively evicted.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::product::Product;
use crate::row_cache::{CacheStats, DEFAULT_TTL_MS};

/// How much of a product-type result set was fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Detail {
    /// Just enough items to render a preview row.
    Preview,
    /// The whole result set.
    Full,
}

/// Which landing-data slot an entry occupies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CategorySlot {
    /// Whole-category result set.
    Category {
        /// Category name.
        name: String,
    },
    /// Whole-subcategory result set.
    Subcategory {
        /// Subcategory name.
        name: String,
    },
    /// Product-type result set at a given detail level.
    ProductTypeSet {
        /// Owning subcategory name.
        subcategory: String,
        /// Product type name.
        product_type: String,
        /// Preview or full fetch.
        detail: Detail,
    },
}

/// One cached landing-data result set.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryEntry {
    /// The cached products.
    pub products: Vec<Product>,
    /// When the entry was stored, in cache-clock milliseconds.
    pub stored_at: u64,
    /// Grand total reported for the slot's path.
    pub total: usize,
}

/// Tuning knobs for the category cache.
#[derive(Debug, Clone)]
pub struct CategoryCacheConfig {
    /// Time-to-live for an entry, in milliseconds.
    pub ttl_ms: u64,
}

impl Default for CategoryCacheConfig {
    fn default() -> Self {
        Self {
            ttl_ms: DEFAULT_TTL_MS,
        }
    }
}

/// TTL cache of landing-data result sets.
#[derive(Debug, Default)]
pub struct CategoryCache {
    config: CategoryCacheConfig,
    entries: HashMap<CategorySlot, CategoryEntry>,
    timestamp: u64,
    stats: CacheStats,
}

impl CategoryCache {
    /// Cache with the given configuration.
    #[must_use]
    pub fn new(config: CategoryCacheConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Advance the cache clock.
    pub fn set_timestamp(&mut self, now_ms: u64) {
        self.timestamp = self.timestamp.max(now_ms);
    }

    /// Unexpired entry for a slot, if any.
    pub fn get(&mut self, slot: &CategorySlot) -> Option<&CategoryEntry> {
        let fresh = self
            .entries
            .get(slot)
            .is_some_and(|e| self.timestamp.saturating_sub(e.stored_at) < self.config.ttl_ms);
        if fresh {
            self.stats.hits += 1;
            self.entries.get(slot)
        } else {
            self.stats.misses += 1;
            None
        }
    }

    /// Store a result set, stamping it with the cache clock.
    pub fn put(&mut self, slot: CategorySlot, products: Vec<Product>, total: usize) {
        self.entries.insert(
            slot,
            CategoryEntry {
                products,
                stored_at: self.timestamp,
                total,
            },
        );
    }

    /// Drop one slot. Returns whether anything was there.
    pub fn invalidate(&mut self, slot: &CategorySlot) -> bool {
        let dropped = self.entries.remove(slot).is_some();
        if dropped {
            self.stats.invalidations += 1;
        }
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

    /// Number of stored slots, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
