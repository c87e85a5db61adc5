//! Shared catalog store.
//!
//! The navigation and category caches are shared across every row component
//! in the application. Instead of hanging them off a process global, one
//! [`CatalogStore`] is constructed at application start and handed (as an
//! `Arc`) to every consumer. The store stamps cache clocks from an injected
//! [`Clock`], and its locks are only ever held for synchronous cache
//! mutations, never across an await point.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use aisle_core::{
    BoundaryIndex, CacheStats, CategoryCache, CategoryCacheConfig, CategoryEntry, CategoryPath,
    CategorySlot, Product, RangeHit, RowCacheConfig, RowCacheEntry, RowKey, RowNavigationCache,
    StoreOutcome,
};

/// Millisecond wall-clock source.
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;
}

/// Production clock backed by [`SystemTime`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis() as u64)
    }
}

/// Process-wide cache state, explicitly constructed and injected.
pub struct CatalogStore {
    row_cache: Mutex<RowNavigationCache>,
    category_cache: Mutex<CategoryCache>,
    boundaries: Mutex<HashMap<CategoryPath, BoundaryIndex>>,
    clock: Arc<dyn Clock>,
}

impl CatalogStore {
    /// Store with default cache configurations.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_config(clock, RowCacheConfig::default(), CategoryCacheConfig::default())
    }

    /// Store with explicit cache configurations.
    #[must_use]
    pub fn with_config(
        clock: Arc<dyn Clock>,
        row_config: RowCacheConfig,
        category_config: CategoryCacheConfig,
    ) -> Self {
        Self {
            row_cache: Mutex::new(RowNavigationCache::new(row_config)),
            category_cache: Mutex::new(CategoryCache::new(category_config)),
            boundaries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Range query against the row navigation cache.
    pub fn products_in_range(
        &self,
        key: &RowKey,
        start: usize,
        capacity: usize,
    ) -> Option<RangeHit> {
        let mut cache = self.row_cache.lock().expect("row cache mutex poisoned");
        cache.set_timestamp(self.clock.now_ms());
        cache.products_in_range(key, start, capacity)
    }

    /// Store or merge a fetched run into the row navigation cache.
    pub fn store_group(&self, key: &RowKey, group_index: usize, entry: RowCacheEntry) -> StoreOutcome {
        let mut cache = self.row_cache.lock().expect("row cache mutex poisoned");
        cache.set_timestamp(self.clock.now_ms());
        cache.store_group(key, group_index, entry)
    }

    /// Unexpired landing-data entry for a slot, if any.
    pub fn category_get(&self, slot: &CategorySlot) -> Option<CategoryEntry> {
        let mut cache = self
            .category_cache
            .lock()
            .expect("category cache mutex poisoned");
        cache.set_timestamp(self.clock.now_ms());
        cache.get(slot).cloned()
    }

    /// Store a landing-data result set.
    pub fn category_put(&self, slot: CategorySlot, products: Vec<Product>, total: usize) {
        let mut cache = self
            .category_cache
            .lock()
            .expect("category cache mutex poisoned");
        cache.set_timestamp(self.clock.now_ms());
        cache.put(slot, products, total);
    }

    /// Cached group boundaries for a path.
    ///
    /// Boundaries are keyed by path alone; display capacity changes never
    /// invalidate them.
    pub fn boundaries_for(&self, path: &CategoryPath) -> Option<BoundaryIndex> {
        self.boundaries
            .lock()
            .expect("boundary cache mutex poisoned")
            .get(path)
            .cloned()
    }

    /// Cache group boundaries for a path.
    pub fn store_boundaries(&self, path: CategoryPath, index: BoundaryIndex) {
        self.boundaries
            .lock()
            .expect("boundary cache mutex poisoned")
            .insert(path, index);
    }

    /// Best known grand total for a path, if boundaries are cached.
    pub fn grand_total_for(&self, path: &CategoryPath) -> Option<usize> {
        self.boundaries_for(path).map(|index| index.grand_total())
    }

    /// Drop all row cache slots for one scope.
    pub fn invalidate_row_scope(&self, key: &RowKey) -> usize {
        self.row_cache
            .lock()
            .expect("row cache mutex poisoned")
            .invalidate_scope(key)
    }

    /// Drop one landing-data slot.
    pub fn invalidate_category_slot(&self, slot: &CategorySlot) -> bool {
        self.category_cache
            .lock()
            .expect("category cache mutex poisoned")
            .invalidate(slot)
    }

    /// Drop everything: row slices, landing data and boundaries.
    pub fn clear(&self) {
        self.row_cache
            .lock()
            .expect("row cache mutex poisoned")
            .clear();
        self.category_cache
            .lock()
            .expect("category cache mutex poisoned")
            .clear();
        self.boundaries
            .lock()
            .expect("boundary cache mutex poisoned")
            .clear();
    }

    /// Row cache lookup counters.
    #[must_use]
    pub fn row_stats(&self) -> CacheStats {
        self.row_cache
            .lock()
            .expect("row cache mutex poisoned")
            .stats()
    }

    /// Category cache lookup counters.
    #[must_use]
    pub fn category_stats(&self) -> CacheStats {
        self.category_cache
            .lock()
            .expect("category cache mutex poisoned")
            .stats()
    }
}
