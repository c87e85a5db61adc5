//! Per-row pagination controller.
//!
//! Each displayed product row or grid owns one [`RowNavigator`]. A
//! navigation resolves the display capacity, computes the next virtual
//! window, and serves it from the shared row cache when possible; on a miss
//! it initializes the group boundary index for the path (lazily, once),
//! fetches the minimal covering run of backend groups in a single batched
//! RPC, slices the requested window out, and stores the *full* fetch back
//! into the cache for later windows.
//!
//! Rapid repeated navigation is guarded by a per-row sequence number: a
//! fetch that resolves after a newer navigation has been issued still feeds
//! the cache but never overwrites newer display state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use aisle_core::{
    decode_groups, BoundaryIndex, CategoryPath, GroupSpan, NavDirection, Product, RowCacheEntry,
    RowKey, StoreOutcome, VirtualWindow, WindowTarget,
};
use tracing::{debug, error, warn};

use crate::backend::{CatalogBackend, CountsRequest, ProductsRequest};
use crate::error::ClientError;
use crate::store::CatalogStore;

/// Tuning knobs for a row navigator.
#[derive(Debug, Clone)]
pub struct NavigatorConfig {
    /// Fixed display capacity; when `None` (or zero) the capacity is
    /// recomputed from the container and item widths.
    pub explicit_capacity: Option<usize>,
    /// Rendered item width used for capacity recomputation.
    pub item_width: f32,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            explicit_capacity: None,
            item_width: 245.0,
        }
    }
}

/// Controller lifecycle per row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavState {
    /// Nothing in flight.
    Idle,
    /// A navigation fetch is in flight.
    Loading,
    /// The last navigation failed; cleared by the next navigation.
    Error,
}

/// What one successful navigation displays.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationOutcome {
    /// The slice to display, at most `capacity` items.
    pub products: Vec<Product>,
    /// True grand total for the path, independent of chunked fetches.
    pub total: usize,
    /// Whether more items exist past the displayed window.
    pub has_more: bool,
}

#[derive(Debug, Default)]
struct RowState {
    window: VirtualWindow,
    state: NavState,
    container_width: f32,
    capacity_override: Option<usize>,
    total: usize,
}

impl Default for NavState {
    fn default() -> Self {
        Self::Idle
    }
}

/// Pagination controller for one displayed row or grid.
pub struct RowNavigator {
    backend: Arc<dyn CatalogBackend>,
    store: Arc<CatalogStore>,
    key: RowKey,
    config: NavigatorConfig,
    row: Mutex<RowState>,
    /// Monotonically increasing navigation sequence; stale fetches are
    /// discarded against it.
    seq: AtomicU64,
}

impl RowNavigator {
    /// Navigator with default tuning.
    #[must_use]
    pub fn new(backend: Arc<dyn CatalogBackend>, store: Arc<CatalogStore>, key: RowKey) -> Self {
        Self::with_config(backend, store, key, NavigatorConfig::default())
    }

    /// Navigator with explicit tuning.
    #[must_use]
    pub fn with_config(
        backend: Arc<dyn CatalogBackend>,
        store: Arc<CatalogStore>,
        key: RowKey,
        config: NavigatorConfig,
    ) -> Self {
        Self {
            backend,
            store,
            key,
            config,
            row: Mutex::new(RowState::default()),
            seq: AtomicU64::new(0),
        }
    }

    /// Record the current container width for capacity recomputation.
    pub fn set_container_width(&self, width: f32) {
        self.row.lock().expect("row state mutex poisoned").container_width = width;
    }

    /// Override the display capacity at runtime (capacity-increase events
    /// from container resize). `None` returns to the configured behavior.
    pub fn set_capacity(&self, capacity: Option<usize>) {
        self.row.lock().expect("row state mutex poisoned").capacity_override = capacity;
    }

    /// Currently displayed window.
    #[must_use]
    pub fn window(&self) -> VirtualWindow {
        self.row.lock().expect("row state mutex poisoned").window
    }

    /// Controller state.
    #[must_use]
    pub fn nav_state(&self) -> NavState {
        self.row.lock().expect("row state mutex poisoned").state
    }

    /// Whether the back control should be disabled.
    #[must_use]
    pub fn left_disabled(&self) -> bool {
        self.row
            .lock()
            .expect("row state mutex poisoned")
            .window
            .left_disabled()
    }

    /// Whether the forward control should be disabled.
    #[must_use]
    pub fn right_disabled(&self) -> bool {
        let row = self.row.lock().expect("row state mutex poisoned");
        row.window.right_disabled(row.total)
    }

    /// Reset for a browsing-path change: the window returns to `{0, 0}` and
    /// any in-flight fetch result is discarded when it lands.
    pub fn reset(&self) {
        self.seq.fetch_add(1, Ordering::SeqCst);
        let mut row = self.row.lock().expect("row state mutex poisoned");
        row.window.reset();
        row.total = 0;
        row.state = NavState::Idle;
    }

    /// Navigate one window left or right.
    ///
    /// Returns `Ok(None)` when the result was superseded by a newer
    /// navigation before it resolved. Errors leave the caches and window
    /// untouched; navigation is not retried automatically.
    pub async fn navigate(
        &self,
        direction: NavDirection,
    ) -> Result<Option<NavigationOutcome>, ClientError> {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        let (target, capacity) = {
            let mut row = self.row.lock().expect("row state mutex poisoned");
            let capacity = VirtualWindow::resolve_capacity(
                row.capacity_override.or(self.config.explicit_capacity),
                row.container_width,
                self.config.item_width,
            );
            row.state = NavState::Loading;
            (row.window.target_for(direction, capacity), capacity)
        };
        let path = self.key.to_path();

        // Cache first: a hit needs no boundary information and no RPC.
        if let Some(hit) = self.store.products_in_range(&self.key, target.start, capacity) {
            let grand_total = self.store.grand_total_for(&path).unwrap_or(0).max(hit.total);
            // Compare against the grand total, not the possibly chunked
            // entry total, so a partial fetch cannot flag the end early.
            let has_more = hit.has_more || target.end < grand_total;
            debug!(path = %path, start = target.start, capacity, "navigation served from cache");
            return Ok(self.commit(seq, target, capacity, hit.products, grand_total, has_more));
        }

        let boundaries = self.ensure_boundaries(&path).await;
        let span = boundaries
            .span_for_window(target.start, target.end)
            .unwrap_or(GroupSpan { first: 0, last: 0 });
        if boundaries.is_empty() {
            warn!(path = %path, "no group boundaries available, assuming a single group");
        }

        let request = ProductsRequest::for_path(&path, span.first, span.group_count());
        let response = match self.backend.products_by_category(request).await {
            Ok(response) => response,
            Err(err) => {
                error!(path = %path, error = %err, "navigation fetch failed");
                self.fail(seq);
                return Err(err.into());
            }
        };

        let decoded = decode_groups(&response.product_groups);
        if decoded.skipped_groups > 0 {
            warn!(
                path = %path,
                skipped = decoded.skipped_groups,
                "skipped undecodable product groups"
            );
        }
        if decoded.products.is_empty() && decoded.skipped_groups > 0 {
            self.fail(seq);
            return Err(ClientError::Decode {
                skipped: decoded.skipped_groups,
            });
        }

        let fetch_base = boundaries.get(span.first).map_or(0, |b| b.start);
        let slice_from = target
            .start
            .saturating_sub(fetch_base)
            .min(decoded.products.len());
        let slice_to = (slice_from + capacity).min(decoded.products.len());
        let displayed = decoded.products[slice_from..slice_to].to_vec();

        let has_more_local = if boundaries.is_empty() {
            decoded.products.len() > capacity
        } else {
            target.end < boundaries.grand_total()
        };
        // Either signal can force "more available".
        let has_more = response.has_more || has_more_local;
        let total = response.total_products.max(boundaries.grand_total());

        // Cache the full fetched run, not just the displayed slice.
        let entry = RowCacheEntry::new(decoded.products, fetch_base, total, has_more);
        if self.store.store_group(&self.key, span.first, entry) == StoreOutcome::Rejected {
            warn!(path = %path, "row cache rejected an inconsistent entry");
        }

        debug!(
            path = %path,
            start = target.start,
            fetched_from_group = span.first,
            shown = displayed.len(),
            total,
            has_more,
            "navigation fetched from backend"
        );
        Ok(self.commit(seq, target, capacity, displayed, total, has_more))
    }

    /// Lazily initialize the boundary index for a path. Failures degrade to
    /// an empty index (single-group fallback) and are retried on the next
    /// navigation.
    async fn ensure_boundaries(&self, path: &CategoryPath) -> BoundaryIndex {
        if let Some(index) = self.store.boundaries_for(path) {
            return index;
        }
        match self.backend.group_counts(CountsRequest::for_path(path)).await {
            Ok(counts) => {
                let index = BoundaryIndex::from_counts(&counts);
                debug!(
                    path = %path,
                    groups = index.group_count(),
                    total = index.grand_total(),
                    "group boundaries initialized"
                );
                self.store.store_boundaries(path.clone(), index.clone());
                index
            }
            Err(err) => {
                warn!(path = %path, error = %err, "boundary fetch failed");
                BoundaryIndex::empty()
            }
        }
    }

    /// Apply a finished navigation unless a newer one has been issued.
    fn commit(
        &self,
        seq: u64,
        target: WindowTarget,
        capacity: usize,
        products: Vec<Product>,
        total: usize,
        has_more: bool,
    ) -> Option<NavigationOutcome> {
        let mut row = self.row.lock().expect("row state mutex poisoned");
        if self.seq.load(Ordering::SeqCst) != seq {
            debug!("navigation superseded, discarding its result");
            return None;
        }
        row.window.apply(target, products.len(), capacity, has_more);
        row.total = total;
        row.state = NavState::Idle;
        Some(NavigationOutcome {
            products,
            total,
            has_more,
        })
    }

    /// Mark the row errored unless a newer navigation has been issued.
    fn fail(&self, seq: u64) {
        let mut row = self.row.lock().expect("row state mutex poisoned");
        if self.seq.load(Ordering::SeqCst) == seq {
            row.state = NavState::Error;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_util::{ManualClock, MockBackend};
    use serde_json::json;

    fn fixture(counts: Vec<usize>) -> (Arc<MockBackend>, Arc<CatalogStore>, RowNavigator) {
        let backend = Arc::new(MockBackend::with_counts(counts));
        let store = Arc::new(CatalogStore::new(Arc::new(ManualClock::default())));
        let navigator = RowNavigator::with_config(
            backend.clone(),
            store.clone(),
            RowKey::subcategory("Produce", "Fruit"),
            NavigatorConfig {
                explicit_capacity: Some(50),
                ..NavigatorConfig::default()
            },
        );
        (backend, store, navigator)
    }

    fn offset_of(product: &Product) -> usize {
        product.payload["offset"].as_u64().unwrap() as usize
    }

    #[tokio::test]
    async fn first_navigation_fetches_and_slices_the_window() {
        let (backend, _store, navigator) = fixture(vec![100, 100, 50]);

        let outcome = navigator.navigate(NavDirection::Right).await.unwrap().unwrap();
        assert_eq!(outcome.products.len(), 50);
        assert_eq!(offset_of(&outcome.products[0]), 0);
        assert_eq!(outcome.total, 250);
        assert!(outcome.has_more);
        // One counts call plus one products call.
        assert_eq!(backend.counts_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert_eq!(backend.products_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn straddling_window_fetches_both_covering_groups() {
        let (backend, store, navigator) = fixture(vec![100, 100, 50]);
        navigator.set_capacity(Some(40));

        // Two windows of 40 land the row at [40, 80).
        navigator.navigate(NavDirection::Right).await.unwrap();
        navigator.navigate(NavDirection::Right).await.unwrap();
        assert_eq!(navigator.window().end, 80);

        // A capacity increase makes the next window [80, 130), which
        // straddles groups 0 and 1: one RPC fetches both.
        navigator.set_capacity(Some(50));
        let calls_before = backend.products_calls.load(std::sync::atomic::Ordering::SeqCst);
        let outcome = navigator.navigate(NavDirection::Right).await.unwrap().unwrap();
        assert_eq!(outcome.products.len(), 50);
        assert_eq!(offset_of(&outcome.products[0]), 80);
        assert_eq!(offset_of(&outcome.products[49]), 129);
        assert_eq!(
            backend.products_calls.load(std::sync::atomic::Ordering::SeqCst),
            calls_before + 1
        );

        // The full 200-item fetch was cached (merged under group 0), so the
        // whole of [0, 200) is now answerable without the backend.
        let hit = store
            .products_in_range(&RowKey::subcategory("Produce", "Fruit"), 0, 200)
            .unwrap();
        assert_eq!(hit.products.len(), 200);
    }

    #[tokio::test]
    async fn cache_hits_skip_the_backend_entirely() {
        let (backend, _store, navigator) = fixture(vec![100, 100, 50]);

        navigator.navigate(NavDirection::Right).await.unwrap();
        let calls = backend.products_calls.load(std::sync::atomic::Ordering::SeqCst);

        // Step back left: [0, 50) is inside the cached group 0.
        let outcome = navigator.navigate(NavDirection::Left).await.unwrap().unwrap();
        assert_eq!(offset_of(&outcome.products[0]), 0);
        assert_eq!(
            backend.products_calls.load(std::sync::atomic::Ordering::SeqCst),
            calls
        );
    }

    #[tokio::test]
    async fn has_more_progression_disables_the_right_arrow_at_the_end() {
        let (_backend, _store, navigator) = fixture(vec![100, 100, 50]);

        // total 250, capacity 50: five windows.
        for step in 0..5 {
            let outcome = navigator.navigate(NavDirection::Right).await.unwrap().unwrap();
            assert_eq!(outcome.total, 250);
            assert_eq!(navigator.left_disabled(), step == 0, "step {step}");
            assert_eq!(navigator.right_disabled(), step == 4, "step {step}");
            assert_eq!(outcome.has_more, step != 4, "step {step}");
        }
        assert_eq!(navigator.window().end, 250);
    }

    #[tokio::test]
    async fn boundary_failure_degrades_to_a_single_group_fetch() {
        let (backend, _store, navigator) = fixture(vec![100, 100, 50]);
        backend
            .fail_counts
            .store(true, std::sync::atomic::Ordering::SeqCst);

        let outcome = navigator.navigate(NavDirection::Right).await.unwrap().unwrap();
        // Only group 0 was fetched; the backend's own has_more keeps the
        // forward control alive.
        assert_eq!(outcome.products.len(), 50);
        assert!(outcome.has_more);
        assert_eq!(backend.products_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn rpc_failure_surfaces_and_leaves_state_retryable() {
        let (backend, store, navigator) = fixture(vec![100]);
        backend
            .fail_products
            .store(true, std::sync::atomic::Ordering::SeqCst);

        let err = navigator.navigate(NavDirection::Right).await.unwrap_err();
        assert!(matches!(err, ClientError::Rpc(_)));
        assert_eq!(navigator.nav_state(), NavState::Error);
        assert_eq!(navigator.window(), VirtualWindow::default());
        assert!(store
            .products_in_range(&RowKey::subcategory("Produce", "Fruit"), 0, 1)
            .is_none());

        // Manual retry works once the backend recovers.
        backend
            .fail_products
            .store(false, std::sync::atomic::Ordering::SeqCst);
        let outcome = navigator.navigate(NavDirection::Right).await.unwrap().unwrap();
        assert_eq!(outcome.products.len(), 50);
        assert_eq!(navigator.nav_state(), NavState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_supersedes_an_in_flight_navigation() {
        let backend = Arc::new({
            let mut b = MockBackend::with_counts(vec![100]);
            b.products_delay_ms = 50;
            b
        });
        let store = Arc::new(CatalogStore::new(Arc::new(ManualClock::default())));
        let navigator = Arc::new(RowNavigator::with_config(
            backend,
            store,
            RowKey::subcategory("Produce", "Fruit"),
            NavigatorConfig {
                explicit_capacity: Some(50),
                ..NavigatorConfig::default()
            },
        ));

        let flight = {
            let nav = Arc::clone(&navigator);
            tokio::spawn(async move { nav.navigate(NavDirection::Right).await })
        };
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        navigator.reset();

        // The fetch resolves but its result is discarded.
        assert_eq!(flight.await.unwrap().unwrap(), None);
        assert_eq!(navigator.window(), VirtualWindow::default());
    }

    #[tokio::test]
    async fn all_groups_undecodable_is_a_decode_error() {
        let store = Arc::new(CatalogStore::new(Arc::new(ManualClock::default())));
        // Hand-roll a backend whose groups are malformed.
        struct BadBackend;
        #[async_trait::async_trait]
        impl CatalogBackend for BadBackend {
            async fn products_by_category(
                &self,
                _request: ProductsRequest,
            ) -> Result<crate::backend::ProductsResponse, crate::error::RpcError> {
                Ok(crate::backend::ProductsResponse {
                    product_groups: vec![aisle_core::EncodedGroup {
                        action_hash: String::new(),
                        products: vec![json!({ "ok": true })],
                    }],
                    total_products: 1,
                    has_more: false,
                })
            }
            async fn group_counts(
                &self,
                _request: CountsRequest,
            ) -> Result<Vec<usize>, crate::error::RpcError> {
                Ok(vec![1])
            }
            async fn active_catalog(
                &self,
            ) -> Result<crate::backend::CatalogSeed, crate::error::RpcError> {
                Ok(crate::backend::CatalogSeed("s".into()))
            }
            async fn resolve_cell(
                &self,
                _seed: &crate::backend::CatalogSeed,
            ) -> Result<crate::backend::CellId, crate::error::RpcError> {
                Ok(crate::backend::CellId("c".into()))
            }
        }

        let navigator = RowNavigator::with_config(
            Arc::new(BadBackend),
            store,
            RowKey::subcategory("Produce", "Fruit"),
            NavigatorConfig {
                explicit_capacity: Some(10),
                ..NavigatorConfig::default()
            },
        );
        let err = navigator.navigate(NavDirection::Right).await.unwrap_err();
        assert_eq!(err, ClientError::Decode { skipped: 1 });
    }

    #[tokio::test]
    async fn capacity_recomputes_from_container_width_when_unset() {
        let backend = Arc::new(MockBackend::with_counts(vec![100]));
        let store = Arc::new(CatalogStore::new(Arc::new(ManualClock::default())));
        let navigator = RowNavigator::new(
            backend,
            store,
            RowKey::subcategory("Produce", "Fruit"),
        );
        navigator.set_container_width(1000.0);

        let outcome = navigator.navigate(NavDirection::Right).await.unwrap().unwrap();
        // floor(1000 / 245) = 4
        assert_eq!(outcome.products.len(), 4);
        assert_eq!(navigator.window().capacity, 4);
    }
}
