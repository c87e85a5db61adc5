//! Shared test doubles: a hand-advanced clock and a scripted backend.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use aisle_core::EncodedGroup;
use async_trait::async_trait;
use serde_json::json;

use crate::backend::{
    CatalogBackend, CatalogSeed, CellId, CountsRequest, ProductsRequest, ProductsResponse,
};
use crate::error::RpcError;
use crate::store::Clock;

/// Test clock advanced by hand.
#[derive(Debug, Default)]
pub(crate) struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub(crate) fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Scripted catalog backend.
///
/// Serves groups synthesized from a per-group count table; each payload
/// carries its absolute virtual offset so tests can assert slicing. Failure
/// flags and response delays are tweakable per call site.
pub(crate) struct MockBackend {
    /// Per-group item counts the mock catalog holds.
    pub counts: Vec<usize>,
    /// Fail the next product fetches.
    pub fail_products: AtomicBool,
    /// Fail the next count listings.
    pub fail_counts: AtomicBool,
    /// Fail the directory calls.
    pub fail_directory: AtomicBool,
    /// Serve this many empty product responses before real data (canary
    /// warm-up).
    pub empty_products_responses: AtomicU64,
    /// Delay applied to every product fetch, in milliseconds.
    pub products_delay_ms: u64,
    pub products_calls: AtomicU64,
    pub counts_calls: AtomicU64,
    pub directory_calls: AtomicU64,
}

impl MockBackend {
    pub(crate) fn with_counts(counts: Vec<usize>) -> Self {
        Self {
            counts,
            fail_products: AtomicBool::new(false),
            fail_counts: AtomicBool::new(false),
            fail_directory: AtomicBool::new(false),
            empty_products_responses: AtomicU64::new(0),
            products_delay_ms: 0,
            products_calls: AtomicU64::new(0),
            counts_calls: AtomicU64::new(0),
            directory_calls: AtomicU64::new(0),
        }
    }

    fn group(&self, ordinal: usize) -> EncodedGroup {
        let base: usize = self.counts[..ordinal].iter().sum();
        EncodedGroup {
            action_hash: format!("grp{ordinal}"),
            products: (0..self.counts[ordinal])
                .map(|j| json!({ "offset": base + j }))
                .collect(),
        }
    }
}

#[async_trait]
impl CatalogBackend for MockBackend {
    async fn products_by_category(
        &self,
        request: ProductsRequest,
    ) -> Result<ProductsResponse, RpcError> {
        self.products_calls.fetch_add(1, Ordering::SeqCst);
        if self.products_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.products_delay_ms)).await;
        }
        if self.fail_products.load(Ordering::SeqCst) {
            return Err(RpcError::new("mock products failure"));
        }
        let remaining = self.empty_products_responses.load(Ordering::SeqCst);
        if remaining > 0 {
            self.empty_products_responses
                .store(remaining - 1, Ordering::SeqCst);
            return Ok(ProductsResponse {
                product_groups: Vec::new(),
                total_products: 0,
                has_more: false,
            });
        }
        let first = request.offset.min(self.counts.len());
        let last = (request.offset + request.limit).min(self.counts.len());
        Ok(ProductsResponse {
            product_groups: (first..last).map(|g| self.group(g)).collect(),
            total_products: self.counts.iter().sum(),
            has_more: last < self.counts.len(),
        })
    }

    async fn group_counts(&self, _request: CountsRequest) -> Result<Vec<usize>, RpcError> {
        self.counts_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_counts.load(Ordering::SeqCst) {
            return Err(RpcError::new("mock counts failure"));
        }
        Ok(self.counts.clone())
    }

    async fn active_catalog(&self) -> Result<CatalogSeed, RpcError> {
        self.directory_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_directory.load(Ordering::SeqCst) {
            return Err(RpcError::new("mock directory failure"));
        }
        Ok(CatalogSeed("seed-1".to_string()))
    }

    async fn resolve_cell(&self, seed: &CatalogSeed) -> Result<CellId, RpcError> {
        if self.fail_directory.load(Ordering::SeqCst) {
            return Err(RpcError::new("mock directory failure"));
        }
        Ok(CellId(format!("cell-{seed}")))
    }
}
