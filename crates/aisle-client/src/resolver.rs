//! Catalog cell resolution.
//!
//! Every product RPC is routed to a backend partition ("cell") that must be
//! resolved from the catalog directory before anything else can run. The
//! resolver caches the active cell with a single-flight guarantee: while one
//! resolution is in progress, concurrent callers poll for its result instead
//! of starting duplicate setups. The cached cell is refreshed once per UTC
//! day, and cleared when the application signals that backend calls have
//! started failing, unless a setup is in flight, in which case the clear is
//! suppressed to avoid racing it.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use aisle_core::CategoryPath;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::backend::{CatalogBackend, CellId, ProductsRequest};
use crate::error::ClientError;
use crate::store::Clock;

const MS_PER_DAY: u64 = 24 * 60 * 60 * 1000;

/// Tuning knobs for cell resolution.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Interval at which concurrent callers poll an in-flight setup.
    pub flight_poll_ms: u64,
    /// How long a concurrent caller waits on an in-flight setup before
    /// giving up.
    pub flight_wait_timeout_ms: u64,
    /// Interval of the data-availability canary poll.
    pub canary_poll_ms: u64,
    /// Total time allowed for the canary poll; past it, resolution proceeds
    /// with a warning rather than failing.
    pub canary_timeout_ms: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            flight_poll_ms: 100,
            flight_wait_timeout_ms: 30_000,
            canary_poll_ms: 2_000,
            canary_timeout_ms: 15_000,
        }
    }
}

#[derive(Debug, Clone)]
enum ResolutionState {
    Uncached,
    Resolving,
    Cached { cell: CellId, resolved_day: u64 },
}

enum Step {
    Use(CellId),
    Wait,
    Setup,
}

/// Single-flight resolver for the active catalog cell.
pub struct CellResolver {
    backend: Arc<dyn CatalogBackend>,
    clock: Arc<dyn Clock>,
    /// Path used by the data-availability canary query.
    canary_path: CategoryPath,
    config: ResolverConfig,
    state: Mutex<ResolutionState>,
}

impl CellResolver {
    /// Resolver with default tuning.
    #[must_use]
    pub fn new(
        backend: Arc<dyn CatalogBackend>,
        clock: Arc<dyn Clock>,
        canary_path: CategoryPath,
    ) -> Self {
        Self::with_config(backend, clock, canary_path, ResolverConfig::default())
    }

    /// Resolver with explicit tuning.
    #[must_use]
    pub fn with_config(
        backend: Arc<dyn CatalogBackend>,
        clock: Arc<dyn Clock>,
        canary_path: CategoryPath,
        config: ResolverConfig,
    ) -> Self {
        Self {
            backend,
            clock,
            canary_path,
            config,
            state: Mutex::new(ResolutionState::Uncached),
        }
    }

    /// The active cell, resolving it first if needed.
    ///
    /// Concurrent callers during a resolution all observe the value of the
    /// single in-flight setup. Fails with [`ClientError::CatalogNotReady`]
    /// when no active catalog can be found; callers surface that as a
    /// retryable loading state.
    pub async fn active_cell_id(&self) -> Result<CellId, ClientError> {
        let wait_deadline =
            Instant::now() + Duration::from_millis(self.config.flight_wait_timeout_ms);
        loop {
            let step = {
                let mut state = self.state.lock().expect("resolver mutex poisoned");
                match &*state {
                    ResolutionState::Cached { cell, resolved_day }
                        if *resolved_day == self.today() =>
                    {
                        Step::Use(cell.clone())
                    }
                    ResolutionState::Cached { .. } => {
                        debug!("cached cell is from a previous day, re-resolving");
                        *state = ResolutionState::Resolving;
                        Step::Setup
                    }
                    ResolutionState::Resolving => Step::Wait,
                    ResolutionState::Uncached => {
                        *state = ResolutionState::Resolving;
                        Step::Setup
                    }
                }
            };

            match step {
                Step::Use(cell) => return Ok(cell),
                Step::Wait => {
                    if Instant::now() >= wait_deadline {
                        warn!("gave up waiting on an in-flight cell resolution");
                        return Err(ClientError::CatalogNotReady);
                    }
                    sleep(Duration::from_millis(self.config.flight_poll_ms)).await;
                }
                Step::Setup => {
                    let result = self.run_setup().await;
                    let mut state = self.state.lock().expect("resolver mutex poisoned");
                    return match result {
                        Ok(cell) => {
                            *state = ResolutionState::Cached {
                                cell: cell.clone(),
                                resolved_day: self.today(),
                            };
                            Ok(cell)
                        }
                        Err(err) => {
                            *state = ResolutionState::Uncached;
                            Err(err)
                        }
                    };
                }
            }
        }
    }

    /// The cached cell, if resolution has completed today.
    #[must_use]
    pub fn cached_cell(&self) -> Option<CellId> {
        match &*self.state.lock().expect("resolver mutex poisoned") {
            ResolutionState::Cached { cell, resolved_day } if *resolved_day == self.today() => {
                Some(cell.clone())
            }
            _ => None,
        }
    }

    /// Drop the cached cell so the next caller re-resolves.
    ///
    /// Called when backend RPCs start failing elsewhere in the application,
    /// which may mean the resolution went stale. Suppressed (returns
    /// `false`) while a setup is in flight.
    pub fn invalidate(&self) -> bool {
        let mut state = self.state.lock().expect("resolver mutex poisoned");
        match *state {
            ResolutionState::Resolving => false,
            _ => {
                *state = ResolutionState::Uncached;
                true
            }
        }
    }

    fn today(&self) -> u64 {
        self.clock.now_ms() / MS_PER_DAY
    }

    /// Directory lookup, cell resolution, then a bounded poll until the
    /// canary query confirms data availability. Transient empty or failed
    /// canary responses are tolerated; a poll timeout proceeds with a
    /// warning rather than failing.
    async fn run_setup(&self) -> Result<CellId, ClientError> {
        let seed = self.backend.active_catalog().await.map_err(|err| {
            warn!(error = %err, "no active catalog found");
            ClientError::CatalogNotReady
        })?;
        let cell = self.backend.resolve_cell(&seed).await.map_err(|err| {
            warn!(error = %err, seed = %seed, "cell resolution failed");
            ClientError::CatalogNotReady
        })?;
        debug!(cell = %cell, "catalog cell resolved, confirming data availability");

        let deadline = Instant::now() + Duration::from_millis(self.config.canary_timeout_ms);
        loop {
            let request = ProductsRequest::for_path(&self.canary_path, 0, 1);
            match self.backend.products_by_category(request).await {
                Ok(response) if !response.product_groups.is_empty() => break,
                Ok(_) => debug!("canary query returned no data yet"),
                Err(err) => debug!(error = %err, "canary query failed, will retry"),
            }
            if Instant::now() >= deadline {
                warn!(cell = %cell, "data availability poll timed out, proceeding anyway");
                break;
            }
            sleep(Duration::from_millis(self.config.canary_poll_ms)).await;
        }
        Ok(cell)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_util::{ManualClock, MockBackend};
    use std::sync::atomic::Ordering;

    fn resolver(backend: Arc<MockBackend>, clock: Arc<ManualClock>) -> Arc<CellResolver> {
        Arc::new(CellResolver::new(
            backend,
            clock,
            CategoryPath::category("Produce"),
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn resolves_and_caches_the_active_cell() {
        let backend = Arc::new(MockBackend::with_counts(vec![10]));
        let clock = Arc::new(ManualClock::default());
        let resolver = resolver(backend.clone(), clock);

        let cell = resolver.active_cell_id().await.unwrap();
        assert_eq!(cell, CellId("cell-seed-1".to_string()));
        assert_eq!(backend.directory_calls.load(Ordering::SeqCst), 1);

        // Second call is served from cache; no further directory traffic.
        let again = resolver.active_cell_id().await.unwrap();
        assert_eq!(again, cell);
        assert_eq!(backend.directory_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_share_one_setup() {
        // Keep the setup in flight long enough for the others to pile up.
        let mut slow = MockBackend::with_counts(vec![10]);
        slow.products_delay_ms = 500;
        let backend = Arc::new(slow);
        let clock = Arc::new(ManualClock::default());
        let resolver = resolver(backend.clone(), clock);

        let mut handles = Vec::new();
        for _ in 0..4 {
            let r = Arc::clone(&resolver);
            handles.push(tokio::spawn(async move { r.active_cell_id().await }));
        }
        let mut cells = Vec::new();
        for handle in handles {
            cells.push(handle.await.unwrap().unwrap());
        }

        assert!(cells.windows(2).all(|pair| pair[0] == pair[1]));
        assert_eq!(backend.directory_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn canary_tolerates_empty_responses_then_succeeds() {
        let backend = Arc::new(MockBackend::with_counts(vec![10]));
        backend.empty_products_responses.store(2, Ordering::SeqCst);
        let clock = Arc::new(ManualClock::default());
        let resolver = resolver(backend.clone(), clock);

        let cell = resolver.active_cell_id().await.unwrap();
        assert_eq!(cell, CellId("cell-seed-1".to_string()));
        // Two empty polls plus the confirming one.
        assert_eq!(backend.products_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn canary_timeout_proceeds_with_a_warning() {
        let backend = Arc::new(MockBackend::with_counts(vec![10]));
        // More empties than the 15s poll window allows at 2s per poll.
        backend.empty_products_responses.store(100, Ordering::SeqCst);
        let clock = Arc::new(ManualClock::default());
        let resolver = resolver(backend.clone(), clock);

        // Availability is best effort: resolution still completes.
        let cell = resolver.active_cell_id().await.unwrap();
        assert_eq!(cell, CellId("cell-seed-1".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn directory_failure_rejects_and_stays_uncached() {
        let backend = Arc::new(MockBackend::with_counts(vec![10]));
        backend.fail_directory.store(true, Ordering::SeqCst);
        let clock = Arc::new(ManualClock::default());
        let resolver = resolver(backend.clone(), clock);

        let err = resolver.active_cell_id().await.unwrap_err();
        assert_eq!(err, ClientError::CatalogNotReady);
        assert!(resolver.cached_cell().is_none());

        // A later attempt retries the directory.
        backend.fail_directory.store(false, Ordering::SeqCst);
        assert!(resolver.active_cell_id().await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn cached_cell_is_refreshed_daily() {
        let backend = Arc::new(MockBackend::with_counts(vec![10]));
        let clock = Arc::new(ManualClock::default());
        let resolver = resolver(backend.clone(), clock.clone());

        resolver.active_cell_id().await.unwrap();
        assert_eq!(backend.directory_calls.load(Ordering::SeqCst), 1);

        // Same day: cache holds.
        clock.advance(MS_PER_DAY - 1);
        resolver.active_cell_id().await.unwrap();
        assert_eq!(backend.directory_calls.load(Ordering::SeqCst), 1);

        // Day rollover: re-resolve.
        clock.advance(1);
        resolver.active_cell_id().await.unwrap();
        assert_eq!(backend.directory_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn invalidate_clears_unless_a_setup_is_in_flight() {
        let backend = Arc::new(MockBackend::with_counts(vec![10]));
        let clock = Arc::new(ManualClock::default());
        let resolver = resolver(backend.clone(), clock);

        resolver.active_cell_id().await.unwrap();
        assert!(resolver.invalidate());
        assert!(resolver.cached_cell().is_none());

        // While resolving, the clear is suppressed.
        let mut slow = MockBackend::with_counts(vec![10]);
        slow.products_delay_ms = 500;
        let backend = Arc::new(slow);
        let resolver = Arc::new(CellResolver::new(
            backend,
            Arc::new(ManualClock::default()),
            CategoryPath::category("Produce"),
        ));
        let flight = {
            let r = Arc::clone(&resolver);
            tokio::spawn(async move { r.active_cell_id().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!resolver.invalidate());
        flight.await.unwrap().unwrap();
    }
}
