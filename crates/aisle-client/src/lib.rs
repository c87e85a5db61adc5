//! Asynchronous catalog client for the Aisle storefront.
//!
//! Everything the UI shell needs to browse a remote product catalog sits
//! behind four pieces:
//! - [`CatalogBackend`]: the opaque ledger RPC surface
//! - [`CatalogStore`]: the shared, dependency-injected cache state
//! - [`RowNavigator`]: per-row windowed pagination over cached groups
//! - [`CellResolver`]: single-flight resolution of the active backend
//!   partition, which must complete before any product RPC is issued
//!
//! Wiring at application start looks like:
//!
//! ```no_run
//! use std::sync::Arc;
//! use aisle_client::{CatalogStore, CellResolver, RowNavigator, SystemClock};
//! use aisle_core::{CategoryPath, RowKey};
//! # fn wire(backend: Arc<dyn aisle_client::CatalogBackend>) {
//! let clock = Arc::new(SystemClock);
//! let store = Arc::new(CatalogStore::new(clock.clone()));
//! let resolver = CellResolver::new(backend.clone(), clock, CategoryPath::category("Featured"));
//! let fruit_row = RowNavigator::new(backend, store, RowKey::subcategory("Produce", "Fruit"));
//! # let _ = (resolver, fruit_row);
//! # }
//! ```

pub mod backend;
pub mod browse;
pub mod error;
pub mod navigator;
pub mod resolver;
pub mod store;

#[cfg(test)]
pub(crate) mod test_util;

pub use backend::{
    CatalogBackend, CatalogSeed, CellId, CountsRequest, ProductsRequest, ProductsResponse,
};
pub use browse::{BrowseConfig, CategoryBrowser, LandingSet};
pub use error::{ClientError, RpcError};
pub use navigator::{NavState, NavigationOutcome, NavigatorConfig, RowNavigator};
pub use resolver::{CellResolver, ResolverConfig};
pub use store::{CatalogStore, Clock, SystemClock};
