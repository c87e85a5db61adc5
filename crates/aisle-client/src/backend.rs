//! Backend RPC surface.
//!
//! The distributed ledger behind the storefront is consumed strictly through
//! this trait: a paged product fetch in group units, a per-group count
//! listing, and the catalog directory calls used by cell resolution.
//! Implementations own transport, retries at the wire level, and encoding;
//! the engine never sees past these shapes.

use aisle_core::{CategoryPath, EncodedGroup};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RpcError;

/// Paged product fetch. `offset` and `limit` count backend *groups*, not
/// items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductsRequest {
    /// Category to fetch from.
    pub category: String,
    /// Optional subcategory narrowing.
    pub subcategory: Option<String>,
    /// Optional product-type narrowing.
    pub product_type: Option<String>,
    /// First group ordinal to return.
    pub offset: usize,
    /// Number of groups to return.
    pub limit: usize,
}

impl ProductsRequest {
    /// Request `limit` groups starting at group `offset` for a path.
    #[must_use]
    pub fn for_path(path: &CategoryPath, offset: usize, limit: usize) -> Self {
        Self {
            category: path.category.clone(),
            subcategory: path.subcategory.clone(),
            product_type: path.product_type.clone(),
            offset,
            limit,
        }
    }
}

/// Response to a paged product fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductsResponse {
    /// The requested groups, in ordinal order.
    pub product_groups: Vec<EncodedGroup>,
    /// Grand total of products for the path, as known to the backend.
    pub total_products: usize,
    /// Whether groups exist past the returned window.
    pub has_more: bool,
}

/// Per-group count listing for a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountsRequest {
    /// Category to list counts for.
    pub category: String,
    /// Optional subcategory narrowing.
    pub subcategory: Option<String>,
    /// Optional product-type narrowing.
    pub product_type: Option<String>,
}

impl CountsRequest {
    /// Count listing for a path.
    #[must_use]
    pub fn for_path(path: &CategoryPath) -> Self {
        Self {
            category: path.category.clone(),
            subcategory: path.subcategory.clone(),
            product_type: path.product_type.clone(),
        }
    }
}

/// Opaque identity of the currently active catalog, as reported by the
/// backend directory service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CatalogSeed(pub String);

impl std::fmt::Display for CatalogSeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Concrete backend partition handle all product RPCs are routed to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellId(pub String);

impl std::fmt::Display for CellId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The ledger as the engine sees it.
#[async_trait]
pub trait CatalogBackend: Send + Sync {
    /// Fetch a window of product groups for a path.
    async fn products_by_category(
        &self,
        request: ProductsRequest,
    ) -> Result<ProductsResponse, RpcError>;

    /// Ordered per-group item counts for a path.
    async fn group_counts(&self, request: CountsRequest) -> Result<Vec<usize>, RpcError>;

    /// Identity of the currently active catalog.
    async fn active_catalog(&self) -> Result<CatalogSeed, RpcError>;

    /// Resolve a catalog identity to a concrete partition handle.
    async fn resolve_cell(&self, seed: &CatalogSeed) -> Result<CellId, RpcError>;
}
