//! Landing-data browsing.
//!
//! The first paint of a category, subcategory or product-type view uses
//! whole-set fetches that are independent of row-level pagination. Results
//! live in the shared category cache for five minutes; within that window
//! repeat visits render without touching the backend.

use std::sync::Arc;

use aisle_core::{decode_groups, CategoryPath, CategorySlot, Detail, Product};
use tracing::{debug, warn};

use crate::backend::{CatalogBackend, ProductsRequest};
use crate::error::ClientError;
use crate::store::CatalogStore;

/// Tuning knobs for landing-data fetches, in backend group units.
#[derive(Debug, Clone)]
pub struct BrowseConfig {
    /// Groups fetched for a preview row.
    pub preview_groups: usize,
    /// Groups fetched for a full result set.
    pub full_groups: usize,
}

impl Default for BrowseConfig {
    fn default() -> Self {
        Self {
            preview_groups: 1,
            full_groups: 4,
        }
    }
}

/// One landing-data result set.
#[derive(Debug, Clone, PartialEq)]
pub struct LandingSet {
    /// The products to render.
    pub products: Vec<Product>,
    /// Grand total for the path, for "N items" display.
    pub total: usize,
}

/// Cached whole-set browsing over categories, subcategories and product
/// types.
pub struct CategoryBrowser {
    backend: Arc<dyn CatalogBackend>,
    store: Arc<CatalogStore>,
    config: BrowseConfig,
}

impl CategoryBrowser {
    /// Browser with default tuning.
    #[must_use]
    pub fn new(backend: Arc<dyn CatalogBackend>, store: Arc<CatalogStore>) -> Self {
        Self::with_config(backend, store, BrowseConfig::default())
    }

    /// Browser with explicit tuning.
    #[must_use]
    pub fn with_config(
        backend: Arc<dyn CatalogBackend>,
        store: Arc<CatalogStore>,
        config: BrowseConfig,
    ) -> Self {
        Self {
            backend,
            store,
            config,
        }
    }

    /// Whole-category result set.
    pub async fn category(&self, name: &str) -> Result<LandingSet, ClientError> {
        let slot = CategorySlot::Category {
            name: name.to_string(),
        };
        self.fetch(slot, CategoryPath::category(name), self.config.full_groups)
            .await
    }

    /// Whole-subcategory result set.
    pub async fn subcategory(&self, category: &str, name: &str) -> Result<LandingSet, ClientError> {
        let slot = CategorySlot::Subcategory {
            name: name.to_string(),
        };
        self.fetch(
            slot,
            CategoryPath::subcategory(category, name),
            self.config.full_groups,
        )
        .await
    }

    /// Product-type result set at the requested detail level.
    pub async fn product_type(
        &self,
        category: &str,
        subcategory: &str,
        name: &str,
        detail: Detail,
    ) -> Result<LandingSet, ClientError> {
        let slot = CategorySlot::ProductTypeSet {
            subcategory: subcategory.to_string(),
            product_type: name.to_string(),
            detail,
        };
        let groups = match detail {
            Detail::Preview => self.config.preview_groups,
            Detail::Full => self.config.full_groups,
        };
        self.fetch(
            slot,
            CategoryPath::product_type(category, subcategory, name),
            groups,
        )
        .await
    }

    async fn fetch(
        &self,
        slot: CategorySlot,
        path: CategoryPath,
        groups: usize,
    ) -> Result<LandingSet, ClientError> {
        if let Some(entry) = self.store.category_get(&slot) {
            debug!(path = %path, "landing data served from cache");
            return Ok(LandingSet {
                products: entry.products,
                total: entry.total,
            });
        }

        let request = ProductsRequest::for_path(&path, 0, groups);
        let response = self.backend.products_by_category(request).await?;
        let decoded = decode_groups(&response.product_groups);
        if decoded.skipped_groups > 0 {
            warn!(
                path = %path,
                skipped = decoded.skipped_groups,
                "skipped undecodable product groups in landing data"
            );
        }
        if decoded.products.is_empty() && decoded.skipped_groups > 0 {
            return Err(ClientError::Decode {
                skipped: decoded.skipped_groups,
            });
        }

        let total = response.total_products.max(decoded.products.len());
        self.store
            .category_put(slot, decoded.products.clone(), total);
        debug!(path = %path, items = decoded.products.len(), total, "landing data fetched");
        Ok(LandingSet {
            products: decoded.products,
            total,
        })
    }
}
