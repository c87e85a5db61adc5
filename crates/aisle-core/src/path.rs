//! Browsing paths and row cache scopes.
//!
//! A [`CategoryPath`] identifies a logical browsing context (category,
//! optional subcategory, optional product type) and is the root key for
//! boundary and category caching. A [`RowScope`] identifies which kind of
//! row a navigation cache slot belongs to, replacing the stringly-typed
//! `"Category_Subcategory"` tokens the storefront used to split apart at
//! lookup time.

use serde::{Deserialize, Serialize};

/// A fully resolved browsing path.
///
/// Two paths are equal iff all three fields match, `None`-aware.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryPath {
    /// Top-level category name.
    pub category: String,
    /// Subcategory within the category, if narrowed.
    pub subcategory: Option<String>,
    /// Product type within the subcategory, if narrowed further.
    pub product_type: Option<String>,
}

impl CategoryPath {
    /// Path addressing a whole category.
    #[must_use]
    pub fn category(name: impl Into<String>) -> Self {
        Self {
            category: name.into(),
            subcategory: None,
            product_type: None,
        }
    }

    /// Path addressing one subcategory.
    #[must_use]
    pub fn subcategory(category: impl Into<String>, subcategory: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            subcategory: Some(subcategory.into()),
            product_type: None,
        }
    }

    /// Path addressing one product type.
    #[must_use]
    pub fn product_type(
        category: impl Into<String>,
        subcategory: impl Into<String>,
        product_type: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            subcategory: Some(subcategory.into()),
            product_type: Some(product_type.into()),
        }
    }
}

impl std::fmt::Display for CategoryPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.category)?;
        if let Some(sub) = &self.subcategory {
            write!(f, "/{sub}")?;
        }
        if let Some(pt) = &self.product_type {
            write!(f, "/{pt}")?;
        }
        Ok(())
    }
}

/// What a navigation row is scoped to.
///
/// Constructed once at the call site; no string splitting is performed
/// anywhere downstream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RowScope {
    /// A subcategory row inside a category page.
    Subcategory {
        /// Subcategory name.
        name: String,
    },
    /// A product-type row inside a subcategory page.
    ProductType {
        /// Product type name.
        name: String,
    },
    /// A home-view row showing one subcategory of some category.
    HomeRow {
        /// Category the row draws from.
        category: String,
        /// Subcategory the row draws from.
        subcategory: String,
    },
}

/// Compound scope key for the row navigation cache.
///
/// `category` is the page the row is displayed on; `scope` says what the row
/// actually lists. Cache lookups are always scoped by the full key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowKey {
    /// Category of the page owning the row.
    pub category: String,
    /// What the row lists.
    pub scope: RowScope,
}

impl RowKey {
    /// Create a key for a subcategory row.
    #[must_use]
    pub fn subcategory(category: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            scope: RowScope::Subcategory { name: name.into() },
        }
    }

    /// Create a key for a product-type row.
    #[must_use]
    pub fn product_type(category: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            scope: RowScope::ProductType { name: name.into() },
        }
    }

    /// Create a key for a home-view row.
    #[must_use]
    pub fn home_row(
        page_category: impl Into<String>,
        category: impl Into<String>,
        subcategory: impl Into<String>,
    ) -> Self {
        Self {
            category: page_category.into(),
            scope: RowScope::HomeRow {
                category: category.into(),
                subcategory: subcategory.into(),
            },
        }
    }

    /// The backend path this row's products are fetched from.
    #[must_use]
    pub fn to_path(&self) -> CategoryPath {
        match &self.scope {
            RowScope::Subcategory { name } => CategoryPath::subcategory(&self.category, name),
            RowScope::ProductType { name } => CategoryPath {
                category: self.category.clone(),
                subcategory: None,
                product_type: Some(name.clone()),
            },
            RowScope::HomeRow {
                category,
                subcategory,
            } => CategoryPath::subcategory(category, subcategory),
        }
    }
}
