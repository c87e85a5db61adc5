//! Core engine for the Aisle storefront client.
//!
//! This crate holds the pure, synchronous machinery behind smooth windowed
//! browsing of large remote product catalogs:
//! - Browsing paths and row scopes: [`CategoryPath`], [`RowScope`], [`RowKey`]
//! - Group decoding and stable product identity: [`Product`], [`EncodedGroup`]
//! - The group boundary index: [`BoundaryIndex`], [`GroupBoundary`]
//! - Navigation and landing-data caches: [`RowNavigationCache`],
//!   [`CategoryCache`]
//! - Grid virtualization: [`GridVirtualizer`], [`VisibleRange`]
//! - Update pacing: [`FrameScheduler`], [`Debouncer`]
//!
//! Nothing here performs I/O or owns a clock; callers advance cache
//! timestamps and drive frame ticks, which keeps every piece directly
//! testable. The asynchronous backend surface lives in `aisle-client`.

pub mod boundary;
pub mod category_cache;
pub mod path;
pub mod product;
pub mod row_cache;
pub mod schedule;
pub mod virtualization;
pub mod window;

pub use boundary::{BoundaryIndex, GroupBoundary, GroupSpan};
pub use category_cache::{CategoryCache, CategoryCacheConfig, CategoryEntry, CategorySlot, Detail};
pub use path::{CategoryPath, RowKey, RowScope};
pub use product::{decode_group, decode_groups, DecodeOutcome, EncodedGroup, GroupDecodeError, Product};
pub use row_cache::{
    CacheStats, RangeHit, RowCacheConfig, RowCacheEntry, RowNavigationCache, StoreOutcome,
    DEFAULT_TTL_MS,
};
pub use schedule::{Debouncer, FrameScheduler};
pub use virtualization::{
    GridVirtualizer, ItemPosition, TickOutcome, VirtualizerConfig, VisibleRange, ZoomWatcher,
};
pub use window::{NavDirection, VirtualWindow, WindowTarget};
