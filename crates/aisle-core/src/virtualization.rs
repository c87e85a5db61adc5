//! Grid virtualization engine.
//!
//! Computes, from container size and scroll position, which product indices
//! are currently visible so only those get rendered. Maintains a position
//! cache (top/left pixel offsets per index, space-between horizontal
//! layout) and re-derives columns-per-row when the container resizes or the
//! device pixel ratio changes.
//!
//! Input pacing: scroll events stage a target offset that is committed at
//! most once per frame tick; resizes are debounced; zoom re-checks run only
//! after input-completion events go quiet.

use std::collections::HashMap;
use std::ops::Range;

use crate::schedule::{Debouncer, FrameScheduler};

/// Tuning knobs for the virtualizer.
#[derive(Debug, Clone)]
pub struct VirtualizerConfig {
    /// Rendered item width in pixels.
    pub item_width: f32,
    /// Rendered row height in pixels.
    pub row_height: f32,
    /// Rows rendered beyond the viewport on each side to mask fetch and
    /// render latency during fast scrolling.
    pub overscan_rows: usize,
    /// Quiet window applied to container resize events, in milliseconds.
    pub resize_debounce_ms: u64,
    /// Quiet window applied to pixel-ratio re-checks, in milliseconds.
    pub zoom_debounce_ms: u64,
}

impl Default for VirtualizerConfig {
    fn default() -> Self {
        Self {
            item_width: 245.0,
            row_height: 320.0,
            overscan_rows: 3,
            resize_debounce_ms: 150,
            zoom_debounce_ms: 300,
        }
    }
}

/// Pixel offsets of one item within the scroll content.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemPosition {
    /// Distance from the top of the content.
    pub top: f32,
    /// Distance from the left edge of the container.
    pub left: f32,
}

/// Row window currently visible, plus the overscan buffer around it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleRange {
    /// First row intersecting the viewport.
    pub start_row: usize,
    /// One past the last row intersecting the viewport.
    pub end_row: usize,
    /// First row to render, overscan included.
    pub render_start_row: usize,
    /// One past the last row to render, overscan included.
    pub render_end_row: usize,
    /// Columns per row at the time the range was derived.
    pub columns: usize,
}

impl VisibleRange {
    /// Item indices to render, clamped to the item count.
    #[must_use]
    pub fn indices(&self, item_count: usize) -> Range<usize> {
        let start = (self.render_start_row * self.columns).min(item_count);
        let end = (self.render_end_row * self.columns).min(item_count);
        start..end
    }

    /// Whether the item at `index` should be rendered.
    #[must_use]
    pub fn should_render(&self, index: usize, item_count: usize) -> bool {
        self.indices(item_count).contains(&index)
    }
}

/// What changed during one frame tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    /// A debounced resize was applied.
    pub resized: bool,
    /// A pixel-ratio change forced a layout recompute.
    pub zoomed: bool,
    /// A staged scroll offset was committed.
    pub scrolled: bool,
}

impl TickOutcome {
    /// Whether columns or positions may have changed.
    #[must_use]
    pub fn layout_changed(&self) -> bool {
        self.resized || self.zoomed
    }

    /// Whether anything happened at all.
    #[must_use]
    pub fn any(&self) -> bool {
        self.resized || self.zoomed || self.scrolled
    }
}

/// Detects effective-zoom changes that browsers do not reliably surface as
/// resize events. Re-checks the device pixel ratio after coarse
/// input-completion events (pointer-up, key-up), debounced so rapid zoom
/// stepping settles before a recompute is forced.
#[derive(Debug, Clone)]
pub struct ZoomWatcher {
    ratio: f64,
    debounce: Debouncer,
}

impl ZoomWatcher {
    /// Watcher seeded with the current pixel ratio.
    #[must_use]
    pub fn new(initial_ratio: f64, debounce_ms: u64) -> Self {
        Self {
            ratio: initial_ratio,
            debounce: Debouncer::new(debounce_ms),
        }
    }

    /// Record an input-completion event.
    pub fn input_completed(&mut self, now_ms: u64) {
        self.debounce.note(now_ms);
    }

    /// Once the debounce window closes, compare ratios; `true` means the
    /// ratio changed and layout must be recomputed.
    pub fn check(&mut self, now_ms: u64, current_ratio: f64) -> bool {
        if !self.debounce.fire(now_ms) {
            return false;
        }
        if (current_ratio - self.ratio).abs() < f64::EPSILON {
            return false;
        }
        self.ratio = current_ratio;
        true
    }

    /// Last observed pixel ratio.
    #[must_use]
    pub fn ratio(&self) -> f64 {
        self.ratio
    }
}

/// Windowed layout state for one scrollable product grid.
#[derive(Debug)]
pub struct GridVirtualizer {
    config: VirtualizerConfig,
    container_width: f32,
    viewport_height: f32,
    item_count: usize,
    columns: usize,
    positions: HashMap<usize, ItemPosition>,
    scroll: FrameScheduler<f32>,
    committed_scroll: f32,
    pending_resize: Option<(f32, f32)>,
    resize_debounce: Debouncer,
    zoom: ZoomWatcher,
    visible: Option<VisibleRange>,
}

impl Default for GridVirtualizer {
    fn default() -> Self {
        Self::new(VirtualizerConfig::default())
    }
}

impl GridVirtualizer {
    /// Virtualizer with the given configuration and an unsized container.
    #[must_use]
    pub fn new(config: VirtualizerConfig) -> Self {
        let resize_debounce = Debouncer::new(config.resize_debounce_ms);
        let zoom = ZoomWatcher::new(1.0, config.zoom_debounce_ms);
        Self {
            config,
            container_width: 0.0,
            viewport_height: 0.0,
            item_count: 0,
            columns: 1,
            positions: HashMap::new(),
            scroll: FrameScheduler::new(),
            committed_scroll: 0.0,
            pending_resize: None,
            resize_debounce,
            zoom,
            visible: None,
        }
    }

    /// Replace the backing item count (data replacement).
    pub fn set_item_count(&mut self, count: usize) {
        if count == self.item_count {
            return;
        }
        self.item_count = count;
        self.rebuild_positions();
        self.update_visible();
    }

    /// Number of items currently backing the grid.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.item_count
    }

    /// Size the container immediately (initial mount), bypassing the resize
    /// debounce.
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.container_width = width;
        self.viewport_height = height;
        self.recompute_columns();
        self.rebuild_positions();
        self.update_visible();
    }

    /// Stage a container resize; applied after the debounce window closes.
    pub fn request_resize(&mut self, width: f32, height: f32, now_ms: u64) {
        self.pending_resize = Some((width, height));
        self.resize_debounce.note(now_ms);
    }

    /// Stage a scroll offset; committed at most once per [`tick`](Self::tick).
    pub fn note_scroll(&mut self, offset: f32) {
        self.scroll.set_target(offset.max(0.0));
    }

    /// Record a coarse input-completion event (pointer-up, key-up) for zoom
    /// re-checking.
    pub fn input_completed(&mut self, now_ms: u64) {
        self.zoom.input_completed(now_ms);
    }

    /// Run one frame: apply a due resize, re-check zoom, commit at most one
    /// staged scroll offset, and re-derive the visible window as needed.
    pub fn tick(&mut self, now_ms: u64, pixel_ratio: f64) -> TickOutcome {
        let mut outcome = TickOutcome::default();

        if self.resize_debounce.fire(now_ms) {
            if let Some((width, height)) = self.pending_resize.take() {
                self.container_width = width;
                self.viewport_height = height;
                outcome.resized = true;
            }
        }
        if self.zoom.check(now_ms, pixel_ratio) {
            outcome.zoomed = true;
        }
        if outcome.layout_changed() {
            self.recompute_columns();
            self.rebuild_positions();
        }

        if let Some(&offset) = self.scroll.commit_frame() {
            self.committed_scroll = offset.min(self.max_scroll());
            outcome.scrolled = true;
        }

        if outcome.any() {
            self.update_visible();
        }
        outcome
    }

    /// Items per row for the current container width, floored to at least 1.
    #[must_use]
    pub fn columns_per_row(&self) -> usize {
        self.columns
    }

    /// Rows needed for the current item count.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.item_count.div_ceil(self.columns)
    }

    /// Height of the full scroll content.
    #[must_use]
    pub fn total_height(&self) -> f32 {
        self.row_count() as f32 * self.config.row_height
    }

    /// Greatest committable scroll offset.
    #[must_use]
    pub fn max_scroll(&self) -> f32 {
        (self.total_height() - self.viewport_height).max(0.0)
    }

    /// Committed scroll offset.
    #[must_use]
    pub fn scroll_position(&self) -> f32 {
        self.committed_scroll
    }

    /// Cached pixel position of one item.
    #[must_use]
    pub fn position(&self, index: usize) -> Option<ItemPosition> {
        self.positions.get(&index).copied()
    }

    /// Currently visible row window, if the grid has size and items.
    #[must_use]
    pub fn visible_range(&self) -> Option<&VisibleRange> {
        self.visible.as_ref()
    }

    fn recompute_columns(&mut self) {
        let fit = (self.container_width / self.config.item_width).floor();
        self.columns = (fit as usize).max(1);
    }

    /// Precompute top/left for every index. Horizontal leftover is
    /// distributed evenly between columns (space-between): the first column
    /// sits flush left, the last flush right.
    fn rebuild_positions(&mut self) {
        self.positions.clear();
        self.positions.reserve(self.item_count);

        let columns = self.columns;
        let leftover = (self.container_width - columns as f32 * self.config.item_width).max(0.0);
        let spacing = if columns > 1 {
            leftover / (columns - 1) as f32
        } else {
            0.0
        };

        for index in 0..self.item_count {
            let row = index / columns;
            let col = index % columns;
            self.positions.insert(
                index,
                ItemPosition {
                    top: row as f32 * self.config.row_height,
                    left: col as f32 * (self.config.item_width + spacing),
                },
            );
        }
    }

    fn update_visible(&mut self) {
        if self.item_count == 0 || self.viewport_height <= 0.0 {
            self.visible = None;
            return;
        }

        let row_height = self.config.row_height;
        let start_row = (self.committed_scroll / row_height) as usize;
        let rows_in_view = (self.viewport_height / row_height).ceil() as usize + 1;
        let end_row = (start_row + rows_in_view).min(self.row_count());

        let render_start_row = start_row.saturating_sub(self.config.overscan_rows);
        let render_end_row = (end_row + self.config.overscan_rows).min(self.row_count());

        self.visible = Some(VisibleRange {
            start_row,
            end_row,
            render_start_row,
            render_end_row,
            columns: self.columns,
        });
    }
}
