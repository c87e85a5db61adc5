//! Per-row display window state and navigation math.
//!
//! Each displayed row or grid owns one [`VirtualWindow`]: the virtual-offset
//! range it currently shows, the capacity it can display, and whether more
//! items exist past the window. The window is reset whenever the owning
//! component's browsing path changes.

use serde::{Deserialize, Serialize};

/// Which way the user navigated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavDirection {
    /// Toward lower offsets.
    Left,
    /// Toward higher offsets.
    Right,
}

/// The next window a navigation wants to display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowTarget {
    /// First virtual offset of the target window.
    pub start: usize,
    /// One past the last virtual offset of the target window.
    pub end: usize,
}

impl WindowTarget {
    /// Number of items the window asks for.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.end.saturating_sub(self.start)
    }
}

/// Displayed range of one row/grid instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualWindow {
    /// First displayed virtual offset.
    pub start: usize,
    /// One past the last displayed virtual offset.
    pub end: usize,
    /// Items the container can display at once.
    pub capacity: usize,
    /// Whether items exist beyond `end`.
    pub has_more: bool,
}

impl VirtualWindow {
    /// Fresh window at `{0, 0}`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset to the initial state (path change or unmount).
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Resolve the effective display capacity: an explicit value when given
    /// and positive, otherwise recomputed from container and item widths,
    /// floored to at least 1.
    #[must_use]
    pub fn resolve_capacity(explicit: Option<usize>, container_width: f32, item_width: f32) -> usize {
        match explicit {
            Some(capacity) if capacity > 0 => capacity,
            _ => {
                if item_width <= 0.0 || container_width <= 0.0 {
                    1
                } else {
                    ((container_width / item_width).floor() as usize).max(1)
                }
            }
        }
    }

    /// The window a navigation in `direction` should display next.
    #[must_use]
    pub fn target_for(&self, direction: NavDirection, capacity: usize) -> WindowTarget {
        let start = match direction {
            NavDirection::Left => self.start.saturating_sub(capacity),
            NavDirection::Right => self.end,
        };
        WindowTarget {
            start,
            end: start + capacity,
        }
    }

    /// Commit a displayed slice of `shown` items starting at `target.start`.
    pub fn apply(&mut self, target: WindowTarget, shown: usize, capacity: usize, has_more: bool) {
        self.start = target.start;
        self.end = target.start + shown;
        self.capacity = capacity;
        self.has_more = has_more;
    }

    /// The back control is disabled only at the very start.
    #[must_use]
    pub fn left_disabled(&self) -> bool {
        self.start == 0
    }

    /// The forward control is disabled only when no more items are flagged
    /// *and* the window has reached the known total. The double condition
    /// keeps a stale or group-partial total from disabling the control
    /// prematurely.
    #[must_use]
    pub fn right_disabled(&self, total: usize) -> bool {
        !self.has_more && self.end >= total
    }
}
