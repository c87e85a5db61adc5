//! Group boundary index.
//!
//! The backend stores a path's products in fixed-size groups and can report
//! the per-group item counts up front. Accumulating those counts yields the
//! virtual-offset range each group covers, which lets the client map an
//! arbitrary display window to the minimal set of groups it must fetch.

use serde::{Deserialize, Serialize};

/// The `[start, end)` virtual-offset range covered by one backend group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupBoundary {
    /// First virtual offset covered by the group.
    pub start: usize,
    /// One past the last virtual offset covered by the group.
    pub end: usize,
}

impl GroupBoundary {
    /// Number of items in the group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Whether the group covers no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Whether the group covers the given virtual offset.
    #[must_use]
    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end
    }
}

/// Inclusive run of group indices covering a display window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupSpan {
    /// First group index of the run.
    pub first: usize,
    /// Last group index of the run (inclusive).
    pub last: usize,
}

impl GroupSpan {
    /// Number of groups in the run.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.last.saturating_sub(self.first) + 1
    }
}

/// Accumulated group boundaries for one browsing path.
///
/// Invariant: boundaries are contiguous and non-overlapping:
/// `boundaries[i].end == boundaries[i + 1].start`, and the first boundary
/// starts at zero. An empty index means boundary information is unavailable
/// (the count fetch failed or never ran); callers fall back to fetching a
/// single group at offset zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryIndex {
    boundaries: Vec<GroupBoundary>,
}

impl BoundaryIndex {
    /// Index with no boundary information.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Accumulate per-group item counts into contiguous boundaries.
    #[must_use]
    pub fn from_counts(counts: &[usize]) -> Self {
        let mut boundaries = Vec::with_capacity(counts.len());
        let mut offset = 0;
        for &count in counts {
            boundaries.push(GroupBoundary {
                start: offset,
                end: offset + count,
            });
            offset += count;
        }
        Self { boundaries }
    }

    /// Whether any boundary information is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.boundaries.is_empty()
    }

    /// Number of known groups.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.boundaries.len()
    }

    /// All known boundaries in group order.
    #[must_use]
    pub fn boundaries(&self) -> &[GroupBoundary] {
        &self.boundaries
    }

    /// Boundary of one group.
    #[must_use]
    pub fn get(&self, group_index: usize) -> Option<GroupBoundary> {
        self.boundaries.get(group_index).copied()
    }

    /// Total number of items across all known groups.
    #[must_use]
    pub fn grand_total(&self) -> usize {
        self.boundaries.last().map_or(0, |b| b.end)
    }

    /// Index of the group covering the given virtual offset.
    #[must_use]
    pub fn group_at_offset(&self, offset: usize) -> Option<usize> {
        if self.boundaries.is_empty() || offset >= self.grand_total() {
            return None;
        }
        // Boundaries are sorted by construction.
        let idx = self
            .boundaries
            .partition_point(|b| b.end <= offset);
        self.boundaries.get(idx).map(|_| idx)
    }

    /// Minimal contiguous run of groups covering the window `[start, end)`.
    ///
    /// A window overshooting the last known boundary is clamped to it;
    /// returns `None` when the index holds no boundary information or the
    /// window is degenerate.
    #[must_use]
    pub fn span_for_window(&self, start: usize, end: usize) -> Option<GroupSpan> {
        if self.boundaries.is_empty() || end <= start {
            return None;
        }
        let total = self.grand_total();
        if total == 0 {
            return None;
        }
        let clamped_start = start.min(total.saturating_sub(1));
        let clamped_last = end.saturating_sub(1).min(total.saturating_sub(1));
        let first = self.group_at_offset(clamped_start)?;
        let last = self.group_at_offset(clamped_last)?;
        Some(GroupSpan { first, last })
    }

    /// Offset of `virtual_start` within a fetch beginning at `first_group`.
    #[must_use]
    pub fn slice_offset(&self, first_group: usize, virtual_start: usize) -> usize {
        let base = self.get(first_group).map_or(0, |b| b.start);
        virtual_start.saturating_sub(base)
    }
}
