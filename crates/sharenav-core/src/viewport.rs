//! Virtualized listing window.
//!
//! Computes which rows of a (possibly very large) listing intersect the
//! scroll viewport, plus an overscan margin. Only that window is rendered;
//! spacers sized from [`Viewport::total_height`] keep the scrollbar honest.

use crate::config::ViewportConfig;

/// Half-open index range `[start, end)` of rows to render.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VisibleRange {
    pub start: usize,
    pub end: usize,
}

impl VisibleRange {
    pub const EMPTY: Self = Self { start: 0, end: 0 };

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.end
    }

    /// Inclusive last index, `None` when empty.
    pub fn last(&self) -> Option<usize> {
        (!self.is_empty()).then(|| self.end - 1)
    }
}

/// Scroll geometry of the listing.
#[derive(Clone, Debug, PartialEq)]
pub struct Viewport {
    row_height: f64,
    overscan: usize,
    scroll_offset: f64,
    viewport_height: f64,
    count: usize,
    focused: Option<usize>,
}

impl Viewport {
    pub fn new(row_height: f64, overscan: usize) -> Self {
        Self {
            row_height: if row_height > 0.0 { row_height } else { 1.0 },
            overscan,
            scroll_offset: 0.0,
            viewport_height: 0.0,
            count: 0,
            focused: None,
        }
    }

    pub fn from_config(config: &ViewportConfig) -> Self {
        Self::new(config.row_height, config.overscan)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn row_height(&self) -> f64 {
        self.row_height
    }

    #[inline]
    pub fn scroll_offset(&self) -> f64 {
        self.scroll_offset
    }

    #[inline]
    pub fn viewport_height(&self) -> f64 {
        self.viewport_height
    }

    #[inline]
    pub fn focused(&self) -> Option<usize> {
        self.focused
    }

    /// Height of the full (unrendered) list.
    pub fn total_height(&self) -> f64 {
        self.count as f64 * self.row_height
    }

    /// Top offset of row `index`.
    pub fn row_offset(&self, index: usize) -> f64 {
        index as f64 * self.row_height
    }

    fn max_offset(&self) -> f64 {
        (self.total_height() - self.viewport_height).max(0.0)
    }

    // =========================================================================
    // Updates
    // =========================================================================

    pub fn set_scroll_offset(&mut self, offset: f64) {
        self.scroll_offset = if offset.is_finite() {
            offset.clamp(0.0, self.max_offset())
        } else {
            0.0
        };
    }

    pub fn set_viewport_height(&mut self, height: f64) {
        self.viewport_height = if height.is_finite() { height.max(0.0) } else { 0.0 };
        self.set_scroll_offset(self.scroll_offset);
    }

    /// Update the row count after the listing changed.
    pub fn set_count(&mut self, count: usize) {
        self.count = count;
        if self.focused.is_some_and(|i| i >= count) {
            self.focused = None;
        }
        self.set_scroll_offset(self.scroll_offset);
    }

    pub fn set_focused(&mut self, index: Option<usize>) {
        self.focused = index.filter(|i| *i < self.count);
    }

    /// Rows intersecting the viewport, widened by overscan.
    pub fn visible_range(&self) -> VisibleRange {
        if self.count == 0 || self.viewport_height <= 0.0 {
            return VisibleRange::EMPTY;
        }
        let last_row = self.count - 1;

        let first = (self.scroll_offset / self.row_height).floor() as usize;
        let bottom = ((self.scroll_offset + self.viewport_height) / self.row_height).ceil() as usize;
        let last = bottom.saturating_sub(1);

        let start = first.saturating_sub(self.overscan).min(last_row);
        let end = last.saturating_add(self.overscan).min(last_row);

        VisibleRange {
            start,
            end: end + 1,
        }
    }

    /// Scroll the minimum amount needed for row `index` to be fully visible.
    /// Returns the new offset.
    pub fn scroll_to_index(&mut self, index: usize) -> f64 {
        if index >= self.count {
            return self.scroll_offset;
        }
        let top = self.row_offset(index);
        let bottom = top + self.row_height;

        if top < self.scroll_offset {
            self.set_scroll_offset(top);
        } else if bottom > self.scroll_offset + self.viewport_height {
            self.set_scroll_offset(bottom - self.viewport_height);
        }
        self.scroll_offset
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::from_config(&ViewportConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport(count: usize, height: f64) -> Viewport {
        let mut vp = Viewport::new(40.0, 5);
        vp.set_count(count);
        vp.set_viewport_height(height);
        vp
    }

    #[test]
    fn test_initial_window() {
        let vp = viewport(1000, 400.0);
        let range = vp.visible_range();
        assert_eq!(range, VisibleRange { start: 0, end: 15 });
        assert_eq!(range.last(), Some(14));
    }

    #[test]
    fn test_scrolled_window_with_overscan() {
        let mut vp = viewport(1000, 400.0);
        vp.set_scroll_offset(4000.0);
        // Rows 100..=109 visible, plus 5 each side
        assert_eq!(vp.visible_range(), VisibleRange { start: 95, end: 115 });
    }

    #[test]
    fn test_partial_rows_are_included() {
        let mut vp = viewport(1000, 400.0);
        vp.set_scroll_offset(20.0);
        let range = vp.visible_range();
        assert_eq!(range.start, 0);
        // Row 10 is half visible at the bottom
        assert_eq!(range.last(), Some(15));
    }

    #[test]
    fn test_empty_listing() {
        let vp = viewport(0, 400.0);
        assert!(vp.visible_range().is_empty());
        assert_eq!(vp.total_height(), 0.0);
    }

    #[test]
    fn test_short_listing_is_clamped() {
        let vp = viewport(3, 400.0);
        assert_eq!(vp.visible_range(), VisibleRange { start: 0, end: 3 });
    }

    #[test]
    fn test_offset_clamped_to_extent() {
        let mut vp = viewport(20, 400.0);
        vp.set_scroll_offset(10_000.0);
        assert_eq!(vp.scroll_offset(), 400.0);
        vp.set_scroll_offset(-5.0);
        assert_eq!(vp.scroll_offset(), 0.0);
    }

    #[test]
    fn test_shrinking_count_clears_focus_and_clamps() {
        let mut vp = viewport(1000, 400.0);
        vp.set_focused(Some(900));
        vp.set_scroll_offset(36_000.0);
        vp.set_count(10);
        assert_eq!(vp.focused(), None);
        assert_eq!(vp.scroll_offset(), 0.0);
        assert_eq!(vp.visible_range(), VisibleRange { start: 0, end: 10 });
    }

    #[test]
    fn test_scroll_to_index_is_minimal() {
        let mut vp = viewport(1000, 400.0);
        // Already visible
        assert_eq!(vp.scroll_to_index(3), 0.0);
        // Below: bring bottom edge into view
        assert_eq!(vp.scroll_to_index(20), 440.0);
        // Above: bring top edge into view
        assert_eq!(vp.scroll_to_index(2), 80.0);
    }
}
