use crate::{Orientation, ScrollRange, Size};

/// Scroll state along the main axis.
///
/// Invariant: `offset + window <= extent` when the content is larger than the window, otherwise
/// `offset == 0`. Every mutator re-establishes it.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ViewportModel {
    orientation: Orientation,
    client: Size,
    offset: u64,
    extent: u64,
}

impl ViewportModel {
    pub fn new(orientation: Orientation) -> Self {
        Self {
            orientation,
            ..Self::default()
        }
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn set_orientation(&mut self, orientation: Orientation) {
        self.orientation = orientation;
        self.clamp_offset();
    }

    pub fn client(&self) -> Size {
        self.client
    }

    pub fn set_client(&mut self, client: Size) {
        self.client = client;
        self.clamp_offset();
    }

    /// Visible length along the main axis.
    pub fn window(&self) -> u64 {
        self.orientation.main(self.client) as u64
    }

    /// Available length along the cross axis.
    pub fn cross(&self) -> u32 {
        self.orientation.cross(self.client)
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn extent(&self) -> u64 {
        self.extent
    }

    pub fn max_offset(&self) -> u64 {
        self.extent.saturating_sub(self.window())
    }

    pub fn set_extent(&mut self, extent: u64) {
        self.extent = extent;
        self.clamp_offset();
    }

    /// Sets the offset, clamped. Returns the applied value.
    pub fn set_offset(&mut self, offset: u64) -> u64 {
        self.offset = offset.min(self.max_offset());
        self.offset
    }

    /// Moves the offset by `delta`, clamped. Returns whether it changed.
    pub fn scroll_by(&mut self, delta: i64) -> bool {
        let before = self.offset;
        let target = if delta >= 0 {
            self.offset.saturating_add(delta as u64)
        } else {
            self.offset.saturating_sub(delta.unsigned_abs())
        };
        self.set_offset(target) != before
    }

    /// Re-establishes the offset invariant. Returns whether the offset changed.
    pub fn clamp_offset(&mut self) -> bool {
        let max = self.max_offset();
        if self.offset > max {
            self.offset = max;
            return true;
        }
        false
    }

    /// Relative position of the window center, `(offset + window / 2) / extent`.
    ///
    /// `None` when there is no content to be relative to.
    pub fn capture_location(&self) -> Option<f64> {
        if self.extent == 0 {
            return None;
        }
        let center = self.offset as f64 + self.window() as f64 * 0.5;
        Some(center / self.extent as f64)
    }

    /// Puts the window center back at a location captured with [`Self::capture_location`].
    pub fn restore_location(&mut self, location: f64) {
        let center = self.extent as f64 * location;
        let start = center - self.window() as f64 * 0.5;
        let offset = if start > 0.0 { (start + 0.5) as u64 } else { 0 };
        self.set_offset(offset);
    }

    /// Relative scroll position in `0.0..=1.0`.
    pub fn position_ratio(&self) -> f64 {
        let max = self.max_offset();
        if max == 0 {
            return 0.0;
        }
        self.offset as f64 / max as f64
    }

    /// Scrolls as little as possible so that `[start, start + len)` is visible. A span larger
    /// than the window is aligned to its start.
    ///
    /// Returns whether the offset changed.
    pub fn reveal(&mut self, start: u64, len: u64) -> bool {
        let before = self.offset;
        let window = self.window();
        let end = start.saturating_add(len);
        if start < self.offset || len > window {
            self.set_offset(start);
        } else if end > self.offset.saturating_add(window) {
            self.set_offset(end - window);
        }
        self.offset != before
    }

    /// Whether any part of `[start, start + len)` is inside the window.
    pub fn is_visible(&self, start: u64, len: u64) -> bool {
        let end = start.saturating_add(len);
        end > self.offset && start < self.offset.saturating_add(self.window())
    }

    pub fn scroll_range(&self) -> ScrollRange {
        ScrollRange {
            offset: self.offset,
            extent: self.extent,
            window: self.window(),
        }
    }
}
