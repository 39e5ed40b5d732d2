//! Grid layout of the items inside one group.
//!
//! Everything here is expressed along the main (scrolling) and cross axes; [`Orientation`] maps
//! the result to screen coordinates. A vertical gallery lays items out row-major, a horizontal
//! one column-major, and the two are transposes of each other.

use core::ops::Range;

use crate::{Orientation, Size};

/// Inputs that are shared by every group of a gallery.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridSpec {
    pub item: Size,
    pub min_margin: u32,
    /// Spread the leftover cross-axis space evenly between the items of a line.
    pub auto_margin: bool,
    pub orientation: Orientation,
}

impl GridSpec {
    pub fn item_main(&self) -> u32 {
        self.orientation.main(self.item)
    }

    pub fn item_cross(&self) -> u32 {
        self.orientation.cross(self.item)
    }

    /// Main-axis distance between the starts of two consecutive lines.
    pub fn line_pitch(&self) -> u64 {
        (self.item_main() as u64 + self.min_margin as u64).max(1)
    }
}

/// Computed grid of one group.
///
/// A *line* is a row in a vertical gallery and a column in a horizontal one; `per_line` counts
/// the items of one line along the cross axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GridMetrics {
    pub count: usize,
    pub per_line: usize,
    pub lines: usize,
    /// Cross-axis gap between items (and before the first one).
    pub margin: u32,
    pub item: Size,
    pub min_margin: u32,
    pub orientation: Orientation,
}

impl GridMetrics {
    /// Lays out `count` items in `available` pixels of cross-axis space.
    ///
    /// At least one item fits per line, even when `available` is smaller than one item.
    pub fn compute(spec: &GridSpec, available: u32, count: usize) -> Self {
        let mut metrics = Self {
            count,
            per_line: 0,
            lines: 0,
            margin: spec.min_margin,
            item: spec.item,
            min_margin: spec.min_margin,
            orientation: spec.orientation,
        };
        if count == 0 {
            return metrics;
        }

        let available = available as u64;
        let min_margin = spec.min_margin as u64;
        let item_pitch = (spec.item_cross() as u64 + min_margin).max(1);

        let fit = if available > min_margin {
            ((available - min_margin) / item_pitch) as usize
        } else {
            0
        };

        if fit == 0 {
            metrics.per_line = 1;
            metrics.lines = count;
        } else {
            metrics.per_line = fit;
            metrics.lines = count.div_ceil(fit);

            if spec.auto_margin {
                let used = min_margin + fit as u64 * item_pitch;
                let free = available.saturating_sub(used);
                let extra = free / (fit as u64 + 1);
                metrics.margin = (min_margin + extra).min(u32::MAX as u64) as u32;
            }
        }
        metrics
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of columns in screen terms.
    pub fn columns(&self) -> usize {
        match self.orientation {
            Orientation::Vertical => self.per_line,
            Orientation::Horizontal => self.lines,
        }
    }

    /// Number of rows in screen terms.
    pub fn rows(&self) -> usize {
        match self.orientation {
            Orientation::Vertical => self.lines,
            Orientation::Horizontal => self.per_line,
        }
    }

    fn item_main(&self) -> u64 {
        self.orientation.main(self.item) as u64
    }

    fn item_cross(&self) -> u64 {
        self.orientation.cross(self.item) as u64
    }

    pub fn line_pitch(&self) -> u64 {
        (self.item_main() + self.min_margin as u64).max(1)
    }

    fn cross_pitch(&self) -> u64 {
        (self.item_cross() + self.margin as u64).max(1)
    }

    /// Main-axis extent of all lines, including the trailing minimum margin.
    pub fn main_extent(&self) -> u64 {
        self.lines as u64 * self.line_pitch()
    }

    /// Cross-axis extent actually covered by one full line, margins included.
    pub fn cross_extent(&self) -> u64 {
        if self.per_line == 0 {
            return 0;
        }
        let n = self.per_line as u64;
        n * self.item_cross() + (n - 1) * self.margin as u64 + 2 * self.min_margin as u64
    }

    pub fn line_of(&self, index: usize) -> usize {
        index / self.per_line.max(1)
    }

    pub fn position_in_line(&self, index: usize) -> usize {
        index % self.per_line.max(1)
    }

    /// Position of item `index` relative to the grid origin, as `(main, cross)`.
    pub fn item_offset(&self, index: usize) -> (u64, u64) {
        let main = self.line_of(index) as u64 * self.line_pitch();
        let cross =
            self.margin as u64 + self.position_in_line(index) as u64 * self.cross_pitch();
        (main, cross)
    }

    /// Indexes of the items intersecting the main-axis span `[start, end)`, relative to the grid
    /// origin. Only the first and last line are computed; no item is visited.
    pub fn visible_range(&self, start: i64, end: i64) -> Range<usize> {
        if self.count == 0 || end <= start || end <= 0 {
            return 0..0;
        }
        let extent = self.main_extent();
        let start = start.max(0) as u64;
        if start >= extent {
            return 0..0;
        }
        let pitch = self.line_pitch();
        let last_line_index = self.lines.saturating_sub(1) as u64;
        let first_line = (start / pitch).min(last_line_index) as usize;
        let last_line = ((end as u64 - 1) / pitch).min(last_line_index) as usize;

        let from = first_line.saturating_mul(self.per_line).min(self.count);
        let to = (last_line + 1).saturating_mul(self.per_line).min(self.count);
        from..to
    }

    /// Item under the grid-relative point `(main, cross)`. Margins hit nothing.
    pub fn index_at(&self, main: i64, cross: i64) -> Option<usize> {
        if self.count == 0 || main < 0 || cross < 0 {
            return None;
        }
        let (main, cross) = (main as u64, cross as u64);

        let pitch = self.line_pitch();
        if main % pitch >= self.item_main() {
            return None;
        }
        let line = (main / pitch) as usize;

        let margin = self.margin as u64;
        if cross < margin {
            return None;
        }
        let cross = cross - margin;
        let cross_pitch = self.cross_pitch();
        if cross % cross_pitch >= self.item_cross() {
            return None;
        }
        let pos = (cross / cross_pitch) as usize;
        if pos >= self.per_line {
            return None;
        }

        let index = line.checked_mul(self.per_line)?.checked_add(pos)?;
        (index < self.count).then_some(index)
    }
}
