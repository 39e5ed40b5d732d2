/// The primary (scrolling) axis of a gallery.
///
/// Layout, navigation and virtualization are written against a *main* axis (the scrolling one)
/// and a *cross* axis. `Orientation` is the single transform between those and screen `x`/`y`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Orientation {
    /// Scrolls vertically; items fill rows left to right.
    #[default]
    Vertical,
    /// Scrolls horizontally; items fill columns top to bottom.
    Horizontal,
}

impl Orientation {
    pub fn is_vertical(self) -> bool {
        matches!(self, Self::Vertical)
    }

    /// Extent of `size` along the main axis.
    pub fn main(self, size: Size) -> u32 {
        match self {
            Self::Vertical => size.height,
            Self::Horizontal => size.width,
        }
    }

    /// Extent of `size` along the cross axis.
    pub fn cross(self, size: Size) -> u32 {
        match self {
            Self::Vertical => size.width,
            Self::Horizontal => size.height,
        }
    }

    pub fn main_pos(self, point: Point) -> i64 {
        match self {
            Self::Vertical => point.y,
            Self::Horizontal => point.x,
        }
    }

    pub fn cross_pos(self, point: Point) -> i64 {
        match self {
            Self::Vertical => point.x,
            Self::Horizontal => point.y,
        }
    }

    pub fn size(self, main: u32, cross: u32) -> Size {
        match self {
            Self::Vertical => Size::new(cross, main),
            Self::Horizontal => Size::new(main, cross),
        }
    }

    pub fn point(self, main: i64, cross: i64) -> Point {
        match self {
            Self::Vertical => Point::new(cross, main),
            Self::Horizontal => Point::new(main, cross),
        }
    }

    pub fn rect(self, main: i64, cross: i64, main_len: u32, cross_len: u32) -> Rect {
        let origin = self.point(main, cross);
        let size = self.size(main_len, cross_len);
        Rect::new(origin.x, origin.y, size.width, size.height)
    }

    /// Start of `rect` along the main axis.
    pub fn rect_main(self, rect: Rect) -> i64 {
        match self {
            Self::Vertical => rect.y,
            Self::Horizontal => rect.x,
        }
    }

    pub fn rect_main_len(self, rect: Rect) -> u32 {
        self.main(rect.size())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle. `x`/`y` may be negative for content scrolled out of view.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: i64, y: i64, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn right(&self) -> i64 {
        self.x.saturating_add(self.width as i64)
    }

    pub fn bottom(&self) -> i64 {
        self.y.saturating_add(self.height as i64)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Returns this rectangle moved by `dx`/`dy`.
    pub fn translate(&self, dx: i64, dy: i64) -> Rect {
        Rect::new(
            self.x.saturating_add(dx),
            self.y.saturating_add(dy),
            self.width,
            self.height,
        )
    }
}

/// Host-chosen identity of an item or group. Opaque to the engine.
pub type ItemKey = u64;

/// What a content source reports for one group or item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemDescriptor {
    pub key: ItemKey,
    /// Initial expansion state. Only meaningful for groups.
    pub expanded: bool,
}

impl ItemDescriptor {
    pub fn new(key: ItemKey) -> Self {
        Self {
            key,
            expanded: true,
        }
    }

    pub fn with_expanded(mut self, expanded: bool) -> Self {
        self.expanded = expanded;
        self
    }
}

impl From<ItemKey> for ItemDescriptor {
    fn from(key: ItemKey) -> Self {
        Self::new(key)
    }
}
