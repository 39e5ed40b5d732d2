use alloc::sync::Arc;

use crate::gallery::Gallery;
use crate::grid::GridSpec;
use crate::virtualization::VirtualConfig;
use crate::{Easing, GalleryEvent, Orientation, Size};

/// A callback fired after a state update that needs a redraw.
pub type OnChangeCallback = Arc<dyn Fn(&Gallery) + Send + Sync>;

/// A callback receiving selection, expansion, zoom and fetch notifications.
pub type OnEventCallback = Arc<dyn Fn(&Gallery, &GalleryEvent) + Send + Sync>;

/// Configuration for [`crate::Gallery`].
///
/// Cheap to clone: callbacks are stored in `Arc`s, so hosts can tweak a few fields and call
/// `Gallery::set_options` without rebuilding closures.
pub struct GalleryOptions {
    pub orientation: Orientation,
    pub item_size: Size,
    /// Smallest gap between items and around the grid.
    pub min_margin: u32,
    /// Spread leftover cross-axis space evenly between the items of a line.
    pub auto_margin: bool,
    /// Main-axis size of group headers. `None` hides headers.
    pub header_size: Option<u32>,
    pub multi_selection: bool,

    /// Create groups and items only when first addressed.
    pub virtual_items: bool,
    /// Start groups as placeholders with [`Self::placeholder_item_count`] items and fetch them
    /// when they become visible.
    pub virtual_groups: bool,
    pub placeholder_item_count: usize,
    /// Materializing a placeholder first materializes every group before it.
    pub compatibility_mode: bool,

    /// Groups cannot be collapsed and have no toggle button.
    pub always_expanded: bool,
    pub animation: bool,
    pub animation_duration_ms: u64,
    pub animation_open: Easing,
    pub animation_close: Easing,

    /// Smallest and largest item width reachable by zooming. `None` disables zoom.
    pub zoom_range: Option<(u32, u32)>,
    /// Width / height of an item, kept while zooming.
    pub item_ratio: f32,

    pub on_change: Option<OnChangeCallback>,
    pub on_event: Option<OnEventCallback>,
}

impl Clone for GalleryOptions {
    fn clone(&self) -> Self {
        Self {
            orientation: self.orientation,
            item_size: self.item_size,
            min_margin: self.min_margin,
            auto_margin: self.auto_margin,
            header_size: self.header_size,
            multi_selection: self.multi_selection,
            virtual_items: self.virtual_items,
            virtual_groups: self.virtual_groups,
            placeholder_item_count: self.placeholder_item_count,
            compatibility_mode: self.compatibility_mode,
            always_expanded: self.always_expanded,
            animation: self.animation,
            animation_duration_ms: self.animation_duration_ms,
            animation_open: self.animation_open,
            animation_close: self.animation_close,
            zoom_range: self.zoom_range,
            item_ratio: self.item_ratio,
            on_change: self.on_change.clone(),
            on_event: self.on_event.clone(),
        }
    }
}

impl Default for GalleryOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl GalleryOptions {
    pub fn new() -> Self {
        Self {
            orientation: Orientation::Vertical,
            item_size: Size::new(72, 56),
            min_margin: 2,
            auto_margin: true,
            header_size: Some(20),
            multi_selection: false,
            virtual_items: false,
            virtual_groups: false,
            placeholder_item_count: 10,
            compatibility_mode: false,
            always_expanded: false,
            animation: false,
            animation_duration_ms: 500,
            animation_open: Easing::EaseOutCubic,
            animation_close: Easing::EaseInOutCubic,
            zoom_range: None,
            item_ratio: 72.0 / 56.0,
            on_change: None,
            on_event: None,
        }
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_item_size(mut self, width: u32, height: u32) -> Self {
        self.item_size = Size::new(width, height);
        self
    }

    pub fn with_margins(mut self, min_margin: u32, auto_margin: bool) -> Self {
        self.min_margin = min_margin;
        self.auto_margin = auto_margin;
        self
    }

    pub fn with_header_size(mut self, header_size: Option<u32>) -> Self {
        self.header_size = header_size;
        self
    }

    pub fn with_multi_selection(mut self, multi_selection: bool) -> Self {
        self.multi_selection = multi_selection;
        self
    }

    pub fn with_virtual_items(mut self, virtual_items: bool) -> Self {
        self.virtual_items = virtual_items;
        self
    }

    /// Enables placeholder groups. Implies virtual items.
    pub fn with_virtual_groups(mut self, placeholder_item_count: usize) -> Self {
        self.virtual_items = true;
        self.virtual_groups = true;
        self.placeholder_item_count = placeholder_item_count;
        self
    }

    pub fn with_compatibility_mode(mut self, compatibility_mode: bool) -> Self {
        self.compatibility_mode = compatibility_mode;
        self
    }

    pub fn with_always_expanded(mut self, always_expanded: bool) -> Self {
        self.always_expanded = always_expanded;
        self
    }

    pub fn with_animation(mut self, duration_ms: Option<u64>) -> Self {
        self.animation = duration_ms.is_some();
        if let Some(duration_ms) = duration_ms {
            self.animation_duration_ms = duration_ms;
        }
        self
    }

    pub fn with_animation_easing(mut self, open: Easing, close: Easing) -> Self {
        self.animation_open = open;
        self.animation_close = close;
        self
    }

    /// Enables zooming between `min` and `max` item widths.
    pub fn with_zoom(mut self, min: u32, max: u32, item_ratio: f32) -> Self {
        self.zoom_range = Some((min.min(max), max.max(min)));
        self.item_ratio = item_ratio;
        self
    }

    pub fn with_on_change(
        mut self,
        on_change: Option<impl Fn(&Gallery) + Send + Sync + 'static>,
    ) -> Self {
        self.on_change = on_change.map(|f| Arc::new(f) as _);
        self
    }

    pub fn with_on_event(
        mut self,
        on_event: Option<impl Fn(&Gallery, &GalleryEvent) + Send + Sync + 'static>,
    ) -> Self {
        self.on_event = on_event.map(|f| Arc::new(f) as _);
        self
    }

    pub(crate) fn grid_spec(&self) -> GridSpec {
        GridSpec {
            item: self.item_size,
            min_margin: self.min_margin,
            auto_margin: self.auto_margin,
            orientation: self.orientation,
        }
    }

    pub(crate) fn virtual_config(&self) -> VirtualConfig {
        VirtualConfig {
            virtual_items: self.virtual_items || self.virtual_groups,
            virtual_groups: self.virtual_groups,
            placeholder_item_count: self.placeholder_item_count,
            compatibility_mode: self.compatibility_mode,
        }
    }

    /// Main-axis space before the first line of a group: header plus the minimum margin.
    pub(crate) fn header_extent(&self) -> u64 {
        self.header_size.unwrap_or(0) as u64 + self.min_margin as u64
    }

    /// Whether a change from `prev` to `self` moves items around.
    pub(crate) fn layout_differs(&self, prev: &GalleryOptions) -> bool {
        self.orientation != prev.orientation
            || self.item_size != prev.item_size
            || self.min_margin != prev.min_margin
            || self.auto_margin != prev.auto_margin
            || self.header_size != prev.header_size
            || self.always_expanded != prev.always_expanded
    }
}

impl core::fmt::Debug for GalleryOptions {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GalleryOptions")
            .field("orientation", &self.orientation)
            .field("item_size", &self.item_size)
            .field("min_margin", &self.min_margin)
            .field("auto_margin", &self.auto_margin)
            .field("header_size", &self.header_size)
            .field("multi_selection", &self.multi_selection)
            .field("virtual_items", &self.virtual_items)
            .field("virtual_groups", &self.virtual_groups)
            .field("placeholder_item_count", &self.placeholder_item_count)
            .field("compatibility_mode", &self.compatibility_mode)
            .field("always_expanded", &self.always_expanded)
            .field("animation", &self.animation)
            .field("animation_duration_ms", &self.animation_duration_ms)
            .field("zoom_range", &self.zoom_range)
            .field("item_ratio", &self.item_ratio)
            .finish_non_exhaustive()
    }
}
