use crate::{Orientation, Size};

/// What a host scrollbar needs: position, content length and thumb length.
///
/// With `feature = "serde"`, this type implements `Serialize`/`Deserialize`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScrollRange {
    pub offset: u64,
    pub extent: u64,
    pub window: u64,
}

/// A snapshot of the view configuration and scroll position.
///
/// Useful to restore a gallery across sessions without persisting the item tree. `location` is
/// the relative window center (see [`crate::ViewportModel::capture_location`]), so the position
/// survives a different client size or item count.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ViewState {
    pub orientation: Orientation,
    pub item_size: Size,
    pub client: Size,
    pub scroll: ScrollRange,
    pub location: Option<f64>,
}
