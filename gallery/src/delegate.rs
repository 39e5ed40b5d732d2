use crate::error::FetchError;
use crate::tree::{FetchState, NodeId};
use crate::{ItemKey, Rect, Size};

/// A group about to be drawn. Rectangles are in viewport coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawGroup {
    pub id: NodeId,
    pub key: ItemKey,
    pub index: usize,
    /// Whole group, header included.
    pub rect: Rect,
    /// Header strip; empty when headers are hidden.
    pub header: Rect,
    pub clip: Rect,
    pub expanded: bool,
    /// Visible share of the body while an expand animation runs.
    pub expand_ratio: f32,
    pub child_count: usize,
    pub selected: bool,
    pub placeholder: bool,
    pub fetch: FetchState,
}

/// An item about to be drawn. Rectangles are in viewport coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrawItem {
    pub id: NodeId,
    pub key: ItemKey,
    pub group: NodeId,
    pub index: usize,
    pub rect: Rect,
    pub clip: Rect,
    pub selected: bool,
    pub focused: bool,
}

/// Draws groups and items. Called once per visible node per paint pass, groups before their
/// items.
pub trait DrawDelegate {
    fn draw_group(&mut self, group: &DrawGroup) {
        let _ = group;
    }

    fn draw_item(&mut self, item: &DrawItem);
}

/// Notifications sent through [`crate::GalleryOptions::on_event`].
#[derive(Clone, Debug, PartialEq)]
pub enum GalleryEvent {
    /// `node` is `None` when everything was deselected. `activated` marks a default action
    /// (double click, Enter).
    SelectionChanged {
        node: Option<NodeId>,
        activated: bool,
    },
    ExpandChanged {
        group: NodeId,
        expanded: bool,
    },
    Zoomed {
        item_size: Size,
    },
    FetchFailed {
        group: NodeId,
        error: FetchError,
    },
}

/// What lies under a point of the viewport.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Hit {
    #[default]
    None,
    Item {
        group: NodeId,
        item: NodeId,
    },
    /// The group header. `toggle` is set on the expand/collapse button.
    Header {
        group: NodeId,
        toggle: bool,
    },
    /// Inside a group, but between items or below the last one.
    Group(NodeId),
}

impl Hit {
    pub fn item(&self) -> Option<NodeId> {
        match self {
            Self::Item { item, .. } => Some(*item),
            _ => None,
        }
    }

    pub fn group(&self) -> Option<NodeId> {
        match self {
            Self::None => None,
            Self::Item { group, .. } | Self::Header { group, .. } | Self::Group(group) => {
                Some(*group)
            }
        }
    }
}
