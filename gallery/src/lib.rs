//! A headless engine for virtualized, grouped grid galleries.
//!
//! For host-side glue (mouse and keyboard state machines, smooth scrolling), see the
//! `gallery-adapter` crate.
//!
//! The gallery arranges a two-level tree (groups holding items) as a scrolling list of
//! sections, each a header followed by a grid of fixed-size items. It is built to handle very
//! large collections:
//! - groups and items are created only when first drawn or addressed
//! - groups can start as placeholders with an estimated size and be fetched when they scroll
//!   into view, without the visible content jumping
//! - selection is tracked with per-group bit sets
//! - group offsets live in a Fenwick tree, so relayout of one group is `O(log n)`
//!
//! It is UI-agnostic. A host is expected to provide:
//! - the client size and scroll offset
//! - pointer and keyboard input (or use `gallery-adapter`)
//! - a [`DrawDelegate`] that renders the groups and items handed to it
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod animation;
mod delegate;
mod error;
mod fenwick;
mod gallery;
mod grid;
mod interaction;
mod key;
mod navigation;
mod options;
mod selection;
mod state;
mod tree;
mod types;
mod viewport;
mod virtualization;

#[cfg(test)]
mod tests;

pub use animation::{AnimationFrame, Easing, ExpandAnimator};
pub use delegate::{DrawDelegate, DrawGroup, DrawItem, GalleryEvent, Hit};
pub use error::FetchError;
pub use gallery::Gallery;
pub use grid::{GridMetrics, GridSpec};
pub use navigation::{GridPosition, NavCommand, NavigationGrid, NavigationResolver};
pub use options::{GalleryOptions, OnChangeCallback, OnEventCallback};
pub use selection::{SelectionBits, SelectionIndex};
pub use state::{ScrollRange, ViewState};
pub use tree::{FetchState, ItemNode, ItemTree, NodeId};
pub use types::{ItemDescriptor, ItemKey, Orientation, Point, Rect, Size};
pub use viewport::ViewportModel;
pub use virtualization::{
    ContentSource, FetchOutcome, FetchRequest, FetchTicket, Materialized, VirtualConfig,
    VirtualizationController,
};
