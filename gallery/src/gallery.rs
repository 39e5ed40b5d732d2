use alloc::boxed::Box;
use alloc::vec::Vec;
use core::cell::Cell;
use core::ops::Range;

use crate::animation::ExpandAnimator;
use crate::fenwick::Fenwick;
use crate::grid::GridMetrics;
use crate::selection::SelectionIndex;
use crate::tree::{FetchState, ItemNode, ItemTree, NodeId};
use crate::viewport::ViewportModel;
use crate::virtualization::{
    BoxedSource, ContentSource, FetchOutcome, FetchTicket, Materialized,
    VirtualizationController,
};
use crate::{
    DrawDelegate, DrawGroup, DrawItem, FetchError, GalleryEvent, GalleryOptions, Hit,
    ItemDescriptor, Orientation, Point, Rect, ScrollRange, Size, ViewState,
};

/// A headless, virtualized grid gallery.
///
/// Groups are laid out one after another along the main axis, each as a header followed by a
/// grid of its items. The gallery does not hold any UI objects: the host feeds it the client
/// size, scroll offset and input, and draws what [`Gallery::paint`] hands to its
/// [`DrawDelegate`].
///
/// Group extents are kept in a Fenwick tree, so a change to one group is a scoped `O(log n)`
/// update and locating the groups under a clip rectangle never walks the whole list.
pub struct Gallery {
    pub(crate) options: GalleryOptions,
    pub(crate) tree: ItemTree,
    pub(crate) selection: SelectionIndex,
    pub(crate) viewport: ViewportModel,
    extents: Fenwick,
    group_extents: Vec<u64>,
    pub(crate) virtualization: VirtualizationController,
    pub(crate) animator: ExpandAnimator,
    pub(crate) source: BoxedSource,
    pub(crate) focus: Option<NodeId>,
    pub(crate) now_ms: u64,

    notify_depth: Cell<usize>,
    notify_pending: Cell<bool>,
}

impl Gallery {
    pub fn new(options: GalleryOptions) -> Self {
        gdebug!(
            orientation = ?options.orientation,
            virtual_items = options.virtual_items,
            virtual_groups = options.virtual_groups,
            "Gallery::new"
        );
        Self {
            viewport: ViewportModel::new(options.orientation),
            selection: SelectionIndex::new(options.multi_selection),
            virtualization: VirtualizationController::new(options.virtual_config()),
            options,
            tree: ItemTree::new(),
            extents: Fenwick::new(0),
            group_extents: Vec::new(),
            animator: ExpandAnimator::new(),
            source: None,
            focus: None,
            now_ms: 0,
            notify_depth: Cell::new(0),
            notify_pending: Cell::new(false),
        }
    }

    /// Creates a gallery backed by `source`.
    pub fn with_source(options: GalleryOptions, source: impl ContentSource + 'static) -> Self {
        let mut g = Self::new(options);
        g.source = Some(Box::new(source));
        g
    }

    pub fn set_content_source(&mut self, source: Option<Box<dyn ContentSource>>) {
        self.source = source;
    }

    pub fn options(&self) -> &GalleryOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: GalleryOptions) {
        let prev = core::mem::replace(&mut self.options, options);
        gtrace!(
            multi_selection = self.options.multi_selection,
            virtual_groups = self.options.virtual_groups,
            "Gallery::set_options"
        );
        if self.options.multi_selection != prev.multi_selection {
            self.selection
                .set_multi(&self.tree, self.options.multi_selection);
        }
        self.virtualization
            .set_config(self.options.virtual_config());
        if self.options.orientation != prev.orientation {
            self.viewport.set_orientation(self.options.orientation);
        }
        if self.options.layout_differs(&prev) {
            self.relayout(None, true);
        } else {
            self.notify();
        }
    }

    /// Clones the current options, applies `f`, then delegates to `set_options`.
    pub fn update_options(&mut self, f: impl FnOnce(&mut GalleryOptions)) {
        let mut next = self.options.clone();
        f(&mut next);
        self.set_options(next);
    }

    pub fn tree(&self) -> &ItemTree {
        &self.tree
    }

    pub fn node(&self, id: NodeId) -> Option<&ItemNode> {
        self.tree.get(id)
    }

    pub fn viewport(&self) -> &ViewportModel {
        &self.viewport
    }

    pub fn selection_index(&self) -> &SelectionIndex {
        &self.selection
    }

    pub fn group_count(&self) -> usize {
        self.tree.root_count()
    }

    /// Milliseconds of the last [`Gallery::tick`] or [`Gallery::set_now`].
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Sets the clock used to start animations.
    pub fn set_now(&mut self, now_ms: u64) {
        self.now_ms = now_ms;
    }

    fn notify_now(&self) {
        if let Some(cb) = &self.options.on_change {
            cb(self);
        }
    }

    pub(crate) fn notify(&self) {
        if self.notify_depth.get() > 0 {
            self.notify_pending.set(true);
            return;
        }
        self.notify_now();
    }

    pub(crate) fn emit(&self, event: GalleryEvent) {
        gtrace!(?event, "emit");
        if let Some(cb) = &self.options.on_event {
            cb(self, &event);
        }
    }

    /// Batches multiple updates into a single `on_change` notification.
    pub fn batch_update(&mut self, f: impl FnOnce(&mut Self)) {
        let depth = self.notify_depth.get();
        self.notify_depth.set(depth.saturating_add(1));

        f(self);

        let depth = self.notify_depth.get();
        debug_assert!(depth > 0, "notify_depth underflow");
        let next = depth.saturating_sub(1);
        self.notify_depth.set(next);

        if next == 0 && self.notify_pending.replace(false) {
            self.notify_now();
        }
    }

    // --- structure ---

    /// The group at `index`, creating it (and fetching or placeholding it) if needed.
    pub fn group(&mut self, index: usize) -> Option<NodeId> {
        self.ensure_group(index)
    }

    /// Item `index` of `group`, creating it if needed. A placeholder group is materialized
    /// first, since its slots do not correspond to real items yet.
    pub fn child(&mut self, group: NodeId, index: usize) -> Option<NodeId> {
        let group_index = self.group_index_of(group)?;
        if self.needs_fetch(group) {
            self.materialize_group(group_index);
        }
        self.virtualization
            .ensure_child(&mut self.tree, &mut self.source, group, index)
    }

    /// Position of a group among the roots. `None` for items and dead handles.
    pub fn group_index_of(&self, id: NodeId) -> Option<usize> {
        let node = self.tree.get(id)?;
        node.parent.is_none().then_some(node.index)
    }

    /// Group index and item index of an item.
    pub fn position_of(&self, id: NodeId) -> Option<(usize, usize)> {
        let node = self.tree.get(id)?;
        let parent = node.parent?;
        Some((self.group_index_of(parent)?, node.index))
    }

    pub fn find(&self, key: crate::ItemKey) -> Option<NodeId> {
        self.tree.find(key)
    }

    pub(crate) fn ensure_group(&mut self, index: usize) -> Option<NodeId> {
        if let Some(id) = self.tree.root(index) {
            return Some(id);
        }
        let id = self
            .virtualization
            .ensure_group(&mut self.tree, &mut self.source, index)?;
        if self.needs_fetch(id) && !self.virtualization.config().virtual_groups {
            self.fetch_now(id);
        }
        Some(id)
    }

    /// Fetches the children of `id` without touching layout.
    fn fetch_now(&mut self, id: NodeId) -> Materialized {
        let outcome = self
            .virtualization
            .materialize(&mut self.tree, &mut self.source, id);
        self.after_fetch(id, &outcome);
        outcome
    }

    pub(crate) fn needs_fetch(&self, id: NodeId) -> bool {
        self.tree
            .get(id)
            .is_some_and(|n| !n.materialized && n.fetch == FetchState::Idle)
    }

    fn after_fetch(&mut self, id: NodeId, outcome: &Materialized) {
        match outcome {
            Materialized::Ready { .. } => {
                self.selection.retain_live(&self.tree);
                self.prune_focus();
                if !self.virtualization.config().virtual_items {
                    self.fill_children(id);
                }
            }
            Materialized::Failed(err) => {
                self.emit(GalleryEvent::FetchFailed {
                    group: id,
                    error: err.clone(),
                });
            }
            _ => {}
        }
    }

    fn fill_children(&mut self, group: NodeId) {
        let count = self.tree.get(group).map_or(0, |n| n.child_count());
        for index in 0..count {
            self.virtualization
                .ensure_child(&mut self.tree, &mut self.source, group, index);
        }
    }

    fn prune_focus(&mut self) {
        if self.focus.is_some_and(|f| !self.tree.contains(f)) {
            self.focus = None;
        }
    }

    /// Sets the number of groups. Groups past the new count are dropped.
    pub fn set_group_count(&mut self, count: usize) {
        let dropped = self.tree.set_slot_count(None, count);
        if !dropped.is_empty() {
            self.selection.on_truncated(&self.tree, None, count);
            self.selection.retain_live(&self.tree);
            self.prune_focus();
        }
        self.relayout(None, false);
    }

    /// Sets the real child count of `group`, replacing any placeholder estimate.
    pub fn set_child_count(&mut self, group: NodeId, count: usize) -> bool {
        if self.group_index_of(group).is_none() {
            return false;
        }
        let placeholder = self.tree.get(group).is_some_and(|n| n.placeholder);
        if placeholder {
            self.tree.set_slot_count(Some(group), 0);
        }
        self.tree.set_slot_count(Some(group), count);
        self.selection.on_truncated(&self.tree, Some(group), count);
        if let Some(node) = self.tree.get_mut(group) {
            node.placeholder = false;
            node.materialized = true;
            node.fetch = FetchState::Idle;
        }
        self.prune_focus();
        if !self.virtualization.config().virtual_items {
            self.fill_children(group);
        }
        self.relayout(Some(group), false);
        true
    }

    /// Appends a group.
    pub fn add_group(&mut self, descriptor: impl Into<ItemDescriptor>) -> Option<NodeId> {
        self.insert_group(None, descriptor)
    }

    /// Inserts a group at `index` (or at the end).
    pub fn insert_group(
        &mut self,
        index: Option<usize>,
        descriptor: impl Into<ItemDescriptor>,
    ) -> Option<NodeId> {
        let id = self.tree.insert(None, index, descriptor.into())?;
        let index = self.tree.index_of(id)?;
        self.selection.on_inserted(None, index);
        let extent = self.layout_group(index);
        self.splice_extent(index, Some(extent));
        self.notify();
        Some(id)
    }

    /// Appends an item to `group`.
    pub fn add_item(
        &mut self,
        group: NodeId,
        descriptor: impl Into<ItemDescriptor>,
    ) -> Option<NodeId> {
        self.insert_item(group, None, descriptor)
    }

    /// Inserts an item into `group` at `index` (or at the end).
    pub fn insert_item(
        &mut self,
        group: NodeId,
        index: Option<usize>,
        descriptor: impl Into<ItemDescriptor>,
    ) -> Option<NodeId> {
        self.group_index_of(group)?;
        if self.tree.get(group).is_some_and(|n| n.placeholder) {
            gwarn!("insert_item into a placeholder group");
            return None;
        }
        let id = self.tree.insert(Some(group), index, descriptor.into())?;
        let index = self.tree.index_of(id)?;
        self.selection.on_inserted(Some(group), index);
        self.relayout(Some(group), false);
        Some(id)
    }

    /// Replaces all children of `group`.
    pub fn set_children(
        &mut self,
        group: NodeId,
        children: impl IntoIterator<Item = ItemDescriptor>,
    ) -> bool {
        if self.group_index_of(group).is_none() {
            return false;
        }
        self.selection.forget_children(&self.tree, group);
        self.tree.clear_children(group);
        let children: Vec<ItemDescriptor> = children.into_iter().collect();
        self.tree.set_slot_count(Some(group), children.len());
        for (index, descriptor) in children.into_iter().enumerate() {
            self.tree.create(Some(group), index, descriptor);
        }
        if let Some(node) = self.tree.get_mut(group) {
            node.placeholder = false;
            node.materialized = true;
        }
        self.prune_focus();
        self.relayout(Some(group), false);
        true
    }

    /// Removes a group or item with everything below it.
    pub fn remove(&mut self, id: NodeId) -> bool {
        if !self.tree.contains(id) {
            return false;
        }
        self.selection.forget(&self.tree, id);
        self.animator.cancel(id);
        let Some((parent, index)) = self.tree.remove(id) else {
            gwarn!("remove: node is not attached to its parent");
            return false;
        };
        self.selection.on_removed(parent, index);
        self.prune_focus();
        match parent {
            None => {
                self.splice_extent(index, None);
                self.notify();
            }
            Some(group) => self.relayout(Some(group), false),
        }
        true
    }

    /// Removes everything.
    pub fn remove_all(&mut self) {
        self.tree.clear();
        self.selection.clear();
        self.animator.clear();
        self.extents = Fenwick::new(0);
        self.group_extents.clear();
        self.focus = None;
        self.viewport.set_extent(0);
        self.notify();
    }

    /// Drops the children of group `index`; they are fetched again when needed. With `all`,
    /// the group itself is described again by the content source.
    ///
    /// Plain groups backed by a content source are fetched again right away.
    pub fn clear(&mut self, index: usize, all: bool) -> bool {
        let Some(id) = self.reset_group(index, all) else {
            return false;
        };
        if !self.virtualization.config().virtual_groups && self.needs_fetch(id) {
            self.refetch(index, id, false);
        } else {
            self.relayout(Some(id), false);
        }
        true
    }

    /// [`Gallery::clear`] for every group.
    pub fn clear_all(&mut self, all: bool) {
        let eager = !self.virtualization.config().virtual_groups;
        for index in 0..self.tree.root_count() {
            if let Some(id) = self.reset_group(index, all) {
                if eager && self.needs_fetch(id) {
                    self.fetch_now(id);
                }
            }
        }
        self.relayout(None, false);
    }

    /// Clears group `index` and fetches it again right away.
    pub fn refresh_group(&mut self, index: usize) -> Materialized {
        let Some(id) = self.reset_group(index, false) else {
            return Materialized::Discarded;
        };
        if self.needs_fetch(id) {
            self.refetch(index, id, true)
        } else {
            self.relayout(Some(id), false);
            Materialized::Unchanged
        }
    }

    /// Fetches a group whose children were just dropped. The extent change from before the
    /// reset to the fetched content is compensated as one delta.
    fn refetch(&mut self, index: usize, id: NodeId, preceding: bool) -> Materialized {
        let outcome = if preceding {
            self.materialize_group(index)
        } else {
            self.materialize_one(index, id)
        };
        if !matches!(outcome, Materialized::Ready { .. }) {
            self.relayout(Some(id), false);
        }
        outcome
    }

    fn reset_group(&mut self, index: usize, all: bool) -> Option<NodeId> {
        let id = self.tree.root(index)?;
        self.selection.forget_children(&self.tree, id);
        self.tree.clear_children(id);
        if all {
            if let Some(source) = self.source.as_mut() {
                let descriptor = source.describe_group(index);
                self.tree.rekey(id, descriptor.key);
                if let Some(node) = self.tree.get_mut(id) {
                    node.expanded = descriptor.expanded;
                    node.expand_ratio = if descriptor.expanded { 1.0 } else { 0.0 };
                }
            }
        }
        let config = *self.virtualization.config();
        let has_source = self.source.is_some();
        if let Some(node) = self.tree.get_mut(id) {
            if config.virtual_groups {
                node.placeholder = true;
            } else if !has_source {
                node.materialized = true;
            }
        }
        if config.virtual_groups {
            self.tree
                .set_slot_count(Some(id), config.placeholder_item_count);
        }
        self.prune_focus();
        gdebug!(index, all, "group cleared");
        Some(id)
    }

    // --- virtualization ---

    /// Applies the answer to a fetch that returned [`FetchOutcome::Pending`].
    ///
    /// Returns `false` when the result was stale (the group was cleared or removed since) and
    /// has been discarded.
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<FetchOutcome, FetchError>,
    ) -> bool {
        let outcome = self.virtualization.complete(&mut self.tree, ticket, result);
        if matches!(outcome, Materialized::Discarded | Materialized::Unchanged) {
            return false;
        }
        let Some(index) = self.group_index_of(ticket.node) else {
            return false;
        };
        self.apply_materialized(index, ticket.node, &outcome);
        true
    }

    /// Makes the next materialization restore the current relative scroll location instead of
    /// compensating by the size change.
    pub fn keep_position(&mut self) {
        let location = self.viewport.capture_location();
        self.virtualization.keep_position(location);
    }

    /// Replaces the placeholder of group `index` with real content.
    ///
    /// In compatibility mode every placeholder before it is materialized first.
    pub(crate) fn materialize_group(&mut self, index: usize) -> Materialized {
        if self.virtualization.config().compatibility_mode {
            for before in 0..index {
                if let Some(id) = self.ensure_group(before) {
                    if self.needs_fetch(id) {
                        self.materialize_one(before, id);
                    }
                }
            }
        }
        match self.ensure_group(index) {
            Some(id) => self.materialize_one(index, id),
            None => Materialized::Discarded,
        }
    }

    fn materialize_one(&mut self, index: usize, id: NodeId) -> Materialized {
        let outcome = self
            .virtualization
            .materialize(&mut self.tree, &mut self.source, id);
        self.apply_materialized(index, id, &outcome);
        outcome
    }

    /// Scoped relayout after a group got real content, keeping the visible content in place.
    fn apply_materialized(&mut self, index: usize, id: NodeId, outcome: &Materialized) {
        let before = self.viewport.offset();
        let above = self.group_start(index) < before;
        self.after_fetch(id, outcome);
        if !matches!(outcome, Materialized::Ready { .. }) {
            return;
        }
        // Shrinking content may clamp the offset here; the shift below starts from `before`.
        let delta = self.relayout_scoped(index);
        if let Some(location) = self.virtualization.take_position() {
            self.viewport.restore_location(location);
        } else if above && delta != 0 {
            self.viewport.set_offset(before.saturating_add_signed(delta));
        }
        gdebug!(index, delta, above, "group materialized");
        self.notify();
    }

    // --- layout ---

    pub(crate) fn header_extent(&self) -> u64 {
        self.options.header_extent()
    }

    pub(crate) fn body_ratio(&self, node: &ItemNode) -> f32 {
        if self.options.always_expanded {
            1.0
        } else {
            node.expand_ratio
        }
    }

    /// Recomputes the grid of group `index` and returns its main-axis extent.
    ///
    /// With placeholder groups, a group that was never addressed is not created; its extent is
    /// the estimate of an expanded placeholder.
    fn layout_group(&mut self, index: usize) -> u64 {
        let spec = self.options.grid_spec();
        let cross = self.viewport.cross();
        let header = self.header_extent();
        let config = *self.virtualization.config();
        let id = match self.tree.root(index) {
            Some(id) => id,
            None if config.virtual_groups => {
                let grid = GridMetrics::compute(&spec, cross, config.placeholder_item_count);
                return header + body_extent(&grid, 1.0);
            }
            None => match self.ensure_group(index) {
                Some(id) => id,
                None => return 0,
            },
        };
        let always = self.options.always_expanded;
        let Some(node) = self.tree.get_mut(id) else {
            return 0;
        };
        node.grid = GridMetrics::compute(&spec, cross, node.children.len());
        let ratio = if always { 1.0 } else { node.expand_ratio };
        header + body_extent(&node.grid, ratio)
    }

    fn store_group_rect(&mut self, index: usize, start: u64) {
        let extent = self.group_extents.get(index).copied().unwrap_or(0);
        let rect = self.options.orientation.rect(
            start as i64,
            0,
            clamp_u32(extent),
            self.viewport.cross(),
        );
        if let Some(node) = self.tree.root(index).and_then(|id| self.tree.get_mut(id)) {
            node.rect = rect;
        }
    }

    /// Recomputes layout after a structural change.
    ///
    /// With `changed`, only that group (or the group owning that item) is recomputed and the
    /// groups after it shift by the delta. With `keep_location`, the relative position of the
    /// window center is preserved across the change.
    pub fn relayout(&mut self, changed: Option<NodeId>, keep_location: bool) {
        let location = if keep_location {
            self.viewport.capture_location()
        } else {
            None
        };

        let scoped = changed
            .and_then(|id| {
                let group = self.tree.parent(id).unwrap_or(id);
                self.group_index_of(group)
            })
            .filter(|_| self.group_extents.len() == self.tree.root_count());
        match scoped {
            Some(index) => {
                self.relayout_scoped(index);
            }
            None => self.relayout_full(),
        }

        if let Some(location) = location {
            self.viewport.restore_location(location);
        }
        self.notify();
    }

    fn relayout_scoped(&mut self, index: usize) -> i64 {
        if self.group_extents.len() != self.tree.root_count() {
            let before = self.extents.total();
            self.relayout_full();
            return self.extents.total() as i64 - before as i64;
        }
        let old = self.group_extents.get(index).copied().unwrap_or(0);
        let new = self.layout_group(index);
        if let Some(slot) = self.group_extents.get_mut(index) {
            *slot = new;
        }
        let delta = new as i64 - old as i64;
        self.extents.add(index, delta);
        self.store_group_rect(index, self.extents.prefix_sum(index));
        self.viewport.set_extent(self.extents.total());
        gtrace!(index, delta, "relayout_scoped");
        delta
    }

    fn relayout_full(&mut self) {
        let n = self.tree.root_count();
        let mut values = Vec::with_capacity(n);
        for index in 0..n {
            values.push(self.layout_group(index));
        }
        self.extents = Fenwick::from_values(&values);
        self.group_extents = values;
        let mut start = 0u64;
        for index in 0..n {
            self.store_group_rect(index, start);
            start = start.saturating_add(self.group_extents[index]);
        }
        self.viewport.set_extent(self.extents.total());
        gtrace!(groups = n, extent = self.extents.total(), "relayout_full");
    }

    /// Inserts (`Some`) or removes (`None`) the extent of group `index`.
    fn splice_extent(&mut self, index: usize, extent: Option<u64>) {
        match extent {
            Some(extent) if index == self.group_extents.len() => {
                self.group_extents.push(extent);
                self.extents.push_value(extent);
            }
            Some(extent) => {
                self.group_extents.insert(index.min(self.group_extents.len()), extent);
                self.extents = Fenwick::from_values(&self.group_extents);
            }
            None => {
                if index + 1 == self.group_extents.len() {
                    self.group_extents.pop();
                    self.extents.truncate(index);
                } else if index < self.group_extents.len() {
                    self.group_extents.remove(index);
                    self.extents = Fenwick::from_values(&self.group_extents);
                }
            }
        }
        let start = self.extents.prefix_sum(index);
        if index < self.group_extents.len() {
            self.store_group_rect(index, start);
        }
        self.viewport.set_extent(self.extents.total());
    }

    /// Main-axis start of group `index` in content coordinates.
    pub fn group_start(&self, index: usize) -> u64 {
        self.extents.prefix_sum(index)
    }

    /// Main-axis extent of group `index`.
    pub fn group_extent(&self, index: usize) -> u64 {
        self.group_extents.get(index).copied().unwrap_or(0)
    }

    /// Bounds of a group in content coordinates, header included.
    pub fn group_rect(&self, group: NodeId) -> Option<Rect> {
        let index = self.group_index_of(group)?;
        Some(self.options.orientation.rect(
            self.group_start(index) as i64,
            0,
            clamp_u32(self.group_extent(index)),
            self.viewport.cross(),
        ))
    }

    /// Bounds of an item in content coordinates. `None` while the item is hidden by a
    /// collapsed (or collapsing) group.
    pub fn item_rect(&self, item: NodeId) -> Option<Rect> {
        let (group_index, index) = self.position_of(item)?;
        let group = self.tree.get(self.tree.root(group_index)?)?;
        let grid = &group.grid;
        if index >= grid.count {
            return None;
        }
        let (main, cross) = grid.item_offset(index);
        let item_main = self.options.orientation.main(grid.item) as u64;
        if main + item_main > body_extent(grid, self.body_ratio(group)) {
            return None;
        }
        let start = self.group_start(group_index) + self.header_extent() + main;
        Some(self.options.orientation.rect(
            start as i64,
            cross as i64,
            self.options.orientation.main(grid.item),
            self.options.orientation.cross(grid.item),
        ))
    }

    /// Maps a content rectangle to viewport coordinates.
    pub fn to_viewport(&self, rect: Rect) -> Rect {
        let offset = self.viewport.offset() as i64;
        match self.options.orientation {
            Orientation::Vertical => rect.translate(0, -offset),
            Orientation::Horizontal => rect.translate(-offset, 0),
        }
    }

    // --- viewport ---

    pub fn client_size(&self) -> Size {
        self.viewport.client()
    }

    /// Resizes the client area, keeping the relative scroll location.
    pub fn set_client_size(&mut self, client: Size) {
        if self.viewport.client() == client {
            return;
        }
        let location = self.viewport.capture_location();
        let cross_changed = self.viewport.cross() != self.options.orientation.cross(client);
        self.viewport.set_client(client);
        if cross_changed {
            self.relayout(None, false);
        }
        if let Some(location) = location {
            self.viewport.restore_location(location);
        }
        self.notify();
    }

    pub fn set_orientation(&mut self, orientation: Orientation) {
        if self.options.orientation == orientation {
            return;
        }
        self.options.orientation = orientation;
        self.viewport.set_orientation(orientation);
        self.relayout(None, true);
    }

    pub fn item_size(&self) -> Size {
        self.options.item_size
    }

    /// Changes the item size, keeping the relative scroll location.
    pub fn set_item_size(&mut self, size: Size) {
        if self.options.item_size == size {
            return;
        }
        self.options.item_size = size;
        self.relayout(None, true);
    }

    pub fn scroll_offset(&self) -> u64 {
        self.viewport.offset()
    }

    /// Scrolls to `offset`, clamped. Returns the applied offset.
    pub fn set_scroll_offset(&mut self, offset: u64) -> u64 {
        let before = self.viewport.offset();
        let applied = self.viewport.set_offset(offset);
        if applied != before {
            self.notify();
        }
        applied
    }

    pub fn scroll_by(&mut self, delta: i64) -> bool {
        let changed = self.viewport.scroll_by(delta);
        if changed {
            self.notify();
        }
        changed
    }

    pub fn max_scroll_offset(&self) -> u64 {
        self.viewport.max_offset()
    }

    pub fn content_extent(&self) -> u64 {
        self.extents.total()
    }

    /// Values for the host scrollbar.
    pub fn scroll_range(&self) -> ScrollRange {
        self.viewport.scroll_range()
    }

    /// Scroll offset that makes `id` fully visible with minimal movement, or `None` if it has
    /// no visible bounds.
    pub fn reveal_offset(&self, id: NodeId) -> Option<u64> {
        let (start, len) = self.main_span(id)?;
        let mut viewport = self.viewport;
        viewport.reveal(start, len);
        Some(viewport.offset())
    }

    /// Scrolls so that `id` is fully visible. For a group, its header is revealed.
    pub fn reveal(&mut self, id: NodeId) -> bool {
        let Some((start, len)) = self.main_span(id) else {
            return false;
        };
        let changed = self.viewport.reveal(start, len);
        if changed {
            self.notify();
        }
        changed
    }

    fn main_span(&self, id: NodeId) -> Option<(u64, u64)> {
        let orientation = self.options.orientation;
        if let Some(index) = self.group_index_of(id) {
            let len = self.header_extent().min(self.group_extent(index));
            return Some((self.group_start(index), len));
        }
        let rect = self.item_rect(id)?;
        Some((
            orientation.rect_main(rect).max(0) as u64,
            orientation.rect_main_len(rect) as u64,
        ))
    }

    pub fn view_state(&self) -> ViewState {
        ViewState {
            orientation: self.options.orientation,
            item_size: self.options.item_size,
            client: self.viewport.client(),
            scroll: self.viewport.scroll_range(),
            location: self.viewport.capture_location(),
        }
    }

    /// Applies a snapshot taken with [`Gallery::view_state`].
    pub fn restore_view_state(&mut self, state: &ViewState) {
        self.batch_update(|g| {
            g.options.orientation = state.orientation;
            g.options.item_size = state.item_size;
            g.viewport.set_orientation(state.orientation);
            g.viewport.set_client(state.client);
            g.relayout(None, false);
            match state.location {
                Some(location) => g.viewport.restore_location(location),
                None => {
                    g.viewport.set_offset(state.scroll.offset);
                }
            }
            g.notify();
        });
    }

    // --- painting & hit testing ---

    /// Groups intersecting `clip` (viewport coordinates).
    pub fn visible_groups(&self, clip: Rect) -> Range<usize> {
        let n = self.group_extents.len().min(self.tree.root_count());
        let Some((start, end)) = self.clip_span(clip) else {
            return 0..0;
        };
        if n == 0 || start >= self.extents.total() {
            return 0..0;
        }
        let first = self.extents.lower_bound(start).min(n);
        let last = self.extents.lower_bound(end - 1).min(n - 1);
        first..(last + 1).max(first)
    }

    /// Main-axis span of `clip` in content coordinates, `[start, end)`.
    fn clip_span(&self, clip: Rect) -> Option<(u64, u64)> {
        let orientation = self.options.orientation;
        let offset = self.viewport.offset() as i64;
        let start = offset.saturating_add(orientation.rect_main(clip));
        let end = start.saturating_add(orientation.rect_main_len(clip) as i64);
        if end <= 0 || end <= start {
            return None;
        }
        Some((start.max(0) as u64, end as u64))
    }

    /// Draws everything intersecting `clip` (viewport coordinates).
    ///
    /// Visible placeholder groups are materialized first; each materialization may move the
    /// scroll offset, so the visible set is recomputed after every one of them.
    pub fn paint(&mut self, clip: Rect, delegate: &mut dyn DrawDelegate) {
        self.batch_update(|g| g.materialize_visible(clip));
        self.draw_visible(clip, delegate);
    }

    fn materialize_visible(&mut self, clip: Rect) {
        let mut budget = self.tree.root_count() + 1;
        while budget > 0 {
            budget -= 1;
            let mut next = None;
            for index in self.visible_groups(clip) {
                let Some(id) = self.ensure_group(index) else {
                    continue;
                };
                if self.needs_fetch(id) {
                    next = Some(index);
                    break;
                }
            }
            let Some(index) = next else {
                break;
            };
            self.materialize_group(index);
        }
    }

    fn draw_visible(&mut self, clip: Rect, delegate: &mut dyn DrawDelegate) {
        let Some((clip_start, clip_end)) = self.clip_span(clip) else {
            return;
        };
        let orientation = self.options.orientation;
        let cross = self.viewport.cross();
        let offset = self.viewport.offset() as i64;
        let header_size = self.options.header_size;
        let header_extent = self.header_extent();

        for index in self.visible_groups(clip) {
            let Some(id) = self.tree.root(index) else {
                continue;
            };
            let start = self.group_start(index);
            self.store_group_rect(index, start);
            let Some(node) = self.tree.get(id) else {
                continue;
            };
            let rect = node.rect;
            let header = header_size.map_or(Rect::default(), |h| {
                orientation.rect(start as i64 - offset, 0, h, cross)
            });
            let ratio = self.body_ratio(node);
            let grid = node.grid;
            let skip_items = node.placeholder || ratio <= 0.0;
            delegate.draw_group(&DrawGroup {
                id,
                key: node.key,
                index,
                rect: self.to_viewport(rect),
                header,
                clip,
                expanded: node.expanded,
                expand_ratio: ratio,
                child_count: node.child_count(),
                selected: self.selection.is_selected(&self.tree, id),
                placeholder: node.placeholder,
                fetch: node.fetch,
            });
            if skip_items {
                continue;
            }

            let origin = start + header_extent;
            let body = body_extent(&grid, ratio) as i64;
            let rel_start = clip_start as i64 - origin as i64;
            let rel_end = (clip_end as i64 - origin as i64).min(body);
            let item_main = orientation.main(grid.item);
            let item_cross = orientation.cross(grid.item);
            for item_index in grid.visible_range(rel_start, rel_end) {
                let Some(item) = self.virtualization.ensure_child(
                    &mut self.tree,
                    &mut self.source,
                    id,
                    item_index,
                ) else {
                    continue;
                };
                let (main, cross_off) = grid.item_offset(item_index);
                let rect = orientation.rect(
                    (origin + main) as i64,
                    cross_off as i64,
                    item_main,
                    item_cross,
                );
                let Some(node) = self.tree.get_mut(item) else {
                    continue;
                };
                node.rect = rect;
                let key = node.key;
                delegate.draw_item(&DrawItem {
                    id: item,
                    key,
                    group: id,
                    index: item_index,
                    rect: self.to_viewport(rect),
                    clip,
                    selected: self.selection.is_selected(&self.tree, item),
                    focused: self.focus == Some(item),
                });
            }
        }
    }

    /// What lies under `point` (viewport coordinates). May create the item node under it.
    pub fn hit_test(&mut self, point: Point) -> Hit {
        let orientation = self.options.orientation;
        let main = self.viewport.offset() as i64 + orientation.main_pos(point);
        let cross = orientation.cross_pos(point);
        if main < 0 || cross < 0 || cross >= self.viewport.cross() as i64 {
            return Hit::None;
        }
        let main = main as u64;
        if main >= self.extents.total() {
            return Hit::None;
        }
        let index = self.extents.lower_bound(main);
        let Some(id) = self.ensure_group(index) else {
            return Hit::None;
        };
        let rel = main - self.group_start(index);

        if let Some(h) = self.options.header_size {
            if rel < h as u64 {
                let toggle = !self.options.always_expanded && cross < h as i64;
                return Hit::Header { group: id, toggle };
            }
        }
        let header_extent = self.header_extent();
        let Some(node) = self.tree.get(id) else {
            return Hit::None;
        };
        if rel < header_extent || node.placeholder {
            return Hit::Group(id);
        }
        let body_rel = rel - header_extent;
        if body_rel >= body_extent(&node.grid, self.body_ratio(node)) {
            return Hit::Group(id);
        }
        let Some(item_index) = node.grid.index_at(body_rel as i64, cross) else {
            return Hit::Group(id);
        };
        match self
            .virtualization
            .ensure_child(&mut self.tree, &mut self.source, id, item_index)
        {
            Some(item) => Hit::Item { group: id, item },
            None => Hit::Group(id),
        }
    }
}

impl core::fmt::Debug for Gallery {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Gallery")
            .field("options", &self.options)
            .field("groups", &self.tree.root_count())
            .field("nodes", &self.tree.len())
            .field("selected", &self.selection.len())
            .field("viewport", &self.viewport)
            .field("focus", &self.focus)
            .field("has_source", &self.source.is_some())
            .finish_non_exhaustive()
    }
}

/// Visible main-axis extent of a group body at expansion `ratio`.
pub(crate) fn body_extent(grid: &GridMetrics, ratio: f32) -> u64 {
    let full = grid.main_extent();
    if ratio >= 1.0 {
        full
    } else if ratio <= 0.0 {
        0
    } else {
        (full as f64 * ratio as f64) as u64
    }
}

fn clamp_u32(v: u64) -> u32 {
    v.min(u32::MAX as u64) as u32
}
