//! Selection, expansion, zoom and keyboard navigation on top of [`Gallery`].

use alloc::vec::Vec;

use crate::gallery::Gallery;
use crate::navigation::{GridPosition, NavCommand, NavigationGrid, NavigationResolver};
use crate::tree::NodeId;
use crate::{GalleryEvent, Size};

/// A point of the tree in selection order: a group header sorts before its items.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct TreePos {
    group: usize,
    item: Option<usize>,
}

impl Gallery {
    // --- selection ---

    pub fn is_selected(&self, id: NodeId) -> bool {
        self.selection.is_selected(&self.tree, id)
    }

    /// Selected nodes in selection order.
    pub fn selection(&self) -> &[NodeId] {
        self.selection.selected()
    }

    fn selection_changed(&self, node: Option<NodeId>, activated: bool) {
        self.notify();
        self.emit(GalleryEvent::SelectionChanged { node, activated });
    }

    /// Adds `id` to the selection (replaces it without multi-selection).
    pub fn select(&mut self, id: NodeId) -> bool {
        let changed = self.selection.select(&self.tree, id);
        if changed {
            self.selection_changed(Some(id), false);
        }
        changed
    }

    pub fn deselect(&mut self, id: NodeId) -> bool {
        let changed = self.selection.deselect(&self.tree, id);
        if changed {
            self.selection_changed(Some(id), false);
        }
        changed
    }

    pub fn toggle_selected(&mut self, id: NodeId) -> bool {
        if self.is_selected(id) {
            self.deselect(id)
        } else {
            self.select(id)
        }
    }

    /// Makes `id` the only selected node.
    pub fn select_only(&mut self, id: NodeId) -> bool {
        let changed = self.replace_selection(id);
        if changed {
            self.selection_changed(Some(id), false);
        }
        changed
    }

    /// Makes `id` the only selected node without reporting it.
    pub fn select_only_silent(&mut self, id: NodeId) -> bool {
        let changed = self.replace_selection(id);
        if changed {
            self.notify();
        }
        changed
    }

    fn replace_selection(&mut self, id: NodeId) -> bool {
        if !self.tree.contains(id) {
            return false;
        }
        if self.selection.len() == 1 && self.is_selected(id) {
            return false;
        }
        self.selection.deselect_all();
        self.selection.select(&self.tree, id)
    }

    /// Selects everything between `from` and `to` in tree order, both included.
    ///
    /// Items of groups lying strictly between the two ends are all selected. A group end
    /// stands for the whole group; group nodes themselves are only selected when both ends are
    /// groups. Without multi-selection only `to` is selected.
    pub fn select_range(&mut self, from: NodeId, to: NodeId) -> bool {
        if !self.selection.is_multi() {
            return self.select_only(to);
        }
        let (Some(a), Some(b)) = (self.tree_pos(from), self.tree_pos(to)) else {
            return false;
        };
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let with_groups = lo.item.is_none() && hi.item.is_none();

        let mut ids = Vec::new();
        for group in lo.group..=hi.group {
            let Some(id) = self.ensure_group(group) else {
                continue;
            };
            if with_groups {
                ids.push(id);
            }
            let count = self.item_count(group);
            if count == 0 {
                continue;
            }
            let first = if group == lo.group { lo.item.unwrap_or(0) } else { 0 };
            let last = match (group == hi.group, hi.item) {
                (true, Some(item)) => item.min(count - 1),
                _ => count - 1,
            };
            for index in first..=last {
                if let Some(item) = self.child(id, index) {
                    ids.push(item);
                }
            }
        }
        let changed = self.selection.select_many(&self.tree, &ids);
        if changed {
            self.selection_changed(Some(to), false);
        }
        changed
    }

    fn tree_pos(&self, id: NodeId) -> Option<TreePos> {
        if let Some(group) = self.group_index_of(id) {
            return Some(TreePos { group, item: None });
        }
        let (group, item) = self.position_of(id)?;
        Some(TreePos {
            group,
            item: Some(item),
        })
    }

    /// Selects every item of `group`, materializing it if needed.
    pub fn select_children(&mut self, group: NodeId) -> bool {
        let Some(index) = self.group_index_of(group) else {
            return false;
        };
        let count = self.item_count(index);
        let ids: Vec<NodeId> = (0..count).filter_map(|i| self.child(group, i)).collect();
        let changed = self.selection.select_many(&self.tree, &ids);
        if changed {
            self.selection_changed(ids.last().copied(), false);
        }
        changed
    }

    /// Selects every item of every group. Requires multi-selection.
    pub fn select_all(&mut self) -> bool {
        if !self.selection.is_multi() {
            return false;
        }
        let mut ids = Vec::new();
        for group in 0..self.tree.root_count() {
            let Some(id) = self.ensure_group(group) else {
                continue;
            };
            for index in 0..self.item_count(group) {
                if let Some(item) = self.child(id, index) {
                    ids.push(item);
                }
            }
        }
        let changed = self.selection.select_many(&self.tree, &ids);
        if changed {
            self.selection_changed(ids.last().copied(), false);
        }
        changed
    }

    /// Deselects everything and reports a selection change with no node.
    pub fn deselect_all(&mut self) -> bool {
        let changed = self.selection.deselect_all();
        if changed {
            self.selection_changed(None, false);
        }
        changed
    }

    /// Deselects everything without reporting it.
    pub fn clear_selection(&mut self) -> bool {
        let changed = self.selection.deselect_all();
        if changed {
            self.notify();
        }
        changed
    }

    /// Replaces the selection with `ids` and reveals the first of them.
    pub fn set_selection(&mut self, ids: &[NodeId]) -> bool {
        let cleared = self.selection.deselect_all();
        let selected = self.selection.select_many(&self.tree, ids);
        if !cleared && !selected {
            return false;
        }
        let first = self.selection.selected().first().copied();
        if let Some(first) = first {
            self.reveal(first);
        }
        self.selection_changed(first, false);
        true
    }

    /// Fires the default action on `id` (double click, Enter).
    pub fn activate(&mut self, id: NodeId) -> bool {
        if !self.tree.contains(id) {
            return false;
        }
        self.emit(GalleryEvent::SelectionChanged {
            node: Some(id),
            activated: true,
        });
        true
    }

    /// Fires the default action on the focused item, or the first selected node.
    pub fn activate_current(&mut self) -> Option<NodeId> {
        let id = self
            .focus
            .or_else(|| self.selection.selected().first().copied())?;
        self.activate(id).then_some(id)
    }

    // --- focus & navigation ---

    pub fn focus(&self) -> Option<NodeId> {
        self.focus
    }

    pub fn set_focus(&mut self, id: Option<NodeId>) {
        let id = id.filter(|&id| self.tree.contains(id));
        if self.focus != id {
            self.focus = id;
            self.notify();
        }
    }

    fn nav_resolver(&self) -> NavigationResolver {
        let item_main = self.options.orientation.main(self.options.item_size).max(1) as u64;
        let visible_lines = (self.viewport.window() / item_main) as usize;
        NavigationResolver::new(self.options.orientation, visible_lines)
    }

    /// The item `command` leads to from the focused (or last selected) item, without moving
    /// anything. Home/End may expand the first/last group.
    ///
    /// A focused (or last selected) group counts as its first item, so keys move into that
    /// group instead of doing nothing. A collapsed or empty group yields `None` for commands
    /// that need an item to start from.
    pub fn resolve_navigation(&mut self, command: NavCommand) -> Option<NodeId> {
        let current = match self
            .focus
            .or_else(|| self.selection.selected().last().copied())
        {
            Some(id) => match self.position_of(id) {
                Some((group, index)) => Some(GridPosition::new(group, index)),
                // A group stands in for its first item.
                None => self.group_index_of(id).map(|g| GridPosition::new(g, 0)),
            },
            None => None,
        };
        let resolver = self.nav_resolver();
        let target = resolver.resolve(self, current, command)?;
        let group = self.ensure_group(target.group)?;
        self.child(group, target.index)
    }

    /// Moves focus and selection with a navigation key and scrolls the target into view.
    pub fn navigate(&mut self, command: NavCommand) -> Option<NodeId> {
        let target = self.resolve_navigation(command)?;
        self.batch_update(|g| {
            g.focus = Some(target);
            g.select_only(target);
            g.reveal(target);
            g.notify();
        });
        Some(target)
    }

    // --- expansion ---

    /// Expands or collapses `group`. Collapsing deselects its items.
    ///
    /// With animation enabled the body size follows [`Gallery::tick`]; otherwise layout updates
    /// right away.
    pub fn set_expanded(&mut self, group: NodeId, expanded: bool) -> bool {
        if self.options.always_expanded || self.group_index_of(group).is_none() {
            return false;
        }
        let Some(node) = self.tree.get_mut(group) else {
            return false;
        };
        if node.expanded == expanded {
            return false;
        }
        node.expanded = expanded;
        let current = node.expand_ratio;

        if !expanded && self.selection.deselect_children(&self.tree, group) {
            gtrace!("collapse deselected items");
        }
        if !expanded && self.focus.is_some_and(|f| self.tree.parent(f) == Some(group)) {
            self.focus = None;
        }
        self.emit(GalleryEvent::ExpandChanged { group, expanded });

        if self.options.animation {
            let easing = if expanded {
                self.options.animation_open
            } else {
                self.options.animation_close
            };
            self.animator.start(
                group,
                expanded,
                current,
                self.now_ms,
                self.options.animation_duration_ms,
                easing,
            );
            self.notify();
        } else {
            if let Some(node) = self.tree.get_mut(group) {
                node.expand_ratio = if expanded { 1.0 } else { 0.0 };
            }
            self.relayout(Some(group), false);
        }
        true
    }

    pub fn toggle_expanded(&mut self, group: NodeId) -> bool {
        let expanded = self.tree.get(group).is_some_and(|n| n.expanded);
        self.set_expanded(group, !expanded)
    }

    pub fn is_animating(&self) -> bool {
        !self.animator.is_empty()
    }

    /// Advances expand/collapse animations to `now_ms`. Returns whether any is still running.
    pub fn tick(&mut self, now_ms: u64) -> bool {
        self.now_ms = now_ms;
        if self.animator.is_empty() {
            return false;
        }
        let tree = &self.tree;
        let frame = self.animator.tick(now_ms, |id| tree.contains(id));
        if !frame.is_empty() {
            self.batch_update(|g| {
                for (group, ratio) in frame.updated {
                    if let Some(node) = g.tree.get_mut(group) {
                        node.expand_ratio = ratio;
                    }
                    g.relayout(Some(group), false);
                }
            });
        }
        !self.animator.is_empty()
    }

    // --- zoom ---

    /// Grows or shrinks the item width by `step` within the zoom range, keeping the item ratio
    /// and the relative scroll location. Returns the new item size, or `None` when zoom is
    /// disabled or already at the limit.
    pub fn zoom(&mut self, zoom_in: bool, step: u32) -> Option<Size> {
        let (min, max) = self.options.zoom_range?;
        let width = self.options.item_size.width;
        let width = if zoom_in {
            if width >= max {
                return None;
            }
            width.saturating_add(step).min(max)
        } else {
            if width <= min {
                return None;
            }
            width.saturating_sub(step).max(min)
        };
        let height = if self.options.item_ratio > 0.0 {
            (width as f32 / self.options.item_ratio) as u32
        } else {
            self.options.item_size.height
        };
        let size = Size::new(width, height.max(1));
        self.set_item_size(size);
        gdebug!(width = size.width, height = size.height, "zoom");
        self.emit(GalleryEvent::Zoomed { item_size: size });
        Some(size)
    }
}

impl NavigationGrid for Gallery {
    fn group_count(&self) -> usize {
        self.tree.root_count()
    }

    fn item_count(&mut self, group: usize) -> usize {
        let Some(id) = self.ensure_group(group) else {
            return 0;
        };
        if self.needs_fetch(id) {
            self.materialize_group(group);
        }
        self.tree
            .get(id)
            .filter(|n| !n.placeholder)
            .map_or(0, |n| n.child_count())
    }

    fn is_navigable(&self, group: usize) -> bool {
        // Groups not created yet start expanded.
        self.options.always_expanded
            || self
                .tree
                .root(group)
                .and_then(|id| self.tree.get(id))
                .is_none_or(|n| n.expanded)
    }

    fn line_len(&self, group: usize) -> usize {
        self.tree
            .root(group)
            .and_then(|id| self.tree.get(id))
            .map_or(1, |n| n.grid.per_line.max(1))
    }

    fn expand(&mut self, group: usize) {
        if let Some(id) = self.ensure_group(group) {
            self.set_expanded(id, true);
        }
    }
}
