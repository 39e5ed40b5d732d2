use alloc::vec::Vec;

use slotmap::{SlotMap, new_key_type};

use crate::grid::GridMetrics;
use crate::key::KeyMap;
use crate::{ItemDescriptor, ItemKey, Rect};

new_key_type! {
    /// Handle to a group or item. A handle of a removed node never resolves again.
    pub struct NodeId;
}

/// Progress of a content fetch for a group.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FetchState {
    #[default]
    Idle,
    /// A fetch was requested and its result has not arrived yet.
    Pending,
    /// The last fetch failed. The group keeps its placeholder until it is cleared.
    Failed,
}

/// A group (root node) or an item (child of a group).
///
/// Position and size are layout outputs in content coordinates; they are written by the gallery
/// whenever the node is laid out.
#[derive(Clone, Debug)]
pub struct ItemNode {
    pub(crate) key: ItemKey,
    pub(crate) parent: Option<NodeId>,
    pub(crate) index: usize,
    pub(crate) children: Vec<Option<NodeId>>,
    pub(crate) materialized: bool,
    pub(crate) placeholder: bool,
    pub(crate) expanded: bool,
    /// Visible share of the group body, `0.0..=1.0`. Animated between the two.
    pub(crate) expand_ratio: f32,
    /// Bumped whenever the children are dropped; stale fetch results carry an older value.
    pub(crate) version: u32,
    pub(crate) fetch: FetchState,
    pub(crate) rect: Rect,
    pub(crate) grid: GridMetrics,
}

impl ItemNode {
    fn new(descriptor: ItemDescriptor, parent: Option<NodeId>, index: usize) -> Self {
        Self {
            key: descriptor.key,
            parent,
            index,
            children: Vec::new(),
            materialized: true,
            placeholder: false,
            expanded: descriptor.expanded,
            expand_ratio: if descriptor.expanded { 1.0 } else { 0.0 },
            version: 0,
            fetch: FetchState::Idle,
            rect: Rect::default(),
            grid: GridMetrics::default(),
        }
    }

    pub fn key(&self) -> ItemKey {
        self.key
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Position among the siblings.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_group(&self) -> bool {
        self.parent.is_none()
    }

    /// Declared number of children. Slots may still be empty in virtual mode.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// The child at `index`, if it has been created.
    pub fn child(&self, index: usize) -> Option<NodeId> {
        self.children.get(index).copied().flatten()
    }

    pub fn children(&self) -> &[Option<NodeId>] {
        &self.children
    }

    pub fn is_materialized(&self) -> bool {
        self.materialized
    }

    /// Whether the child count is an estimate that still has to be replaced by real data.
    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn expand_ratio(&self) -> f32 {
        self.expand_ratio
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn fetch_state(&self) -> FetchState {
        self.fetch
    }

    /// Last computed bounds, in content coordinates.
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Last computed grid of a group's children.
    pub fn grid(&self) -> &GridMetrics {
        &self.grid
    }
}

/// Arena of all nodes. Groups are the roots; items are their children.
///
/// Parents own their children through `children`; `parent` is a plain key and never keeps a
/// node alive.
#[derive(Clone, Debug, Default)]
pub struct ItemTree {
    nodes: SlotMap<NodeId, ItemNode>,
    roots: Vec<Option<NodeId>>,
    keys: KeyMap<NodeId>,
}

impl ItemTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&ItemNode> {
        self.nodes.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut ItemNode> {
        self.nodes.get_mut(id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn root_count(&self) -> usize {
        self.roots.len()
    }

    pub fn root(&self, index: usize) -> Option<NodeId> {
        self.roots.get(index).copied().flatten()
    }

    pub fn roots(&self) -> &[Option<NodeId>] {
        &self.roots
    }

    /// The node registered for `key`, if any.
    pub fn find(&self, key: ItemKey) -> Option<NodeId> {
        self.keys.get(&key).copied()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        self.nodes.get(id).map(|n| n.index)
    }

    /// Child slots of `parent`, or the root slots for `None`.
    pub fn siblings(&self, parent: Option<NodeId>) -> &[Option<NodeId>] {
        match parent {
            None => &self.roots,
            Some(p) => self.nodes.get(p).map_or(&[], |n| n.children.as_slice()),
        }
    }

    fn siblings_mut(&mut self, parent: Option<NodeId>) -> Option<&mut Vec<Option<NodeId>>> {
        match parent {
            None => Some(&mut self.roots),
            Some(p) => self.nodes.get_mut(p).map(|n| &mut n.children),
        }
    }

    /// Resizes the slot list of `parent`. Nodes beyond the new count are dropped with their
    /// subtrees and returned.
    pub(crate) fn set_slot_count(&mut self, parent: Option<NodeId>, count: usize) -> Vec<NodeId> {
        let Some(slots) = self.siblings_mut(parent) else {
            return Vec::new();
        };
        let dropped: Vec<NodeId> = if count < slots.len() {
            slots.drain(count..).flatten().collect()
        } else {
            slots.resize(count, None);
            Vec::new()
        };
        for &id in &dropped {
            self.drop_subtree(id);
        }
        dropped
    }

    /// Fills the empty slot `index` of `parent`. Returns the existing node if the slot is taken.
    pub(crate) fn create(
        &mut self,
        parent: Option<NodeId>,
        index: usize,
        descriptor: ItemDescriptor,
    ) -> Option<NodeId> {
        let existing = *self.siblings(parent).get(index)?;
        if existing.is_some() {
            return existing;
        }
        if parent.is_some_and(|p| !self.nodes.contains_key(p)) {
            return None;
        }
        let id = self
            .nodes
            .insert(ItemNode::new(descriptor, parent, index));
        self.keys.insert(descriptor.key, id);
        if let Some(slot) = self.siblings_mut(parent).and_then(|s| s.get_mut(index)) {
            *slot = Some(id);
        }
        Some(id)
    }

    /// Inserts a new node at `index` (or at the end), shifting later siblings.
    pub(crate) fn insert(
        &mut self,
        parent: Option<NodeId>,
        index: Option<usize>,
        descriptor: ItemDescriptor,
    ) -> Option<NodeId> {
        let len = self.siblings_mut(parent)?.len();
        let index = index.unwrap_or(len).min(len);
        let id = self
            .nodes
            .insert(ItemNode::new(descriptor, parent, index));
        self.keys.insert(descriptor.key, id);
        self.siblings_mut(parent)?.insert(index, Some(id));
        self.reindex_from(parent, index + 1);
        Some(id)
    }

    /// Detaches and drops `id` with its subtree. Returns where it was.
    pub(crate) fn remove(&mut self, id: NodeId) -> Option<(Option<NodeId>, usize)> {
        let node = self.nodes.get(id)?;
        let (parent, index) = (node.parent, node.index);
        let slots = self.siblings_mut(parent)?;
        if slots.get(index).copied().flatten() != Some(id) {
            return None;
        }
        slots.remove(index);
        self.reindex_from(parent, index);
        self.drop_subtree(id);
        Some((parent, index))
    }

    /// Drops every child of `id` while keeping the node itself. Returns the dropped nodes.
    pub(crate) fn clear_children(&mut self, id: NodeId) -> Vec<NodeId> {
        let Some(node) = self.nodes.get_mut(id) else {
            return Vec::new();
        };
        let dropped: Vec<NodeId> = node.children.drain(..).flatten().collect();
        node.materialized = false;
        node.version = node.version.wrapping_add(1);
        node.fetch = FetchState::Idle;
        node.grid = GridMetrics::default();
        for &child in &dropped {
            self.drop_subtree(child);
        }
        dropped
    }

    /// Registers `id` under a new key.
    pub(crate) fn rekey(&mut self, id: NodeId, key: ItemKey) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        let old = node.key;
        node.key = key;
        if self.keys.get(&old) == Some(&id) {
            self.keys.remove(&old);
        }
        self.keys.insert(key, id);
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.roots.clear();
        self.keys.clear();
    }

    fn reindex_from(&mut self, parent: Option<NodeId>, start: usize) {
        let moved: Vec<(usize, NodeId)> = self
            .siblings(parent)
            .iter()
            .enumerate()
            .skip(start)
            .filter_map(|(i, slot)| slot.map(|id| (i, id)))
            .collect();
        for (i, id) in moved {
            if let Some(node) = self.nodes.get_mut(id) {
                node.index = i;
            }
        }
    }

    fn drop_subtree(&mut self, id: NodeId) {
        let mut stack = alloc::vec![id];
        while let Some(next) = stack.pop() {
            let Some(node) = self.nodes.remove(next) else {
                continue;
            };
            if self.keys.get(&node.key) == Some(&next) {
                self.keys.remove(&node.key);
            }
            stack.extend(node.children.into_iter().flatten());
        }
    }
}
