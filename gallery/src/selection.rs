use alloc::vec::Vec;

use slotmap::SecondaryMap;

use crate::tree::{ItemTree, NodeId};

/// Selection flags of one sibling list, one bit per position.
///
/// Position `p` lives in block `p >> 5`, bit `p & 31`. `touched` lists exactly the non-zero
/// blocks, so clearing costs as much as the selection, not the sibling count.
#[derive(Clone, Debug, Default)]
pub struct SelectionBits {
    blocks: Vec<u32>,
    touched: Vec<usize>,
}

impl SelectionBits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, pos: usize) -> bool {
        self.blocks
            .get(pos >> 5)
            .is_some_and(|b| b & (1 << (pos & 31)) != 0)
    }

    /// Sets `pos`. Returns `false` if it was already set.
    pub fn insert(&mut self, pos: usize) -> bool {
        let block = pos >> 5;
        if block >= self.blocks.len() {
            self.blocks.resize(block + 1, 0);
        }
        let bit = 1u32 << (pos & 31);
        let cur = self.blocks[block];
        if cur & bit != 0 {
            return false;
        }
        if cur == 0 {
            self.touched.push(block);
        }
        self.blocks[block] = cur | bit;
        true
    }

    /// Clears `pos`. Returns `false` if it was not set.
    pub fn remove(&mut self, pos: usize) -> bool {
        let block = pos >> 5;
        let bit = 1u32 << (pos & 31);
        let Some(cur) = self.blocks.get_mut(block) else {
            return false;
        };
        if *cur & bit == 0 {
            return false;
        }
        *cur &= !bit;
        if *cur == 0 {
            if let Some(i) = self.touched.iter().position(|&t| t == block) {
                self.touched.swap_remove(i);
            }
        }
        true
    }

    pub fn is_empty(&self) -> bool {
        self.touched.is_empty()
    }

    pub fn clear(&mut self) {
        for block in self.touched.drain(..) {
            if let Some(b) = self.blocks.get_mut(block) {
                *b = 0;
            }
        }
    }

    /// Set positions in ascending order.
    pub fn positions(&self) -> Vec<usize> {
        let mut blocks = self.touched.clone();
        blocks.sort_unstable();
        let mut out = Vec::new();
        for block in blocks {
            let mut bits = self.blocks[block];
            while bits != 0 {
                let bit = bits.trailing_zeros() as usize;
                out.push((block << 5) | bit);
                bits &= bits - 1;
            }
        }
        out
    }

    /// Drops `pos` and moves every later position down by one.
    pub fn remove_at(&mut self, pos: usize) {
        let positions = self.positions();
        if positions.last().is_none_or(|&last| last < pos) {
            return;
        }
        self.clear();
        for p in positions {
            if p < pos {
                self.insert(p);
            } else if p > pos {
                self.insert(p - 1);
            }
        }
    }

    /// Moves every position `>= pos` up by one.
    pub fn insert_at(&mut self, pos: usize) {
        let positions = self.positions();
        if positions.last().is_none_or(|&last| last < pos) {
            return;
        }
        self.clear();
        for p in positions {
            self.insert(if p >= pos { p + 1 } else { p });
        }
    }
}

/// Which nodes are selected, as per-sibling-list bit flags plus the selection order.
///
/// A node is flagged iff it appears in `order`. Without multi-selection `order` holds at most
/// one node.
#[derive(Clone, Debug, Default)]
pub struct SelectionIndex {
    multi: bool,
    roots: SelectionBits,
    groups: SecondaryMap<NodeId, SelectionBits>,
    /// Keys of `groups`, so clearing never walks the whole slot range of the map.
    group_keys: Vec<NodeId>,
    order: Vec<NodeId>,
}

impl SelectionIndex {
    pub fn new(multi: bool) -> Self {
        Self {
            multi,
            ..Self::default()
        }
    }

    pub fn is_multi(&self) -> bool {
        self.multi
    }

    /// Switches the mode. Leaving multi-selection keeps only the first selected node.
    pub fn set_multi(&mut self, tree: &ItemTree, multi: bool) {
        self.multi = multi;
        if !multi && self.order.len() > 1 {
            let rest: Vec<NodeId> = self.order.drain(1..).collect();
            for id in rest {
                if let Some(bits) = self.bits_mut(tree, id) {
                    bits.0.remove(bits.1);
                }
            }
        }
    }

    /// Selected nodes in the order they were selected.
    pub fn selected(&self) -> &[NodeId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn bits(&self, tree: &ItemTree, id: NodeId) -> Option<(&SelectionBits, usize)> {
        let node = tree.get(id)?;
        let bits = match node.parent {
            None => &self.roots,
            Some(p) => self.groups.get(p)?,
        };
        Some((bits, node.index))
    }

    fn bits_mut(&mut self, tree: &ItemTree, id: NodeId) -> Option<(&mut SelectionBits, usize)> {
        let node = tree.get(id)?;
        let bits = match node.parent {
            None => &mut self.roots,
            Some(p) => {
                if !self.groups.contains_key(p) {
                    self.groups.insert(p, SelectionBits::new());
                    self.group_keys.push(p);
                }
                self.groups.get_mut(p)?
            }
        };
        Some((bits, node.index))
    }

    fn drop_group(&mut self, group: NodeId) -> Option<SelectionBits> {
        let bits = self.groups.remove(group)?;
        if let Some(i) = self.group_keys.iter().position(|&g| g == group) {
            self.group_keys.swap_remove(i);
        }
        Some(bits)
    }

    /// Sibling lists of groups currently holding selection bits.
    #[cfg(test)]
    pub(crate) fn group_lists(&self) -> usize {
        debug_assert_eq!(self.groups.len(), self.group_keys.len());
        self.group_keys.len()
    }

    /// `O(1)`: one bit lookup at the node's position in its parent.
    pub fn is_selected(&self, tree: &ItemTree, id: NodeId) -> bool {
        self.bits(tree, id)
            .is_some_and(|(bits, pos)| bits.contains(pos))
    }

    /// Selects `id`. Without multi-selection everything else is deselected first.
    ///
    /// Returns whether the selection changed.
    pub fn select(&mut self, tree: &ItemTree, id: NodeId) -> bool {
        if !tree.contains(id) {
            return false;
        }
        let selected = self.is_selected(tree, id);
        if self.multi {
            if selected {
                return false;
            }
        } else {
            if selected && self.order.len() == 1 {
                return false;
            }
            self.deselect_all();
        }
        let Some((bits, pos)) = self.bits_mut(tree, id) else {
            return false;
        };
        if bits.insert(pos) {
            self.order.push(id);
        }
        true
    }

    /// Returns whether the selection changed.
    pub fn deselect(&mut self, tree: &ItemTree, id: NodeId) -> bool {
        let Some(node) = tree.get(id) else {
            return false;
        };
        let (parent, pos) = (node.parent, node.index);
        let emptied = match parent {
            None => {
                if !self.roots.remove(pos) {
                    return false;
                }
                false
            }
            Some(p) => {
                let Some(bits) = self.groups.get_mut(p) else {
                    return false;
                };
                if !bits.remove(pos) {
                    return false;
                }
                bits.is_empty()
            }
        };
        if emptied {
            if let Some(p) = parent {
                self.drop_group(p);
            }
        }
        if let Some(i) = self.order.iter().position(|&n| n == id) {
            self.order.remove(i);
        }
        true
    }

    /// Selects every node of `ids`, keeping their order. Without multi-selection only the last
    /// one ends up selected.
    pub fn select_many(&mut self, tree: &ItemTree, ids: &[NodeId]) -> bool {
        if !self.multi {
            return ids.last().is_some_and(|&id| self.select(tree, id));
        }
        let mut changed = false;
        for &id in ids {
            changed |= self.select(tree, id);
        }
        changed
    }

    /// Clears everything. Cost is proportional to the number of touched blocks.
    pub fn deselect_all(&mut self) -> bool {
        if self.order.is_empty() {
            return false;
        }
        self.roots.clear();
        for group in self.group_keys.drain(..) {
            self.groups.remove(group);
        }
        self.order.clear();
        true
    }

    /// Deselects every child of `group`.
    pub fn deselect_children(&mut self, tree: &ItemTree, group: NodeId) -> bool {
        let Some(bits) = self.drop_group(group) else {
            return false;
        };
        if bits.is_empty() {
            return false;
        }
        self.order.retain(|&n| tree.parent(n) != Some(group));
        true
    }

    /// Forgets `id` and its children before the node is removed from `tree`.
    pub(crate) fn forget(&mut self, tree: &ItemTree, id: NodeId) {
        self.deselect(tree, id);
        self.forget_children(tree, id);
    }

    /// Forgets the children of `id` before they are dropped from `tree`.
    pub(crate) fn forget_children(&mut self, tree: &ItemTree, id: NodeId) {
        if self.drop_group(id).is_some() {
            self.order.retain(|&n| tree.parent(n) != Some(id));
        }
    }

    /// Drops the selection of everything `tree` no longer holds.
    pub(crate) fn retain_live(&mut self, tree: &ItemTree) {
        self.order.retain(|&n| tree.contains(n));
        let dead: Vec<NodeId> = self
            .group_keys
            .iter()
            .copied()
            .filter(|&g| !tree.contains(g))
            .collect();
        for group in dead {
            self.drop_group(group);
        }
    }

    /// Keeps positions aligned after a sibling was removed at `index`.
    pub(crate) fn on_removed(&mut self, parent: Option<NodeId>, index: usize) {
        match parent {
            None => self.roots.remove_at(index),
            Some(p) => {
                if let Some(bits) = self.groups.get_mut(p) {
                    bits.remove_at(index);
                }
            }
        }
    }

    /// Keeps positions aligned after a sibling was inserted at `index`.
    pub(crate) fn on_inserted(&mut self, parent: Option<NodeId>, index: usize) {
        match parent {
            None => self.roots.insert_at(index),
            Some(p) => {
                if let Some(bits) = self.groups.get_mut(p) {
                    bits.insert_at(index);
                }
            }
        }
    }

    /// Truncation of a sibling list to `count` entries.
    pub(crate) fn on_truncated(&mut self, tree: &ItemTree, parent: Option<NodeId>, count: usize) {
        let bits = match parent {
            None => &mut self.roots,
            Some(p) => match self.groups.get_mut(p) {
                Some(bits) => bits,
                None => return,
            },
        };
        let keep: Vec<usize> = bits.positions().into_iter().filter(|&p| p < count).collect();
        bits.clear();
        for p in keep {
            bits.insert(p);
        }
        self.order.retain(|&n| tree.contains(n));
    }

    pub(crate) fn clear(&mut self) {
        self.roots = SelectionBits::new();
        self.groups.clear();
        self.group_keys.clear();
        self.order.clear();
    }
}
