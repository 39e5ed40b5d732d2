//! Deferred creation and population of groups and items.
//!
//! A group goes `UNINITIALIZED -> PLACEHOLDER -> MATERIALIZED`. Placeholders carry an estimated
//! child count and are replaced by real content the first time they are about to be drawn or
//! indexed into. Layout compensation for that transition lives in [`crate::Gallery`]; this module
//! owns the node-level state machine.

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::error::FetchError;
use crate::tree::{FetchState, ItemTree, NodeId};
use crate::{ItemDescriptor, ItemKey};

/// Identifies one fetch. A result whose ticket no longer matches the group is discarded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FetchTicket {
    pub node: NodeId,
    pub version: u32,
}

/// Sent to a [`ContentSource`] when a group needs its children.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FetchRequest {
    pub ticket: FetchTicket,
    pub group: ItemKey,
    /// Position of the group among the roots.
    pub index: usize,
}

/// What a content source answered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    /// All children, created eagerly.
    Ready(Vec<ItemDescriptor>),
    /// The real child count. Children are described lazily through
    /// [`ContentSource::describe_item`] when first addressed.
    Count(usize),
    /// The answer arrives later through [`crate::Gallery::complete_fetch`].
    Pending,
}

/// Provides groups and their children on demand.
///
/// Keys default to positions. Hosts that look nodes up by key should describe real keys.
pub trait ContentSource {
    fn describe_group(&mut self, index: usize) -> ItemDescriptor {
        ItemDescriptor::new(index as ItemKey)
    }

    fn describe_item(&mut self, group: ItemKey, index: usize) -> ItemDescriptor {
        let _ = group;
        ItemDescriptor::new(index as ItemKey)
    }

    fn fetch_children(&mut self, request: &FetchRequest) -> Result<FetchOutcome, FetchError>;
}

impl<F> ContentSource for F
where
    F: FnMut(&FetchRequest) -> Result<FetchOutcome, FetchError>,
{
    fn fetch_children(&mut self, request: &FetchRequest) -> Result<FetchOutcome, FetchError> {
        self(request)
    }
}

pub(crate) type BoxedSource = Option<Box<dyn ContentSource>>;

/// Result of a materialization step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Materialized {
    /// Real content is in place.
    Ready { previous: usize, count: usize },
    /// Waiting for [`crate::Gallery::complete_fetch`].
    Pending(FetchTicket),
    /// The source failed. The placeholder is left as it was.
    Failed(FetchError),
    /// A late or stale result was dropped.
    Discarded,
    /// Nothing to do: already materialized, or a fetch is in flight or has failed.
    Unchanged,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VirtualConfig {
    /// Create nodes only when they are first addressed.
    pub virtual_items: bool,
    /// Start groups as placeholders and fetch them when they become visible.
    pub virtual_groups: bool,
    /// Estimated child count of a placeholder.
    pub placeholder_item_count: usize,
    /// Materializing a group first materializes every group before it.
    pub compatibility_mode: bool,
}

impl Default for VirtualConfig {
    fn default() -> Self {
        Self {
            virtual_items: false,
            virtual_groups: false,
            placeholder_item_count: 10,
            compatibility_mode: false,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct VirtualizationController {
    config: VirtualConfig,
    /// Scroll location to restore after the next materialization, instead of shifting.
    position_when_updated: Option<f64>,
}

impl VirtualizationController {
    pub fn new(config: VirtualConfig) -> Self {
        Self {
            config,
            position_when_updated: None,
        }
    }

    pub fn config(&self) -> &VirtualConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: VirtualConfig) {
        self.config = config;
    }

    /// Requests that the next materialization restores `location` instead of compensating the
    /// scroll offset by the size delta.
    pub fn keep_position(&mut self, location: Option<f64>) {
        self.position_when_updated = location;
    }

    pub(crate) fn take_position(&mut self) -> Option<f64> {
        self.position_when_updated.take()
    }

    /// Creates the group at `index` if its slot is empty.
    ///
    /// With virtual groups the new node is an expanded placeholder holding
    /// `placeholder_item_count` empty slots. Otherwise it is left unmaterialized (when a source
    /// exists) and the caller fetches it right away.
    pub(crate) fn ensure_group(
        &self,
        tree: &mut ItemTree,
        source: &mut BoxedSource,
        index: usize,
    ) -> Option<NodeId> {
        if let Some(id) = tree.root(index) {
            return Some(id);
        }
        if index >= tree.root_count() {
            return None;
        }
        let descriptor = match source.as_mut() {
            Some(source) => source.describe_group(index),
            None => ItemDescriptor::new(index as ItemKey),
        };
        let id = tree.create(None, index, descriptor)?;
        let node = tree.get_mut(id)?;
        // Without a source a plain group has nothing to fetch and starts empty.
        node.materialized = source.is_none() && !self.config.virtual_groups;
        if self.config.virtual_groups {
            node.placeholder = true;
            node.expanded = true;
            node.expand_ratio = 1.0;
            tree.set_slot_count(Some(id), self.config.placeholder_item_count);
        }
        gtrace!(index, placeholder = self.config.virtual_groups, "ensure_group");
        Some(id)
    }

    /// Creates child `index` of `group` if its slot is empty. Placeholders have no addressable
    /// children; they must be materialized first.
    pub(crate) fn ensure_child(
        &self,
        tree: &mut ItemTree,
        source: &mut BoxedSource,
        group: NodeId,
        index: usize,
    ) -> Option<NodeId> {
        let node = tree.get(group)?;
        if let Some(id) = node.child(index) {
            return Some(id);
        }
        if node.placeholder || index >= node.child_count() {
            return None;
        }
        let key = node.key;
        let descriptor = match source.as_mut() {
            Some(source) => source.describe_item(key, index),
            None => ItemDescriptor::new(index as ItemKey),
        };
        tree.create(Some(group), index, descriptor)
    }

    /// Asks the source for the children of `group`.
    pub(crate) fn materialize(
        &self,
        tree: &mut ItemTree,
        source: &mut BoxedSource,
        group: NodeId,
    ) -> Materialized {
        let Some(node) = tree.get(group) else {
            return Materialized::Discarded;
        };
        if (node.materialized && !node.placeholder) || node.fetch != FetchState::Idle {
            return Materialized::Unchanged;
        }
        let request = FetchRequest {
            ticket: FetchTicket {
                node: group,
                version: node.version,
            },
            group: node.key,
            index: node.index,
        };
        let result = match source.as_mut() {
            Some(source) => source.fetch_children(&request),
            None => Err(FetchError::Unavailable { group: request.group }),
        };
        gdebug!(group = request.group, index = request.index, "fetch_children");
        apply(tree, request.ticket, result)
    }

    /// Applies an asynchronous fetch result. Results for removed or cleared groups, and
    /// duplicates, are discarded.
    pub(crate) fn complete(
        &self,
        tree: &mut ItemTree,
        ticket: FetchTicket,
        result: Result<FetchOutcome, FetchError>,
    ) -> Materialized {
        let live = tree
            .get(ticket.node)
            .is_some_and(|n| n.version == ticket.version && n.fetch == FetchState::Pending);
        if !live {
            gdebug!(version = ticket.version, "discarding late fetch result");
            return Materialized::Discarded;
        }
        if matches!(result, Ok(FetchOutcome::Pending)) {
            return Materialized::Pending(ticket);
        }
        apply(tree, ticket, result)
    }
}

fn apply(
    tree: &mut ItemTree,
    ticket: FetchTicket,
    result: Result<FetchOutcome, FetchError>,
) -> Materialized {
    let group = ticket.node;
    let Some(node) = tree.get_mut(group) else {
        return Materialized::Discarded;
    };
    let previous = node.child_count();
    let descriptors = match result {
        Ok(FetchOutcome::Pending) => {
            node.fetch = FetchState::Pending;
            return Materialized::Pending(ticket);
        }
        Err(err) => {
            node.fetch = FetchState::Failed;
            gwarn!(group = node.key, error = %err, "content source failed");
            return Materialized::Failed(err);
        }
        Ok(FetchOutcome::Count(count)) => {
            tree.set_slot_count(Some(group), 0);
            tree.set_slot_count(Some(group), count);
            None
        }
        Ok(FetchOutcome::Ready(descriptors)) => {
            tree.set_slot_count(Some(group), 0);
            tree.set_slot_count(Some(group), descriptors.len());
            Some(descriptors)
        }
    };
    if let Some(descriptors) = descriptors {
        for (index, descriptor) in descriptors.into_iter().enumerate() {
            tree.create(Some(group), index, descriptor);
        }
    }
    let Some(node) = tree.get_mut(group) else {
        return Materialized::Discarded;
    };
    node.placeholder = false;
    node.materialized = true;
    node.fetch = FetchState::Idle;
    Materialized::Ready {
        previous,
        count: node.child_count(),
    }
}
