//! Fibers
//!
//! This module defines the unit of work that lives in a fiber tree.

use serde::Serialize;

use crate::hooks::HookSlot;
use crate::node::Node;

/// Index of a fiber within the tree of one pass.
///
/// Ids are only meaningful together with the tree they came from. A fiber's
/// `previous` id points into the last committed tree, never into its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FiberId(u32);

impl FiberId {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(u32::try_from(index).unwrap_or(u32::MAX))
    }

    /// Position in the owning tree's storage.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Diff result of a fiber, set once per pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EffectTag {
    /// Same kind and attributes as the previous fiber. The native handle is
    /// reused and nothing is applied to the target.
    Unchanged,

    /// Same kind, different attributes. The native handle is reused and the
    /// attributes are re-applied at commit.
    Update,

    /// New position or different kind. A native handle is created at commit.
    Place,

    /// A previous fiber with no counterpart in the new tree.
    Remove,
}

/// Progress of a fiber through the work loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkState {
    /// Not visited yet in this pass.
    NotStarted,

    /// Children produced; waiting for them to complete.
    Entered,

    /// This fiber and its whole subtree are done.
    Complete,
}

/// One instruction in an effect list.
///
/// `Place` and `Update` refer to fibers of the tree being built. `Remove`
/// refers to a fiber of the previously committed tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EffectEntry {
    /// Create and attach the fiber's native handle.
    Place(FiberId),
    /// Re-apply attributes to the fiber's carried-over handle.
    Update(FiberId),
    /// Detach the previous fiber's handles.
    Remove(FiberId),
}

/// A mutable work unit mirroring one node for one pass.
pub struct Fiber<H> {
    /// The node this fiber renders.
    node: Node,

    /// Structural links. The parent owns its children's existence; the
    /// sibling and parent links are only used to walk the tree.
    pub(crate) parent: Option<FiberId>,
    pub(crate) first_child: Option<FiberId>,
    pub(crate) next_sibling: Option<FiberId>,

    /// Hook records, carried forward from `previous`.
    pub(crate) hooks: Vec<HookSlot>,

    /// Diff result.
    effect_tag: EffectTag,

    /// Fiber of the last committed tree at the same logical position.
    previous: Option<FiberId>,

    /// Native handle, carried forward or created at commit.
    pub(crate) native: Option<H>,

    /// Work loop progress.
    pub(crate) state: WorkState,

    /// Pending effects of this subtree, in document order.
    pub(crate) effects: Vec<EffectEntry>,
}

impl<H> Fiber<H> {
    /// Create a fiber that has not been visited yet.
    pub(crate) fn new(
        node: Node,
        parent: Option<FiberId>,
        effect_tag: EffectTag,
        previous: Option<FiberId>,
    ) -> Self {
        Self {
            node,
            parent,
            first_child: None,
            next_sibling: None,
            hooks: Vec::new(),
            effect_tag,
            previous,
            native: None,
            state: WorkState::NotStarted,
            effects: Vec::new(),
        }
    }

    /// The node this fiber renders.
    pub fn node(&self) -> &Node {
        &self.node
    }

    /// Parent fiber.
    pub fn parent(&self) -> Option<FiberId> {
        self.parent
    }

    /// First child fiber.
    pub fn first_child(&self) -> Option<FiberId> {
        self.first_child
    }

    /// Next sibling fiber.
    pub fn next_sibling(&self) -> Option<FiberId> {
        self.next_sibling
    }

    /// Diff result of this pass.
    pub fn effect_tag(&self) -> EffectTag {
        self.effect_tag
    }

    /// Matching fiber of the last committed tree.
    pub fn previous(&self) -> Option<FiberId> {
        self.previous
    }

    /// Native handle, if one exists yet.
    pub fn native(&self) -> Option<&H> {
        self.native.as_ref()
    }

    /// Work loop progress.
    pub fn state(&self) -> WorkState {
        self.state
    }

    /// Number of hook records.
    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    /// Whether this fiber owns a native handle (element or text).
    pub fn is_host(&self) -> bool {
        self.node.is_host()
    }

    /// Whether this fiber renders a component.
    pub fn is_component(&self) -> bool {
        self.node.is_component()
    }

    /// Effects accumulated so far for this subtree.
    pub fn effects(&self) -> &[EffectEntry] {
        &self.effects
    }
}

impl<H: std::fmt::Debug> std::fmt::Debug for Fiber<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fiber")
            .field("kind", &self.node.kind().label())
            .field("effect_tag", &self.effect_tag)
            .field("state", &self.state)
            .field("parent", &self.parent)
            .field("first_child", &self.first_child)
            .field("next_sibling", &self.next_sibling)
            .field("previous", &self.previous)
            .field("native", &self.native)
            .field("hooks", &self.hooks.len())
            .finish()
    }
}
