//! Child Diffing
//!
//! Reconciles the children of one fiber against the children of the fiber
//! it replaces.
//!
//! # Algorithm
//!
//! Both child lists are walked in lockstep by index. At every position:
//!
//! 1. Different kind (tag, text vs. element, component function): the new
//!    child is `Place`d and the old one is `Remove`d.
//! 2. Same kind and equal content: `Unchanged`; the handle and hooks are
//!    carried forward.
//! 3. Same kind, different content: `Update`; the handle and hooks are
//!    carried forward and attributes are re-applied at commit.
//!
//! Old children past the end of the new list are removed, new children
//! past the end of the old list are placed.
//!
//! There are no keys and no move detection. Inserting or reordering in the
//! middle of a list rewrites the tail from that point; this is O(n) per
//! level and fine for mostly stable trees.

use super::tree::FiberTree;
use super::unit::{EffectEntry, EffectTag, Fiber, FiberId};
use crate::node::Node;

/// Classify a new node against the node it would replace.
///
/// Returns `Place` when the kinds differ; the caller is responsible for
/// removing the old fiber in that case.
pub fn classify(old: &Node, new: &Node) -> EffectTag {
    if !old.same_kind(new) {
        EffectTag::Place
    } else if old.same_content(new) {
        EffectTag::Unchanged
    } else {
        EffectTag::Update
    }
}

/// Counts of one reconciliation, for tracing.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DiffStats {
    /// Positions classified `Unchanged`.
    pub unchanged: usize,
    /// Positions classified `Update`.
    pub updated: usize,
    /// New fibers `Place`d.
    pub placed: usize,
    /// Old fibers `Remove`d.
    pub removed: usize,
}

/// Create fibers for `children` under `parent`, diffed against the children
/// of `parent`'s previous fiber in `previous`.
///
/// Removals are recorded on `parent`'s effect list. The new children record
/// their own `Place`/`Update` entry when the work loop enters them, which
/// keeps every list in document order.
pub(crate) fn reconcile_children<H: Clone>(
    tree: &mut FiberTree<H>,
    parent: FiberId,
    children: &[Node],
    previous: Option<&FiberTree<H>>,
) -> DiffStats {
    let mut stats = DiffStats::default();

    let mut old_child = match (tree[parent].previous(), previous) {
        (Some(old_parent), Some(old_tree)) => old_tree[old_parent].first_child(),
        _ => None,
    };
    let mut last_new: Option<FiberId> = None;

    for node in children {
        let (tag, carried) = match (old_child, previous) {
            (Some(old), Some(old_tree)) => {
                let old_fiber = &old_tree[old];
                match classify(old_fiber.node(), node) {
                    EffectTag::Place => {
                        tree[parent].effects.push(EffectEntry::Remove(old));
                        stats.removed += 1;
                        (EffectTag::Place, None)
                    }
                    tag => (tag, Some(old)),
                }
            }
            _ => (EffectTag::Place, None),
        };

        let mut fiber = Fiber::new(node.clone(), Some(parent), tag, carried);
        if let (Some(old), Some(old_tree)) = (carried, previous) {
            fiber.native = old_tree[old].native().cloned();
        }

        match tag {
            EffectTag::Unchanged => stats.unchanged += 1,
            EffectTag::Update => stats.updated += 1,
            EffectTag::Place => stats.placed += 1,
            EffectTag::Remove => {}
        }

        let id = tree.push(fiber);
        match last_new {
            Some(prev) => tree[prev].next_sibling = Some(id),
            None => tree[parent].first_child = Some(id),
        }
        last_new = Some(id);

        old_child = match (old_child, previous) {
            (Some(old), Some(old_tree)) => old_tree[old].next_sibling(),
            _ => None,
        };
    }

    // Trailing old children have no counterpart.
    while let (Some(old), Some(old_tree)) = (old_child, previous) {
        tree[parent].effects.push(EffectEntry::Remove(old));
        stats.removed += 1;
        old_child = old_tree[old].next_sibling();
    }

    stats
}
