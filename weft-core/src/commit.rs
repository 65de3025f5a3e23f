//! Commit Phase
//!
//! Applies the effect list of a completed pass to the target adapter. This
//! is the only place the engine mutates the target, and it runs in one
//! uninterrupted step: the work loop never yields in the middle of a
//! commit.
//!
//! # Ordering
//!
//! The effect list is in document order, so a parent's handle is created
//! before any of its children are attached, and siblings are attached left
//! to right. A parent's removals precede its children's entries, which
//! keeps host indices stable when a middle child is replaced.

use std::time::Duration;

use serde::Serialize;

use crate::adapter::{Element, TargetAdapter};
use crate::error::{RenderError, Result};
use crate::fiber::{EffectEntry, FiberId, FiberTree};
use crate::node::NodeKind;

/// What one commit did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CommitSummary {
    /// Sequence number of the committed pass.
    pub pass: u64,
    /// `Place` entries applied.
    pub placed: usize,
    /// `Update` entries applied.
    pub updated: usize,
    /// `Remove` entries applied.
    pub removed: usize,
    /// Units of work the pass performed.
    pub units: usize,
    /// Time spent building the fiber tree, summed over slices.
    pub render_time: Duration,
    /// Time spent applying the effect list.
    pub commit_time: Duration,
}

impl CommitSummary {
    /// Total number of entries applied.
    pub fn total(&self) -> usize {
        self.placed + self.updated + self.removed
    }

    /// Whether the commit left the target untouched.
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Apply `effects` to the target.
///
/// `Place` and `Update` entries refer to `tree`; `Remove` entries refer to
/// `previous`. Handles created here are stored on `tree`.
pub(crate) fn apply<A: TargetAdapter>(
    adapter: &mut A,
    tree: &mut FiberTree<A::Handle>,
    previous: Option<&FiberTree<A::Handle>>,
    effects: &[EffectEntry],
    summary: &mut CommitSummary,
) -> Result<()> {
    // Host positions depend only on the shape of `tree`, which the commit
    // does not change.
    let mut host_indices = None;
    for &entry in effects {
        match entry {
            EffectEntry::Place(id) => {
                let indices = host_indices.get_or_insert_with(|| tree.host_indices());
                let index = indices.get(id.index()).copied().unwrap_or(0);
                place(adapter, tree, id, index)?;
                summary.placed += 1;
            }
            EffectEntry::Update(id) => {
                update(adapter, tree, id)?;
                summary.updated += 1;
            }
            EffectEntry::Remove(id) => {
                let old = previous.ok_or(RenderError::MissingHandle { fiber: id.index() })?;
                remove(adapter, old, id)?;
                summary.removed += 1;
            }
        }
    }
    Ok(())
}

fn place<A: TargetAdapter>(
    adapter: &mut A,
    tree: &mut FiberTree<A::Handle>,
    id: FiberId,
    index: usize,
) -> Result<()> {
    let node = tree[id].node().clone();
    let handle = match node.kind() {
        NodeKind::Component(_) => return Ok(()),
        NodeKind::Text(text) => adapter.create_text_handle(text)?,
        NodeKind::Intrinsic(tag) => adapter.create_handle(&Element::new(tag, node.attributes()))?,
    };

    let parent = tree
        .host_parent(id)
        .and_then(|parent| tree[parent].native().cloned())
        .ok_or(RenderError::MissingHandle { fiber: id.index() })?;

    tracing::trace!(fiber = id.index(), kind = node.kind().label(), index, "place");
    adapter.attach_child(&parent, &handle, index)?;
    tree[id].native = Some(handle);
    Ok(())
}

fn update<A: TargetAdapter>(adapter: &mut A, tree: &FiberTree<A::Handle>, id: FiberId) -> Result<()> {
    let fiber = &tree[id];
    let node = fiber.node();
    if node.is_component() {
        return Ok(());
    }
    let handle = fiber
        .native()
        .ok_or(RenderError::MissingHandle { fiber: id.index() })?;

    tracing::trace!(fiber = id.index(), kind = node.kind().label(), "update");
    match node.kind() {
        NodeKind::Text(text) => adapter.set_text(handle, text)?,
        NodeKind::Intrinsic(tag) => adapter.sync_attributes(handle, &Element::new(tag, node.attributes()))?,
        NodeKind::Component(_) => {}
    }
    Ok(())
}

fn remove<A: TargetAdapter>(adapter: &mut A, old: &FiberTree<A::Handle>, id: FiberId) -> Result<()> {
    for host in old.host_roots(id) {
        let handle = old[host]
            .native()
            .ok_or(RenderError::MissingHandle { fiber: host.index() })?;
        tracing::trace!(fiber = host.index(), kind = old[host].node().kind().label(), "remove");
        adapter.detach(handle)?;
    }
    Ok(())
}

/// Detach everything a committed tree placed under its container.
pub(crate) fn unmount<A: TargetAdapter>(adapter: &mut A, tree: &FiberTree<A::Handle>) -> Result<usize> {
    let mut detached = 0;
    for child in tree.children(tree.root()) {
        remove(adapter, tree, child)?;
        detached += 1;
    }
    Ok(detached)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fiber::{EffectTag, Fiber};
    use crate::memory::MemoryTarget;
    use crate::node::{element, text, Node};

    fn append(tree: &mut FiberTree<crate::memory::MemHandle>, parent: FiberId, node: Node) -> FiberId {
        let last = tree.children(parent).last();
        let id = tree.push(Fiber::new(node, Some(parent), EffectTag::Place, None));
        match last {
            Some(last) => tree[last].next_sibling = Some(id),
            None => tree[parent].first_child = Some(id),
        }
        id
    }

    #[test]
    fn places_parents_before_children() {
        let mut target = MemoryTarget::new();
        let container = target.create_container("app");
        let mut tree = FiberTree::with_root(Node::root(text("")), container, None);
        let root = tree.root();
        let ul = append(&mut tree, root, element("ul").build());
        let a = append(&mut tree, ul, element("li").child("a").build());
        let a_text = append(&mut tree, a, text("a"));
        let b = append(&mut tree, ul, element("li").build());

        let effects = [
            EffectEntry::Place(ul),
            EffectEntry::Place(a),
            EffectEntry::Place(a_text),
            EffectEntry::Place(b),
        ];
        let mut summary = CommitSummary::default();
        apply(&mut target, &mut tree, None, &effects, &mut summary).unwrap();

        assert_eq!(summary.placed, 4);
        assert_eq!(target.markup(&container), "<app><ul><li>a</li><li></li></ul></app>");
        assert!(tree[b].native().is_some());
    }

    #[test]
    fn missing_parent_handle_is_reported() {
        let mut target = MemoryTarget::new();
        let container = target.create_container("app");
        let mut tree = FiberTree::with_root(Node::root(text("")), container, None);
        let root = tree.root();
        let div = append(&mut tree, root, element("div").build());
        let span = append(&mut tree, div, element("span").build());

        let mut summary = CommitSummary::default();
        let err = apply(&mut target, &mut tree, None, &[EffectEntry::Place(span)], &mut summary)
            .unwrap_err();
        assert_eq!(err, RenderError::MissingHandle { fiber: span.index() });
    }

    #[test]
    fn summary_totals() {
        let summary = CommitSummary {
            placed: 2,
            updated: 1,
            removed: 3,
            ..CommitSummary::default()
        };
        assert_eq!(summary.total(), 6);
        assert!(!summary.is_empty());
        assert!(CommitSummary::default().is_empty());
    }
}
