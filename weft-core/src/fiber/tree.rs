//! Fiber Tree
//!
//! The fibers of one pass live in a flat arena indexed by [`FiberId`].
//! Parent, child and sibling links are plain ids, which lets the work loop
//! walk the tree step by step and stop anywhere without a call stack to
//! unwind.
//!
//! A new pass owns its own arena outright. The previous committed arena is
//! only ever read: fibers refer to it through `previous` ids.

use std::ops::{Index, IndexMut};

use super::unit::{EffectEntry, EffectTag, Fiber, FiberId};
use crate::node::Node;

/// Arena of the fibers built in one pass.
pub struct FiberTree<H> {
    fibers: Vec<Fiber<H>>,
    root: FiberId,
}

impl<H> FiberTree<H> {
    /// Create a tree whose root fiber stands for the render container.
    ///
    /// The root is always `Unchanged`: its handle is the container, which
    /// the engine neither creates nor removes.
    pub(crate) fn with_root(node: Node, container: H, previous: Option<FiberId>) -> Self {
        let mut root = Fiber::new(node, None, EffectTag::Unchanged, previous);
        root.native = Some(container);
        Self {
            fibers: vec![root],
            root: FiberId::from_index(0),
        }
    }

    /// Add a fiber and return its id.
    pub(crate) fn push(&mut self, fiber: Fiber<H>) -> FiberId {
        let id = FiberId::from_index(self.fibers.len());
        self.fibers.push(fiber);
        id
    }

    /// The root fiber.
    pub fn root(&self) -> FiberId {
        self.root
    }

    /// Look up a fiber.
    pub fn get(&self, id: FiberId) -> Option<&Fiber<H>> {
        self.fibers.get(id.index())
    }

    /// Number of fibers in the tree.
    pub fn len(&self) -> usize {
        self.fibers.len()
    }

    /// Whether the tree holds no fibers besides the root.
    pub fn is_empty(&self) -> bool {
        self.fibers.len() <= 1
    }

    /// Iterate over the direct children of `id`, left to right.
    pub fn children(&self, id: FiberId) -> Children<'_, H> {
        Children {
            tree: self,
            cursor: self[id].first_child,
        }
    }

    /// Iterate over the whole tree in document (pre-)order.
    pub fn preorder(&self) -> Preorder<'_, H> {
        Preorder {
            tree: self,
            stack: vec![self.root],
        }
    }

    /// Move the pending effect list out of a fiber.
    pub(crate) fn take_effects(&mut self, id: FiberId) -> Vec<EffectEntry> {
        std::mem::take(&mut self[id].effects)
    }

    /// Mark every hook record of the tree as belonging to a committed fiber.
    pub(crate) fn mark_hooks_committed(&self) {
        for fiber in &self.fibers {
            for slot in &fiber.hooks {
                slot.mark_committed();
            }
        }
    }

    /// Nearest ancestor that owns a native handle.
    pub fn host_parent(&self, id: FiberId) -> Option<FiberId> {
        let mut cursor = self[id].parent;
        while let Some(parent) = cursor {
            if self[parent].is_host() {
                return Some(parent);
            }
            cursor = self[parent].parent;
        }
        None
    }

    /// Position of every host fiber's handle among the handles of its host
    /// parent, indexed by [`FiberId::index`]: the number of host fibers
    /// before it under that parent, looking through component fibers.
    ///
    /// Entries of component fibers and of the root are zero.
    pub fn host_indices(&self) -> Vec<usize> {
        let mut indices = vec![0; self.fibers.len()];
        self.assign_host_indices(self.root, &mut 0, &mut indices);
        indices
    }

    fn assign_host_indices(&self, id: FiberId, next: &mut usize, indices: &mut [usize]) {
        let mut cursor = self[id].first_child;
        while let Some(child) = cursor {
            if self[child].is_host() {
                indices[child.index()] = *next;
                *next += 1;
                self.assign_host_indices(child, &mut 0, indices);
            } else {
                self.assign_host_indices(child, next, indices);
            }
            cursor = self[child].next_sibling;
        }
    }

    /// The outermost host fibers at or below `id`: `id` itself for a host
    /// fiber, the nearest host descendants for a component.
    pub fn host_roots(&self, id: FiberId) -> Vec<FiberId> {
        let mut roots = Vec::new();
        self.collect_host_roots(id, &mut roots);
        roots
    }

    fn collect_host_roots(&self, id: FiberId, roots: &mut Vec<FiberId>) {
        if self[id].is_host() {
            roots.push(id);
            return;
        }
        let mut cursor = self[id].first_child;
        while let Some(child) = cursor {
            self.collect_host_roots(child, roots);
            cursor = self[child].next_sibling;
        }
    }
}

impl<H> Index<FiberId> for FiberTree<H> {
    type Output = Fiber<H>;

    fn index(&self, id: FiberId) -> &Self::Output {
        &self.fibers[id.index()]
    }
}

impl<H> IndexMut<FiberId> for FiberTree<H> {
    fn index_mut(&mut self, id: FiberId) -> &mut Self::Output {
        &mut self.fibers[id.index()]
    }
}

impl<H: std::fmt::Debug> std::fmt::Debug for FiberTree<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FiberTree")
            .field("root", &self.root)
            .field("fibers", &self.fibers)
            .finish()
    }
}

/// Iterator over the children of a fiber.
#[derive(Debug)]
pub struct Children<'a, H> {
    tree: &'a FiberTree<H>,
    cursor: Option<FiberId>,
}

impl<H> Iterator for Children<'_, H> {
    type Item = FiberId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cursor?;
        self.cursor = self.tree[id].next_sibling;
        Some(id)
    }
}

/// Document-order iterator over a fiber tree.
#[derive(Debug)]
pub struct Preorder<'a, H> {
    tree: &'a FiberTree<H>,
    stack: Vec<FiberId>,
}

impl<H> Iterator for Preorder<'_, H> {
    type Item = FiberId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let start = self.stack.len();
        self.stack.extend(self.tree.children(id));
        self.stack[start..].reverse();
        Some(id)
    }
}
