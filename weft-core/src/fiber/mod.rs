//! Fiber Tree
//!
//! A fiber mirrors one node for the duration of one render pass. The tree of
//! fibers is what the work loop walks, what the diff annotates, and what the
//! commit applies.
//!
//! # Two Trees
//!
//! The renderer keeps exactly one committed tree and builds at most one new
//! tree at a time. Every fiber of the new tree that reuses a position of the
//! committed tree records the committed fiber's id in `previous` and carries
//! its native handle and hook records forward. The committed tree is never
//! mutated; once the new tree commits it replaces the old one wholesale.
//!
//! # Effect Lists
//!
//! Each fiber accumulates the effects of its subtree in document order:
//! its own `Place` or `Update`, the removals recorded while diffing its
//! children, then the lists of its children, left to right. When the root
//! completes its list is the whole commit.

mod diff;
mod tree;
mod unit;

pub use diff::{classify, DiffStats};
pub use tree::{Children, FiberTree, Preorder};
pub use unit::{EffectEntry, EffectTag, Fiber, FiberId, WorkState};

pub(crate) use diff::reconcile_children;
