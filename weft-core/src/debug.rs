//! Tree Snapshots
//!
//! A [`TreeSnapshot`] is a plain, serializable copy of a committed fiber
//! tree. Handlers are rendered as a marker string; native handles are not
//! included.

use serde::Serialize;

use crate::fiber::{EffectTag, FiberId, FiberTree};
use crate::node::{Attributes, NodeKind};

/// What a snapshot node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotKind {
    /// Text leaf.
    Text,
    /// Native element.
    Element,
    /// Function component.
    Component,
}

/// One node of a committed tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeSnapshot {
    /// Node kind.
    pub kind: SnapshotKind,
    /// Tag, component name, or `#text`.
    pub name: String,
    /// Text content of a text node.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Attributes or props.
    #[serde(skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
    /// Effect tag of the pass that committed this fiber.
    pub effect: EffectTag,
    /// Number of hook records.
    #[serde(skip_serializing_if = "is_zero")]
    pub hooks: usize,
    /// Children in order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeSnapshot>,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

impl TreeSnapshot {
    /// Snapshot the mounted content of `tree`, below its root fiber.
    pub fn capture<H>(tree: &FiberTree<H>) -> Option<Self> {
        tree.children(tree.root()).next().map(|id| Self::from_fiber(tree, id))
    }

    fn from_fiber<H>(tree: &FiberTree<H>, id: FiberId) -> Self {
        let fiber = &tree[id];
        let node = fiber.node();
        let kind = match node.kind() {
            NodeKind::Text(_) => SnapshotKind::Text,
            NodeKind::Intrinsic(_) => SnapshotKind::Element,
            NodeKind::Component(_) => SnapshotKind::Component,
        };
        Self {
            kind,
            name: node.kind().label().to_owned(),
            text: node.text().map(str::to_owned),
            attributes: node.attributes().clone(),
            effect: fiber.effect_tag(),
            hooks: fiber.hook_count(),
            children: tree
                .children(id)
                .map(|child| Self::from_fiber(tree, child))
                .collect(),
        }
    }

    /// Number of nodes in this subtree.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(TreeSnapshot::size).sum::<usize>()
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
