//! In-Memory Target
//!
//! [`MemoryTarget`] is a complete [`TargetAdapter`] that keeps its native
//! nodes in a plain arena. It records every operation it receives, which
//! makes it the adapter of choice for tests and for hosts that want to
//! inspect what a commit would do.
//!
//! ```rust,ignore
//! let mut target = MemoryTarget::new();
//! let container = target.create_container("app");
//! let mut renderer = Renderer::new(target);
//! renderer.render(element("p").child("hi").build(), container)?;
//! renderer.flush()?;
//! assert_eq!(renderer.adapter().markup(&container), "<app><p>hi</p></app>");
//! ```

use std::collections::HashSet;
use std::fmt::Write as _;

use indexmap::IndexMap;
use serde::Serialize;

use crate::adapter::{AdapterError, Element, TargetAdapter};
use crate::node::{Handler, Value};

/// Handle of a node in a [`MemoryTarget`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MemHandle(usize);

impl MemHandle {
    /// Raw arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

/// One operation received from the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Op {
    /// An element was created.
    Create {
        /// New handle.
        handle: MemHandle,
        /// Its tag.
        tag: String,
    },
    /// A text node was created.
    CreateText {
        /// New handle.
        handle: MemHandle,
        /// Its content.
        text: String,
    },
    /// Attributes were re-applied.
    Sync {
        /// Target handle.
        handle: MemHandle,
    },
    /// Text content was replaced.
    SetText {
        /// Target handle.
        handle: MemHandle,
        /// New content.
        text: String,
    },
    /// A child was attached.
    Attach {
        /// Parent handle.
        parent: MemHandle,
        /// Attached handle.
        child: MemHandle,
        /// Requested position.
        index: usize,
    },
    /// A handle was detached.
    Detach {
        /// Detached handle.
        handle: MemHandle,
    },
}

#[derive(Debug, Default)]
struct MemNode {
    tag: String,
    text: Option<String>,
    properties: IndexMap<String, Value>,
    styles: IndexMap<String, String>,
    classes: Vec<String>,
    handlers: IndexMap<String, Handler>,
    children: Vec<MemHandle>,
    parent: Option<MemHandle>,
}

/// An adapter whose target is an in-memory node arena.
#[derive(Debug, Default)]
pub struct MemoryTarget {
    nodes: Vec<MemNode>,
    ops: Vec<Op>,
    rejected: HashSet<String>,
}

impl MemoryTarget {
    /// Create an empty target.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached element to render into. Not recorded as an op.
    pub fn create_container(&mut self, tag: &str) -> MemHandle {
        self.alloc(MemNode {
            tag: tag.to_owned(),
            ..MemNode::default()
        })
    }

    /// Make `create_handle` fail for `tag`.
    pub fn reject_tag(&mut self, tag: impl Into<String>) {
        self.rejected.insert(tag.into());
    }

    /// Operations received so far.
    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    /// Forget the recorded operations.
    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    /// Current children of a handle.
    pub fn children(&self, handle: &MemHandle) -> &[MemHandle] {
        self.nodes
            .get(handle.0)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
    }

    /// Parent of a handle, if attached.
    pub fn parent(&self, handle: &MemHandle) -> Option<MemHandle> {
        self.nodes.get(handle.0).and_then(|node| node.parent)
    }

    /// Text content of a text handle.
    pub fn text(&self, handle: &MemHandle) -> Option<&str> {
        self.nodes.get(handle.0).and_then(|node| node.text.as_deref())
    }

    /// Tag of an element handle.
    pub fn tag(&self, handle: &MemHandle) -> Option<&str> {
        self.nodes
            .get(handle.0)
            .filter(|node| node.text.is_none())
            .map(|node| node.tag.as_str())
    }

    /// Current value of a plain property.
    pub fn property(&self, handle: &MemHandle, name: &str) -> Option<&Value> {
        self.nodes.get(handle.0).and_then(|node| node.properties.get(name))
    }

    /// Current value of an inline style declaration.
    pub fn style(&self, handle: &MemHandle, property: &str) -> Option<&str> {
        self.nodes
            .get(handle.0)
            .and_then(|node| node.styles.get(property))
            .map(String::as_str)
    }

    /// Current class names.
    pub fn classes(&self, handle: &MemHandle) -> &[String] {
        self.nodes
            .get(handle.0)
            .map(|node| node.classes.as_slice())
            .unwrap_or_default()
    }

    /// Invoke the handler registered under `event`. Returns whether one
    /// was found.
    pub fn dispatch(&self, handle: &MemHandle, event: &str) -> bool {
        let handler = self
            .nodes
            .get(handle.0)
            .and_then(|node| node.handlers.get(event))
            .cloned();
        match handler {
            Some(handler) => {
                handler.call();
                true
            }
            None => false,
        }
    }

    /// Find the first element with `tag` below `root`, depth first.
    pub fn find(&self, root: &MemHandle, tag: &str) -> Option<MemHandle> {
        self.children(root).iter().find_map(|child| {
            if self.tag(child) == Some(tag) {
                Some(*child)
            } else {
                self.find(child, tag)
            }
        })
    }

    /// HTML-like dump of the subtree at `handle`. Handlers are omitted.
    pub fn markup(&self, handle: &MemHandle) -> String {
        let mut out = String::new();
        self.write_markup(*handle, &mut out);
        out
    }

    fn write_markup(&self, handle: MemHandle, out: &mut String) {
        let Some(node) = self.nodes.get(handle.0) else {
            return;
        };
        if let Some(text) = &node.text {
            out.push_str(text);
            return;
        }

        let _ = write!(out, "<{}", node.tag);
        for (name, value) in &node.properties {
            let _ = write!(out, " {}=\"{}\"", name, value.to_display_string());
        }
        if !node.classes.is_empty() {
            let _ = write!(out, " class=\"{}\"", node.classes.join(" "));
        }
        if !node.styles.is_empty() {
            let styles: Vec<_> = node.styles.iter().map(|(k, v)| format!("{k}: {v}")).collect();
            let _ = write!(out, " style=\"{}\"", styles.join("; "));
        }
        out.push('>');
        for child in &node.children {
            self.write_markup(*child, out);
        }
        let _ = write!(out, "</{}>", node.tag);
    }

    fn alloc(&mut self, node: MemNode) -> MemHandle {
        let handle = MemHandle(self.nodes.len());
        self.nodes.push(node);
        handle
    }

    fn node_mut(&mut self, handle: &MemHandle) -> Result<&mut MemNode, AdapterError> {
        self.nodes
            .get_mut(handle.0)
            .ok_or_else(|| AdapterError::UnknownHandle(format!("{handle:?}")))
    }

    fn apply(node: &mut MemNode, element: &Element<'_>) {
        node.properties = element
            .properties()
            .map(|(name, value)| (name.to_owned(), value.clone()))
            .collect();
        node.styles = element
            .styles()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        node.classes = element.classes().map(str::to_owned).collect();
        node.handlers = element
            .handlers()
            .map(|(name, handler)| (name.to_owned(), handler.clone()))
            .collect();
    }

    fn unlink(&mut self, handle: MemHandle) {
        let parent = self.nodes.get_mut(handle.0).and_then(|node| node.parent.take());
        if let Some(parent) = parent.and_then(|parent| self.nodes.get_mut(parent.0)) {
            parent.children.retain(|child| *child != handle);
        }
    }
}

impl TargetAdapter for MemoryTarget {
    type Handle = MemHandle;

    fn create_handle(&mut self, element: &Element<'_>) -> Result<MemHandle, AdapterError> {
        if self.rejected.contains(element.tag()) {
            return Err(AdapterError::Create {
                tag: element.tag().to_owned(),
                reason: String::from("tag rejected by target"),
            });
        }
        let mut node = MemNode {
            tag: element.tag().to_owned(),
            ..MemNode::default()
        };
        Self::apply(&mut node, element);
        let handle = self.alloc(node);
        self.ops.push(Op::Create {
            handle,
            tag: element.tag().to_owned(),
        });
        Ok(handle)
    }

    fn create_text_handle(&mut self, text: &str) -> Result<MemHandle, AdapterError> {
        let handle = self.alloc(MemNode {
            tag: String::from("#text"),
            text: Some(text.to_owned()),
            ..MemNode::default()
        });
        self.ops.push(Op::CreateText {
            handle,
            text: text.to_owned(),
        });
        Ok(handle)
    }

    fn sync_attributes(&mut self, handle: &MemHandle, element: &Element<'_>) -> Result<(), AdapterError> {
        let node = self.node_mut(handle)?;
        Self::apply(node, element);
        self.ops.push(Op::Sync { handle: *handle });
        Ok(())
    }

    fn set_text(&mut self, handle: &MemHandle, text: &str) -> Result<(), AdapterError> {
        let node = self.node_mut(handle)?;
        node.text = Some(text.to_owned());
        self.ops.push(Op::SetText {
            handle: *handle,
            text: text.to_owned(),
        });
        Ok(())
    }

    fn attach_child(&mut self, parent: &MemHandle, child: &MemHandle, index: usize) -> Result<(), AdapterError> {
        self.node_mut(parent)?;
        self.node_mut(child)?;
        self.unlink(*child);

        let siblings = &mut self.node_mut(parent)?.children;
        let at = index.min(siblings.len());
        siblings.insert(at, *child);
        self.node_mut(child)?.parent = Some(*parent);

        self.ops.push(Op::Attach {
            parent: *parent,
            child: *child,
            index,
        });
        Ok(())
    }

    fn detach(&mut self, handle: &MemHandle) -> Result<(), AdapterError> {
        self.node_mut(handle)?;
        self.unlink(*handle);
        self.ops.push(Op::Detach { handle: *handle });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::node::element;

    #[test]
    fn builds_markup_in_attach_order() {
        let mut target = MemoryTarget::new();
        let root = target.create_container("app");
        let node = element("p").attr("id", "x").class("a").style("color", "red").build();
        let p = target.create_handle(&Element::new("p", node.attributes())).unwrap();
        let hi = target.create_text_handle("hi").unwrap();

        target.attach_child(&root, &p, 0).unwrap();
        target.attach_child(&p, &hi, 0).unwrap();

        assert_eq!(
            target.markup(&root),
            r#"<app><p id="x" class="a" style="color: red">hi</p></app>"#
        );
        assert_eq!(target.parent(&p), Some(root));
        assert_eq!(target.ops().len(), 4);
    }

    #[test]
    fn attach_clamps_index_and_moves_existing_children() {
        let mut target = MemoryTarget::new();
        let root = target.create_container("ul");
        let a = target.create_text_handle("a").unwrap();
        let b = target.create_text_handle("b").unwrap();

        target.attach_child(&root, &a, 5).unwrap();
        target.attach_child(&root, &b, 0).unwrap();
        assert_eq!(target.children(&root), &[b, a]);

        target.attach_child(&root, &b, 1).unwrap();
        assert_eq!(target.children(&root), &[a, b]);
    }

    #[test]
    fn detach_unlinks_from_parent() {
        let mut target = MemoryTarget::new();
        let root = target.create_container("div");
        let a = target.create_text_handle("a").unwrap();
        target.attach_child(&root, &a, 0).unwrap();

        target.detach(&a).unwrap();
        assert!(target.children(&root).is_empty());
        assert_eq!(target.parent(&a), None);
        assert_eq!(target.ops().last(), Some(&Op::Detach { handle: a }));
    }

    #[test]
    fn sync_replaces_attributes_and_dispatch_calls_handlers() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);

        let mut target = MemoryTarget::new();
        let first = element("button").attr("disabled", true).build();
        let button = target.create_handle(&Element::new("button", first.attributes())).unwrap();
        assert_eq!(target.property(&button, "disabled"), Some(&Value::Bool(true)));
        assert!(!target.dispatch(&button, "onclick"));

        let second = element("button")
            .on("onclick", move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .build();
        target.sync_attributes(&button, &Element::new("button", second.attributes())).unwrap();

        assert_eq!(target.property(&button, "disabled"), None);
        assert!(target.dispatch(&button, "onclick"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn rejected_tags_and_unknown_handles_fail() {
        let mut target = MemoryTarget::new();
        target.reject_tag("canvas");
        let node = element("canvas").build();
        let err = target.create_handle(&Element::new("canvas", node.attributes())).unwrap_err();
        assert!(matches!(err, AdapterError::Create { .. }));

        let err = target.set_text(&MemHandle(99), "x").unwrap_err();
        assert!(matches!(err, AdapterError::UnknownHandle(_)));
    }
}
