//! Target Adapter
//!
//! The engine never touches a render target directly. Everything it needs
//! from a browser DOM, a terminal buffer or a native widget tree goes
//! through [`TargetAdapter`], and only during commit.
//!
//! Adapters receive fully resolved elements: components have already been
//! unwrapped, and grouped attributes arrive as [`Value::Style`] and
//! [`Value::ClassList`] so the adapter can decompose them into its own
//! primitive operations.

use thiserror::Error;

use crate::node::{Attributes, Handler, StyleMap, Value};

/// Failures reported by a target adapter.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdapterError {
    /// The target could not create a handle for this tag.
    #[error("cannot create `{tag}`: {reason}")]
    Create {
        /// Requested tag.
        tag: String,
        /// Why it failed.
        reason: String,
    },

    /// The target rejected an attribute.
    #[error("attribute `{name}` rejected: {reason}")]
    Attribute {
        /// Attribute name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The handle is not known to the target.
    #[error("unknown handle {0}")]
    UnknownHandle(String),

    /// Anything else.
    #[error("{0}")]
    Other(String),
}

/// A resolved native element handed to the adapter.
#[derive(Debug, Clone, Copy)]
pub struct Element<'a> {
    tag: &'a str,
    attributes: &'a Attributes,
}

impl<'a> Element<'a> {
    pub(crate) fn new(tag: &'a str, attributes: &'a Attributes) -> Self {
        Self { tag, attributes }
    }

    /// Tag name.
    pub fn tag(&self) -> &'a str {
        self.tag
    }

    /// All declared attributes, in declaration order.
    pub fn attributes(&self) -> &'a Attributes {
        self.attributes
    }

    /// Plain properties: everything that is not a style map, class list or
    /// handler.
    pub fn properties(&self) -> impl Iterator<Item = (&'a str, &'a Value)> {
        self.attributes.iter().filter_map(|(name, value)| match value {
            Value::Style(_) | Value::ClassList(_) | Value::Handler(_) => None,
            _ => Some((name.as_str(), value)),
        })
    }

    /// Merged inline style declarations.
    pub fn styles(&self) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.attributes
            .values()
            .filter_map(|value| match value {
                Value::Style(map) => Some(map),
                _ => None,
            })
            .flat_map(|map: &'a StyleMap| map.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }

    /// All class names.
    pub fn classes(&self) -> impl Iterator<Item = &'a str> {
        self.attributes
            .values()
            .filter_map(|value| match value {
                Value::ClassList(list) => Some(list),
                _ => None,
            })
            .flat_map(|list| list.iter().map(String::as_str))
    }

    /// Event handlers keyed by attribute name.
    pub fn handlers(&self) -> impl Iterator<Item = (&'a str, &'a Handler)> {
        self.attributes.iter().filter_map(|(name, value)| match value {
            Value::Handler(handler) => Some((name.as_str(), handler)),
            _ => None,
        })
    }
}

/// Mutation primitives of a render target.
///
/// The engine guarantees ordering: a parent's handle exists before any
/// child is attached under it, and siblings are attached left to right.
/// Handles are cloned into the fiber tree, so they should be cheap to clone
/// (an id or a reference-counted pointer).
pub trait TargetAdapter {
    /// Native node reference.
    type Handle: Clone + PartialEq + std::fmt::Debug;

    /// Create and fully configure a native element.
    fn create_handle(&mut self, element: &Element<'_>) -> Result<Self::Handle, AdapterError>;

    /// Create a native text node.
    fn create_text_handle(&mut self, text: &str) -> Result<Self::Handle, AdapterError>;

    /// Re-apply all attributes of `element` to an existing handle.
    /// Must be idempotent.
    fn sync_attributes(
        &mut self,
        handle: &Self::Handle,
        element: &Element<'_>,
    ) -> Result<(), AdapterError>;

    /// Replace the content of a text handle.
    fn set_text(&mut self, handle: &Self::Handle, text: &str) -> Result<(), AdapterError>;

    /// Insert `child` into `parent` at `index` among the parent's children.
    fn attach_child(
        &mut self,
        parent: &Self::Handle,
        child: &Self::Handle,
        index: usize,
    ) -> Result<(), AdapterError>;

    /// Remove a handle, and everything under it, from the visible structure.
    fn detach(&mut self, handle: &Self::Handle) -> Result<(), AdapterError>;
}
