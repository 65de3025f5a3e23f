//! Node Model
//!
//! A [`Node`] is the immutable description of one tree position: what kind
//! of thing lives there, its attributes, and its ordered children. Nodes are
//! rebuilt on every evaluation and thrown away after diffing; they are
//! reference counted so the fiber tree can hold on to them cheaply.
//!
//! # Building Trees
//!
//! ```rust,ignore
//! use weft_core::node::{element, component, text};
//!
//! let tree = element("div")
//!     .class("counter")
//!     .child(element("button").on("onclick", move || inc.update(|n| n + 1)).child("+"))
//!     .child(text(count.to_string()))
//!     .build();
//! ```
//!
//! Strings passed as children become text nodes.

mod value;

pub use value::{Attributes, Deps, Handler, StyleMap, Value};

use std::any::{type_name, TypeId};
use std::fmt;
use std::rc::Rc;

use crate::error::Result;
use crate::hooks::Hooks;

/// Signature of a component's render function.
pub type RenderFn = dyn Fn(&Attributes, &mut Hooks) -> Result<Node>;

/// A function component.
///
/// Identity for diffing is the type of the function or closure: the same
/// `fn` item (or closure expression) is the same component across passes.
#[derive(Clone)]
pub struct Component {
    render: Rc<RenderFn>,
    id: TypeId,
    name: &'static str,
}

impl Component {
    /// Wrap a render function.
    pub fn new<F>(render: F) -> Self
    where
        F: Fn(&Attributes, &mut Hooks) -> Result<Node> + 'static,
    {
        Self {
            render: Rc::new(render),
            id: TypeId::of::<F>(),
            name: short_type_name(type_name::<F>()),
        }
    }

    /// Human-readable name, used in logs and errors.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn render(&self, props: &Attributes, hooks: &mut Hooks) -> Result<Node> {
        (self.render)(props, hooks)
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Component").field(&self.name).finish()
    }
}

/// Trim a fully qualified type name down to its last path segment,
/// keeping closure markers readable (`app::counter::{{closure}}`).
fn short_type_name(full: &'static str) -> &'static str {
    match full.find("::{{closure}}") {
        Some(_) => full,
        None => full.rsplit("::").next().unwrap_or(full),
    }
}

/// What a node renders as.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// A text leaf with its content.
    Text(String),
    /// A native element identified by tag name.
    Intrinsic(String),
    /// A function component.
    Component(Component),
}

impl NodeKind {
    /// Whether two kinds occupy a position interchangeably: same tag, both
    /// text, or the same component function. Text content is compared as
    /// part of the attributes, not the kind.
    pub fn same_kind(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Text(_), Self::Text(_)) => true,
            (Self::Intrinsic(a), Self::Intrinsic(b)) => a == b,
            (Self::Component(a), Self::Component(b)) => a == b,
            _ => false,
        }
    }

    /// Short label for logs and snapshots.
    pub fn label(&self) -> &str {
        match self {
            Self::Text(_) => "#text",
            Self::Intrinsic(tag) => tag,
            Self::Component(component) => component.name(),
        }
    }
}

struct NodeData {
    kind: NodeKind,
    attributes: Attributes,
    children: Vec<Node>,
}

/// Immutable description of one tree position.
#[derive(Clone)]
pub struct Node(Rc<NodeData>);

/// Tag of the synthetic node the renderer places above the mounted root.
pub(crate) const ROOT_TAG: &str = "#root";

impl Node {
    /// Construct a node from its parts.
    pub fn new(kind: NodeKind, attributes: Attributes, children: Vec<Node>) -> Self {
        Self(Rc::new(NodeData {
            kind,
            attributes,
            children,
        }))
    }

    pub(crate) fn root(child: Node) -> Self {
        Self::new(
            NodeKind::Intrinsic(ROOT_TAG.to_owned()),
            Attributes::new(),
            vec![child],
        )
    }

    /// The node's kind.
    pub fn kind(&self) -> &NodeKind {
        &self.0.kind
    }

    /// Attributes, or props for a component.
    pub fn attributes(&self) -> &Attributes {
        &self.0.attributes
    }

    /// Declared children.
    pub fn children(&self) -> &[Node] {
        &self.0.children
    }

    /// Text content if this is a text node.
    pub fn text(&self) -> Option<&str> {
        match &self.0.kind {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Whether this node is a function component.
    pub fn is_component(&self) -> bool {
        matches!(self.0.kind, NodeKind::Component(_))
    }

    /// Whether this node maps to a native handle (element or text).
    pub fn is_host(&self) -> bool {
        !self.is_component()
    }

    /// Same kind as `other`.
    pub fn same_kind(&self, other: &Node) -> bool {
        self.0.kind.same_kind(&other.0.kind)
    }

    /// Deep equality of everything an adapter would apply for this node:
    /// the attributes and, for text, the content. Children are not compared.
    pub fn same_content(&self, other: &Node) -> bool {
        if Rc::ptr_eq(&self.0, &other.0) {
            return true;
        }
        self.text() == other.text() && self.0.attributes == other.0.attributes
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("kind", &self.0.kind)
            .field("attributes", &self.0.attributes)
            .field("children", &self.0.children)
            .finish()
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        text(value)
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        text(value)
    }
}

/// Create a text node.
pub fn text(content: impl Into<String>) -> Node {
    Node::new(NodeKind::Text(content.into()), Attributes::new(), Vec::new())
}

/// Start building a native element.
pub fn element(tag: impl Into<String>) -> ElementBuilder {
    ElementBuilder {
        tag: tag.into(),
        attributes: Attributes::new(),
        children: Vec::new(),
    }
}

/// Start building a component node.
pub fn component<F>(render: F) -> ComponentBuilder
where
    F: Fn(&Attributes, &mut Hooks) -> Result<Node> + 'static,
{
    ComponentBuilder {
        component: Component::new(render),
        props: Attributes::new(),
    }
}

/// Builder returned by [`element`].
#[derive(Debug)]
pub struct ElementBuilder {
    tag: String,
    attributes: Attributes,
    children: Vec<Node>,
}

impl ElementBuilder {
    /// Set an attribute.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Add one inline style declaration.
    pub fn style(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        let entry = self
            .attributes
            .entry(String::from("style"))
            .or_insert_with(|| Value::Style(StyleMap::new()));
        match entry {
            Value::Style(map) => {
                map.insert(property.into(), value.into());
            }
            other => {
                let mut map = StyleMap::new();
                map.insert(property.into(), value.into());
                *other = Value::Style(map);
            }
        }
        self
    }

    /// Add one class name.
    pub fn class(mut self, name: impl Into<String>) -> Self {
        let entry = self
            .attributes
            .entry(String::from("classList"))
            .or_insert_with(|| Value::ClassList(Vec::new()));
        match entry {
            Value::ClassList(list) => list.push(name.into()),
            other => *other = Value::ClassList(vec![name.into()]),
        }
        self
    }

    /// Attach an event handler under `event`.
    ///
    /// Handlers from the same closure expression compare equal, so once a
    /// handler is on the target it is not replaced on later passes. Values
    /// captured from a render stay as they were in the pass that first
    /// placed the element. Read state through the setter instead:
    ///
    /// ```rust,ignore
    /// // Stays at `count + 1` of the first pass.
    /// element("button").on("onclick", move || set.set(count + 1));
    /// // Always increments the current value.
    /// element("button").on("onclick", move || set.update(|n| n + 1));
    /// ```
    pub fn on<F>(self, event: impl Into<String>, handler: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.attr(event, Handler::new(handler))
    }

    /// Append a child.
    pub fn child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Append several children.
    pub fn children<I, C>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Node>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    /// Finish the node.
    pub fn build(self) -> Node {
        Node::new(NodeKind::Intrinsic(self.tag), self.attributes, self.children)
    }
}

impl From<ElementBuilder> for Node {
    fn from(builder: ElementBuilder) -> Self {
        builder.build()
    }
}

/// Builder returned by [`component`].
#[derive(Debug)]
pub struct ComponentBuilder {
    component: Component,
    props: Attributes,
}

impl ComponentBuilder {
    /// Set a prop.
    pub fn prop(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(name.into(), value.into());
        self
    }

    /// Finish the node.
    pub fn build(self) -> Node {
        Node::new(NodeKind::Component(self.component), self.props, Vec::new())
    }
}

impl From<ComponentBuilder> for Node {
    fn from(builder: ComponentBuilder) -> Self {
        builder.build()
    }
}
