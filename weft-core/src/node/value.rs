//! Attribute Values
//!
//! Attribute maps and hook dependency lists share one value type. Grouped
//! attributes (inline style maps, class lists) and event handlers get their
//! own variants when a node is built, so target adapters can dispatch on
//! the variant instead of on the attribute name.

use std::any::{type_name, TypeId};
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use smallvec::SmallVec;

/// Insertion-ordered attribute mapping of a node.
pub type Attributes = IndexMap<String, Value>;

/// Inline style declarations, property name to value.
pub type StyleMap = IndexMap<String, String>;

/// Dependency list of an effect hook.
pub type Deps = SmallVec<[Value; 4]>;

/// Build a [`Deps`] list from anything convertible into a [`Value`].
///
/// ```rust,ignore
/// hooks.use_effect(deps![count, "label"], || println!("changed"))?;
/// ```
#[macro_export]
macro_rules! deps {
    () => {
        $crate::node::Deps::new()
    };
    ($($dep:expr),+ $(,)?) => {{
        let mut deps = $crate::node::Deps::new();
        $(deps.push($crate::node::Value::from($dep));)+
        deps
    }};
}

/// An event handler attached to a node as an attribute.
///
/// Two handlers are equal when they were created from the same closure
/// type, i.e. the same closure expression in the source. A component that
/// re-creates its `onclick` closure on every evaluation therefore does not
/// force an attribute update. The flip side is that the target keeps the
/// closure of the pass that first applied it: handlers must capture state
/// setters, which are stable across passes, and read state through
/// [`StateSetter::update`](crate::hooks::StateSetter::update) rather than
/// capture rendered values.
#[derive(Clone)]
pub struct Handler {
    callback: Arc<dyn Fn() + Send + Sync>,
    origin: TypeId,
    name: &'static str,
}

impl Handler {
    /// Wrap a callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
            origin: TypeId::of::<F>(),
            name: type_name::<F>(),
        }
    }

    /// Invoke the callback.
    pub fn call(&self) {
        (self.callback)();
    }

    /// Identity of the closure this handler was created from.
    pub fn origin(&self) -> TypeId {
        self.origin
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        self.origin == other.origin
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handler").field(&self.name).finish()
    }
}

impl Serialize for Handler {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("<handler>")
    }
}

/// A single attribute or dependency value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Plain string.
    Str(String),
    /// Integer.
    Int(i64),
    /// Floating point number. `NaN` never equals itself, so a `NaN`
    /// attribute is always re-applied.
    Float(f64),
    /// Boolean flag.
    Bool(bool),
    /// Inline style map, decomposed by the adapter into single properties.
    Style(StyleMap),
    /// Set of class names, decomposed by the adapter into single classes.
    ClassList(Vec<String>),
    /// Event handler reference.
    Handler(Handler),
}

impl Value {
    /// Borrow the string payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Integer payload, if this is an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Boolean payload, if this is a flag.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Handler payload, if this is an event handler.
    pub fn as_handler(&self) -> Option<&Handler> {
        match self {
            Self::Handler(h) => Some(h),
            _ => None,
        }
    }

    /// Render the value the way a property setter would receive it.
    pub fn to_display_string(&self) -> String {
        match self {
            Self::Str(s) => s.clone(),
            Self::Int(n) => n.to_string(),
            Self::Float(x) => x.to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Style(style) => style
                .iter()
                .map(|(k, v)| format!("{k}: {v};"))
                .collect::<Vec<_>>()
                .join(" "),
            Self::ClassList(classes) => classes.join(" "),
            Self::Handler(_) => String::from("<handler>"),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Self::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Handler> for Value {
    fn from(value: Handler) -> Self {
        Self::Handler(value)
    }
}

impl From<StyleMap> for Value {
    fn from(value: StyleMap) -> Self {
        Self::Style(value)
    }
}

impl From<Vec<String>> for Value {
    fn from(value: Vec<String>) -> Self {
        Self::ClassList(value)
    }
}
