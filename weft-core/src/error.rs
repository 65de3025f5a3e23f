//! Error Types
//!
//! Every error aborts the pass it occurs in, and the previously committed
//! tree stays the renderer's current tree. An error raised while rendering
//! leaves the target untouched. An [`AdapterError`] raised during commit
//! can leave the target partially updated: entries applied before the
//! failure stay applied.

use thiserror::Error;

use crate::adapter::AdapterError;

/// Errors raised while rendering or committing a pass.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    /// A component reported a failure from its render function.
    #[error("component `{component}` failed: {message}")]
    Component {
        /// Name of the failing component.
        component: String,
        /// What went wrong.
        message: String,
    },

    /// A failure raised with [`RenderError::custom`] outside a component.
    #[error("{0}")]
    Custom(String),

    /// The node tree has a shape the engine cannot render.
    #[error("malformed tree at `{node}`: {detail}")]
    MalformedTree {
        /// Label of the offending node.
        node: String,
        /// What is wrong with it.
        detail: String,
    },

    /// Hook records did not line up with the previous evaluation.
    ///
    /// Hooks are matched by call order only; calling them conditionally is a
    /// contract violation. This is reported when the mismatch is detectable.
    #[error("hook order violated in `{component}` at hook #{index}: {detail}")]
    HookOrder {
        /// Component being evaluated.
        component: String,
        /// Position of the offending hook call.
        index: usize,
        /// What did not match.
        detail: String,
    },

    /// The target adapter rejected an operation during commit.
    #[error("target adapter failed: {0}")]
    Adapter(#[from] AdapterError),

    /// A fiber expected to own a native handle had none.
    #[error("fiber #{fiber} has no native handle")]
    MissingHandle {
        /// Index of the fiber in its pass.
        fiber: usize,
    },

    /// Nothing has been mounted with `render` yet.
    #[error("nothing has been mounted")]
    NotMounted,

    /// Passes kept re-triggering themselves.
    #[error("render loop detected: more than {limit} passes without settling")]
    PassLimit {
        /// The configured limit.
        limit: usize,
    },
}

impl RenderError {
    /// An error a component can return from its render function.
    ///
    /// When raised inside a component it is reported as
    /// [`RenderError::Component`] with the component's name.
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }

    /// Attach the name of the component that was being evaluated.
    pub(crate) fn within(self, component: &str) -> Self {
        match self {
            Self::Custom(message) => Self::Component {
                component: component.to_owned(),
                message,
            },
            other => other,
        }
    }
}

/// Result type for rendering operations.
pub type Result<T> = std::result::Result<T, RenderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_errors_pick_up_component_name() {
        let err = RenderError::custom("no data").within("Counter");
        assert_eq!(
            err,
            RenderError::Component {
                component: "Counter".into(),
                message: "no data".into(),
            }
        );
        assert_eq!(err.to_string(), "component `Counter` failed: no data");
    }

    #[test]
    fn structural_errors_pass_through() {
        let err = RenderError::NotMounted.within("Counter");
        assert_eq!(err, RenderError::NotMounted);
    }

    #[test]
    fn adapter_errors_convert() {
        let err: RenderError = AdapterError::Other("boom".into()).into();
        assert_eq!(err.to_string(), "target adapter failed: boom");
    }
}
