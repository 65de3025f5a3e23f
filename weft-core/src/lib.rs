//! Weft Core
//!
//! This crate provides an incremental reconciliation engine for declarative
//! UI trees. It implements:
//!
//! - An immutable node model with function components
//! - A fiber tree built in small, interruptible units of work
//! - Positional hooks for component state and effects
//! - A diff that classifies every position as unchanged, updated, placed or
//!   removed
//! - A commit phase that applies the result through a pluggable target
//!   adapter
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `node`: Node model, attribute values and tree builders
//! - `fiber`: Fiber arena and child diffing
//! - `hooks`: Hook records, state setters and the update queue
//! - `scheduler`: Deadlines and the work loop (`Renderer`)
//! - `commit`: Effect-list application
//! - `adapter`: The render target contract
//! - `memory`: An in-memory reference target
//!
//! # Example
//!
//! ```rust,ignore
//! use weft_core::prelude::*;
//!
//! fn counter(_props: &Attributes, hooks: &mut Hooks) -> Result<Node> {
//!     let (count, set_count) = hooks.use_state(|| 0_i64)?;
//!     Ok(element("div")
//!         .child(element("button").on("onclick", move || set_count.update(|n| n + 1)).child("+"))
//!         .child(count.to_string())
//!         .build())
//! }
//!
//! let mut target = MemoryTarget::new();
//! let container = target.create_container("app");
//! let mut renderer = Renderer::new(target);
//!
//! renderer.render(component(counter), container);
//! renderer.flush()?;
//! // "<app><div><button>+</button>0</div></app>"
//! ```

pub mod adapter;
pub mod commit;
pub mod config;
pub mod debug;
pub mod error;
pub mod fiber;
pub mod hooks;
pub mod memory;
pub mod node;
pub mod scheduler;

pub use adapter::{AdapterError, Element, TargetAdapter};
pub use commit::CommitSummary;
pub use config::RendererConfig;
pub use error::{RenderError, Result};
pub use scheduler::{Renderer, WorkStatus};

/// Everything needed to write components and mount them.
pub mod prelude {
    pub use crate::adapter::TargetAdapter;
    pub use crate::deps;
    pub use crate::error::{RenderError, Result};
    pub use crate::hooks::{Hooks, StateSetter};
    pub use crate::memory::MemoryTarget;
    pub use crate::node::{component, element, text, Attributes, Node, Value};
    pub use crate::scheduler::{Deadline, IdleDeadline, Renderer, UnitBudget, WorkStatus};
}
