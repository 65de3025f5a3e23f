//! Scheduling
//!
//! The renderer splits a render pass into small units of work and runs
//! them inside host-provided idle slices. Between slices the host is free
//! to handle input; a pass only becomes visible when it commits.

mod deadline;
mod work_loop;

pub use deadline::{Deadline, IdleDeadline, Unbounded, UnitBudget};
pub use work_loop::{Renderer, RendererStats, WorkStatus};
