//! Hooks
//!
//! Per-component local state threaded through repeated evaluations.
//!
//! # Concepts
//!
//! ## Records
//!
//! Every hook call claims the next record in the component fiber's hook
//! list. Records are identified by call position alone, never by name, so a
//! component must call its hooks in the same order on every evaluation.
//!
//! ## State
//!
//! [`Hooks::use_state`] returns the current value and a [`StateSetter`].
//! The setter transforms the value and asks the renderer for a new pass.
//!
//! ## Effects
//!
//! [`Hooks::use_effect`] runs a callback during evaluation when its
//! dependency list changed since the previous evaluation.
//!
//! # Implementation Notes
//!
//! There is no global hook cursor. Each evaluation gets its own [`Hooks`]
//! context, seeded with the records carried forward from the fiber that
//! previously occupied the same position, and each renderer has its own
//! [`UpdateQueue`].

mod effect;
mod queue;
mod state;
mod store;

pub use queue::UpdateQueue;
pub use state::StateSetter;
pub use store::Hooks;

pub(crate) use store::HookSlot;
