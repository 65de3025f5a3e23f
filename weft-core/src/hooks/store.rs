//! Hook Store
//!
//! [`Hooks`] is the evaluation context handed to a component. It owns the
//! component's hook records for the duration of one evaluation and a cursor
//! that advances with every hook call. Records are matched to calls purely
//! by position.
//!
//! # Carry-Forward
//!
//! Each record lives behind a shared pointer. A fiber that reuses the
//! position of a previous fiber clones the previous fiber's list of
//! pointers, so state survives across passes while the previous fiber
//! itself is never modified. Every evaluation starts with a fresh cursor.
//!
//! A record created by a pass that has not committed yet is marked
//! uncommitted. Setters on such records hold their re-render request until
//! that pass commits, since a fresh pass could not see the record.

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use super::queue::UpdateQueue;
use crate::error::{RenderError, Result};
use crate::node::Deps;

/// One positional hook record.
pub(crate) enum HookRecord {
    /// Current value of a state hook.
    State(Box<dyn Any + Send>),

    /// Dependency list of an effect hook, `None` until it first runs.
    Effect { deps: Option<Deps> },
}

impl HookRecord {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::State(_) => "state",
            Self::Effect { .. } => "effect",
        }
    }
}

/// A hook record and whether a committed fiber owns it.
pub(crate) struct HookCell {
    record: Mutex<HookRecord>,
    committed: AtomicBool,
}

impl HookCell {
    pub(crate) fn new(record: HookRecord) -> Self {
        Self {
            record: Mutex::new(record),
            committed: AtomicBool::new(false),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, HookRecord> {
        self.record.lock()
    }

    /// Whether the record belongs to a committed fiber.
    pub(crate) fn is_committed(&self) -> bool {
        self.committed.load(Ordering::Acquire)
    }

    pub(crate) fn mark_committed(&self) {
        self.committed.store(true, Ordering::Release);
    }
}

/// Shared handle to a hook record.
pub(crate) type HookSlot = Arc<HookCell>;

/// Evaluation context of one component render.
///
/// # Contract
///
/// Hooks must be called in the same order on every evaluation of the same
/// component instance. Calling a hook conditionally or in a loop of varying
/// length misattributes state; the engine reports the mismatches it can
/// detect as [`RenderError::HookOrder`] but cannot catch them all.
pub struct Hooks {
    slots: Vec<HookSlot>,
    cursor: usize,
    queue: UpdateQueue,
    component: &'static str,
}

impl Hooks {
    pub(crate) fn new(slots: Vec<HookSlot>, queue: UpdateQueue, component: &'static str) -> Self {
        Self {
            slots,
            cursor: 0,
            queue,
            component,
        }
    }

    /// Hand the records back, together with how many were used.
    pub(crate) fn finish(self) -> (Vec<HookSlot>, usize) {
        (self.slots, self.cursor)
    }

    /// Name of the component being evaluated.
    pub fn component(&self) -> &'static str {
        self.component
    }

    /// Number of hooks called so far in this evaluation.
    pub fn position(&self) -> usize {
        self.cursor
    }

    pub(crate) fn queue(&self) -> &UpdateQueue {
        &self.queue
    }

    /// Take the record at the cursor, creating it if this evaluation has
    /// gone past the records carried forward.
    pub(crate) fn next_slot(&mut self, create: impl FnOnce() -> HookRecord) -> (usize, HookSlot) {
        let index = self.cursor;
        if index == self.slots.len() {
            self.slots.push(Arc::new(HookCell::new(create())));
        }
        self.cursor += 1;
        (index, Arc::clone(&self.slots[index]))
    }

    pub(crate) fn order_error(&self, index: usize, detail: impl Into<String>) -> RenderError {
        RenderError::HookOrder {
            component: self.component.to_owned(),
            index,
            detail: detail.into(),
        }
    }
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks")
            .field("component", &self.component)
            .field("cursor", &self.cursor)
            .field("records", &self.slots.len())
            .finish()
    }
}

/// Check the record kind at `index`.
pub(crate) fn expect_kind(
    hooks: &Hooks,
    index: usize,
    record: &HookRecord,
    wanted: &'static str,
) -> Result<()> {
    if record.kind() == wanted {
        Ok(())
    } else {
        Err(hooks.order_error(
            index,
            format!("expected {wanted} hook, found {} hook", record.kind()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_advances_and_creates_records() {
        let mut hooks = Hooks::new(Vec::new(), UpdateQueue::new(), "test");
        assert_eq!(hooks.position(), 0);

        let (first, _) = hooks.next_slot(|| HookRecord::Effect { deps: None });
        let (second, _) = hooks.next_slot(|| HookRecord::State(Box::new(1_i32)));
        assert_eq!((first, second), (0, 1));

        let (slots, used) = hooks.finish();
        assert_eq!(slots.len(), 2);
        assert_eq!(used, 2);
    }

    #[test]
    fn carried_records_are_reused_not_recreated() {
        let record: HookSlot = Arc::new(HookCell::new(HookRecord::State(Box::new(7_i32))));
        let mut hooks = Hooks::new(vec![Arc::clone(&record)], UpdateQueue::new(), "test");

        let (_, slot) = hooks.next_slot(|| HookRecord::State(Box::new(0_i32)));
        assert!(Arc::ptr_eq(&slot, &record));
        match &*slot.lock() {
            HookRecord::State(value) => assert_eq!(value.downcast_ref::<i32>(), Some(&7)),
            HookRecord::Effect { .. } => panic!("expected state record"),
        };
    }

    #[test]
    fn new_records_start_uncommitted() {
        let mut hooks = Hooks::new(Vec::new(), UpdateQueue::new(), "test");
        let (_, slot) = hooks.next_slot(|| HookRecord::Effect { deps: None });
        assert!(!slot.is_committed());

        slot.mark_committed();
        let (slots, _) = hooks.finish();
        assert!(slots[0].is_committed());
    }

    #[test]
    fn kind_mismatch_is_reported() {
        let hooks = Hooks::new(Vec::new(), UpdateQueue::new(), "Widget");
        let record = HookRecord::Effect { deps: None };
        let err = expect_kind(&hooks, 3, &record, "state").unwrap_err();
        assert_eq!(
            err,
            RenderError::HookOrder {
                component: "Widget".into(),
                index: 3,
                detail: "expected state hook, found effect hook".into(),
            }
        );
    }
}
