//! State Hook
//!
//! `use_state` gives a component a value that persists across passes and a
//! [`StateSetter`] to change it.
//!
//! # How Updates Work
//!
//! 1. The setter applies its transformation to the hook record right away,
//!    with the record locked.
//!
//! 2. It then raises a re-render request on the renderer's update queue.
//!
//! 3. The work loop notices the request at its next unit boundary and
//!    starts a fresh pass from the last committed tree, discarding any
//!    pass still in flight.
//!
//! A record that only exists in the pass in flight (a component mounted by
//! that pass) cannot be seen by a fresh pass. Its requests are held until
//! the pass commits instead.
//!
//! The setter never re-enters the renderer, so it is safe to call from an
//! event handler, an effect callback, or another thread.

use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;

use super::queue::UpdateQueue;
use super::store::{expect_kind, HookRecord, HookSlot, Hooks};
use crate::error::Result;

impl Hooks {
    /// Declare a state hook.
    ///
    /// `init` runs only on the first evaluation of this component instance.
    /// Returns the current value and a setter.
    pub fn use_state<T, I>(&mut self, init: I) -> Result<(T, StateSetter<T>)>
    where
        T: Clone + Send + 'static,
        I: FnOnce() -> T,
    {
        let (index, slot) = self.next_slot(|| HookRecord::State(Box::new(init())));

        let value = {
            let record = slot.lock();
            expect_kind(self, index, &record, "state")?;
            let current = match &*record {
                HookRecord::State(value) => value.downcast_ref::<T>().cloned(),
                HookRecord::Effect { .. } => None,
            };
            current
        };

        let value = value.ok_or_else(|| {
            self.order_error(index, format!("state hook does not hold a `{}`", type_name::<T>()))
        })?;

        let setter = StateSetter {
            slot,
            queue: self.queue().clone(),
            component: self.component(),
            _marker: PhantomData,
        };
        Ok((value, setter))
    }
}

/// Updater for one state hook.
///
/// Setters are stable across passes: the setter returned by any evaluation
/// of a component instance updates the same record.
pub struct StateSetter<T> {
    slot: HookSlot,
    queue: UpdateQueue,
    component: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> StateSetter<T>
where
    T: Clone + Send + 'static,
{
    /// Replace the value with `f(current)` and schedule a new pass.
    ///
    /// `f` runs while the record is locked, so concurrent updates apply one
    /// after another. It must not call back into a setter of the same hook.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        let applied = {
            let mut record = self.slot.lock();
            match &mut *record {
                HookRecord::State(value) => match value.downcast_mut::<T>() {
                    Some(current) => {
                        let next = f(current);
                        *current = next;
                        true
                    }
                    None => false,
                },
                HookRecord::Effect { .. } => false,
            }
        };
        if !applied {
            tracing::warn!(
                component = self.component,
                "state record no longer holds a `{}`; update dropped",
                type_name::<T>()
            );
            return;
        }

        if self.slot.is_committed() {
            self.queue.request_render(self.component);
        } else {
            self.queue.request_after_commit(self.component);
        }
    }

    /// Replace the value and schedule a new pass.
    pub fn set(&self, value: T) {
        self.update(move |_| value);
    }

    /// Read the current value without rendering.
    pub fn current(&self) -> Option<T> {
        match &*self.slot.lock() {
            HookRecord::State(value) => value.downcast_ref::<T>().cloned(),
            HookRecord::Effect { .. } => None,
        }
    }
}

impl<T> Clone for StateSetter<T> {
    fn clone(&self) -> Self {
        Self {
            slot: HookSlot::clone(&self.slot),
            queue: self.queue.clone(),
            component: self.component,
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for StateSetter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateSetter")
            .field("component", &self.component)
            .field("type", &type_name::<T>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;

    #[test]
    fn init_runs_once_and_state_persists() {
        let queue = UpdateQueue::new();
        let mut first = Hooks::new(Vec::new(), queue.clone(), "Counter");
        let (value, setter) = first.use_state(|| 10_i64).unwrap();
        assert_eq!(value, 10);

        setter.update(|n| n + 5);
        assert!(queue.is_held());
        assert!(!queue.is_pending());

        let (slots, _) = first.finish();
        let mut second = Hooks::new(slots, queue, "Counter");
        let (value, _) = second
            .use_state(|| -> i64 { panic!("init must not run twice") })
            .unwrap();
        assert_eq!(value, 15);
    }

    #[test]
    fn set_replaces_value() {
        let mut hooks = Hooks::new(Vec::new(), UpdateQueue::new(), "Label");
        let (_, setter) = hooks.use_state(|| String::from("a")).unwrap();

        setter.set(String::from("b"));
        assert_eq!(setter.current().as_deref(), Some("b"));

        let clone = setter.clone();
        clone.update(|s| format!("{s}c"));
        assert_eq!(setter.current().as_deref(), Some("bc"));
    }

    #[test]
    fn committed_record_requests_a_pass_right_away() {
        let queue = UpdateQueue::new();
        let mut hooks = Hooks::new(Vec::new(), queue.clone(), "Counter");
        let (_, setter) = hooks.use_state(|| 0_u32).unwrap();
        let (slots, _) = hooks.finish();
        slots[0].mark_committed();

        setter.set(3);
        assert!(queue.is_pending());
        assert!(!queue.is_held());
    }

    #[test]
    fn concurrent_updates_are_not_lost() {
        let mut hooks = Hooks::new(Vec::new(), UpdateQueue::new(), "Counter");
        let (_, setter) = hooks.use_state(|| 0_u64).unwrap();

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let setter = setter.clone();
                std::thread::spawn(move || {
                    for _ in 0..5_000 {
                        setter.update(|n| n + 1);
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(setter.current(), Some(40_000));
    }

    #[test]
    fn setter_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<StateSetter<u64>>();
    }

    #[test]
    fn wrong_type_is_a_hook_order_error() {
        let queue = UpdateQueue::new();
        let mut first = Hooks::new(Vec::new(), queue.clone(), "Counter");
        first.use_state(|| 1_i32).unwrap();
        let (slots, _) = first.finish();

        let mut second = Hooks::new(slots, queue, "Counter");
        let err = second.use_state(|| String::new()).unwrap_err();
        assert!(matches!(err, RenderError::HookOrder { index: 0, .. }));
    }

    #[test]
    fn effect_slot_is_a_hook_order_error() {
        let queue = UpdateQueue::new();
        let mut first = Hooks::new(Vec::new(), queue.clone(), "Widget");
        first.use_effect(crate::deps![], || {}).unwrap();
        let (slots, _) = first.finish();

        let mut second = Hooks::new(slots, queue, "Widget");
        let err = second.use_state(|| 0_u8).unwrap_err();
        assert!(matches!(err, RenderError::HookOrder { index: 0, .. }));
    }
}
