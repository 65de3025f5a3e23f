//! Effect Hook
//!
//! `use_effect` runs a side effect during evaluation when its dependency
//! list changed since the previous evaluation of the same component
//! instance.
//!
//! # Firing Rule
//!
//! - First evaluation: always fires (there is no previous list).
//! - Later evaluations: fires when the new list differs in length or at
//!   any index from the stored one. Comparison is shallow, element by
//!   element, using [`Value`] equality.
//!
//! An empty list therefore fires exactly once per component instance.
//!
//! The callback runs immediately, inside the evaluation, after the stored
//! list has been replaced. It may call state setters; those only queue a
//! new pass.

use super::store::{expect_kind, HookRecord, Hooks};
use crate::error::Result;
use crate::node::{Deps, Value};

impl Hooks {
    /// Declare an effect hook.
    pub fn use_effect<D, F>(&mut self, deps: D, effect: F) -> Result<()>
    where
        D: IntoIterator<Item = Value>,
        F: FnOnce(),
    {
        let deps: Deps = deps.into_iter().collect();
        let (index, slot) = self.next_slot(|| HookRecord::Effect { deps: None });

        let fire = {
            let mut record = slot.lock();
            expect_kind(self, index, &record, "effect")?;
            let HookRecord::Effect { deps: stored } = &mut *record else {
                return Err(self.order_error(index, "expected effect hook"));
            };

            let fire = match stored.as_ref() {
                None => true,
                Some(previous) if previous.len() != deps.len() => {
                    tracing::warn!(
                        component = self.component(),
                        hook = index,
                        before = previous.len(),
                        after = deps.len(),
                        "effect dependency list changed length; hooks may be called conditionally"
                    );
                    true
                }
                Some(previous) => *previous != deps,
            };
            *stored = Some(deps);
            fire
        };

        if fire {
            tracing::trace!(component = self.component(), hook = index, "running effect");
            effect();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::deps;
    use crate::hooks::{HookSlot, UpdateQueue};

    /// Evaluate a component that declares one effect with `deps`,
    /// carrying records forward from `slots`.
    fn run(slots: Vec<HookSlot>, deps: Deps, fired: &Cell<u32>) -> Vec<HookSlot> {
        let mut hooks = Hooks::new(slots, UpdateQueue::new(), "Effectful");
        hooks.use_effect(deps, || fired.set(fired.get() + 1)).unwrap();
        hooks.finish().0
    }

    #[test]
    fn fires_on_first_evaluation() {
        let fired = Cell::new(0);
        run(Vec::new(), deps![], &fired);
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn empty_deps_fire_once() {
        let fired = Cell::new(0);
        let mut slots = run(Vec::new(), deps![], &fired);
        for _ in 0..5 {
            slots = run(slots, deps![], &fired);
        }
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn fires_only_when_deps_change() {
        let fired = Cell::new(0);
        let slots = run(Vec::new(), deps![1, "a"], &fired);
        let slots = run(slots, deps![1, "a"], &fired);
        assert_eq!(fired.get(), 1);

        let slots = run(slots, deps![2, "a"], &fired);
        assert_eq!(fired.get(), 2);

        let slots = run(slots, deps![2, "a"], &fired);
        assert_eq!(fired.get(), 2);

        // Length change counts as a change.
        run(slots, deps![2, "a", true], &fired);
        assert_eq!(fired.get(), 3);
    }

    #[test]
    fn compares_against_immediately_preceding_list() {
        let fired = Cell::new(0);
        let slots = run(Vec::new(), deps![1], &fired);
        let slots = run(slots, deps![2], &fired);
        let slots = run(slots, deps![1], &fired);
        run(slots, deps![1], &fired);
        assert_eq!(fired.get(), 3);
    }
}
