//! Work Loop
//!
//! The [`Renderer`] owns the committed fiber tree, at most one pass in
//! flight, the target adapter and the update queue.
//!
//! # Units of Work
//!
//! A pass walks the new fiber tree depth first, one unit at a time:
//!
//! 1. Entering a fiber records its own effect, evaluates it if it is a
//!    component, and reconciles its children against the previous fiber's.
//!    The next unit is the first child.
//! 2. Completing a fiber appends its effect list to its parent's. The next
//!    unit is the next sibling, or the parent when there is none.
//!
//! After every unit the loop checks the update queue and asks the
//! [`Deadline`] whether to yield. When the root completes the pass commits
//! in one step.
//!
//! # Restarts
//!
//! A re-render request discards the pass in flight and seeds a fresh one
//! from the committed tree. Hook records are shared with the committed
//! tree, so updates made by the discarded pass are not lost.
//!
//! Requests from records the pass in flight created are held instead, and
//! seed a pass only after that pass commits. Restarting would drop those
//! records and run their effects again.

use std::time::{Duration, Instant};

use serde::Serialize;

use super::deadline::{Deadline, IdleDeadline, Unbounded};
use crate::adapter::TargetAdapter;
use crate::commit::{self, CommitSummary};
use crate::config::RendererConfig;
use crate::debug::TreeSnapshot;
use crate::error::{RenderError, Result};
use crate::fiber::{reconcile_children, EffectEntry, EffectTag, FiberId, FiberTree, WorkState};
use crate::hooks::{Hooks, UpdateQueue};
use crate::node::{Node, NodeKind};

/// Outcome of one call to [`Renderer::work`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkStatus {
    /// Nothing to do.
    Idle,
    /// The deadline ran out; a pass is still in flight.
    Yielded,
    /// A pass completed and was applied to the target.
    Committed(CommitSummary),
}

/// Lifetime counters of a renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RendererStats {
    /// Passes seeded.
    pub passes_started: u64,
    /// Passes applied to the target.
    pub passes_committed: u64,
    /// Passes superseded by a newer one before they could commit.
    pub passes_discarded: u64,
    /// Passes stopped by an error.
    pub passes_aborted: u64,
    /// Units of work performed.
    pub units: u64,
}

/// One render pass in flight.
struct Pass<H> {
    id: u64,
    tree: FiberTree<H>,
    next: Option<FiberId>,
    units: usize,
    render_time: Duration,
    /// The container changed: diff against nothing and detach the old tree
    /// at commit.
    unmount_previous: bool,
    span: tracing::Span,
}

/// Incremental renderer driving one root into one target.
pub struct Renderer<A: TargetAdapter> {
    adapter: A,
    config: RendererConfig,
    queue: UpdateQueue,

    /// Root node and container of the last `render` call.
    mounted: Option<(Node, A::Handle)>,

    /// The tree that matches what the target shows.
    current: Option<FiberTree<A::Handle>>,

    pass: Option<Pass<A::Handle>>,
    pass_counter: u64,

    /// Passes seeded from update requests since the last commit.
    restarts: usize,

    stats: RendererStats,
    last_commit: Option<CommitSummary>,
}

impl<A: TargetAdapter> Renderer<A> {
    /// Create a renderer with the default configuration.
    pub fn new(adapter: A) -> Self {
        Self::with_config(adapter, RendererConfig::default())
    }

    /// Create a renderer with an explicit configuration.
    pub fn with_config(adapter: A, config: RendererConfig) -> Self {
        Self {
            adapter,
            config,
            queue: UpdateQueue::new(),
            mounted: None,
            current: None,
            pass: None,
            pass_counter: 0,
            restarts: 0,
            stats: RendererStats::default(),
            last_commit: None,
        }
    }

    /// Mount `root` into `container`.
    ///
    /// Seeds a pass and returns; nothing reaches the target until the pass
    /// commits through [`work`](Self::work) or [`flush`](Self::flush). A
    /// pass already in flight is discarded. Rendering into a different
    /// container than before detaches the old tree at commit.
    pub fn render(&mut self, root: impl Into<Node>, container: A::Handle) {
        self.mounted = Some((root.into(), container));
        self.restarts = 0;
        self.seed_pass();
    }

    /// Perform units of work until the deadline says to yield, the pass
    /// commits, or there is nothing left to do.
    ///
    /// An error aborts the pass in flight; the committed tree and the
    /// target stay as they were before the pass.
    pub fn work<D: Deadline + ?Sized>(&mut self, deadline: &mut D) -> Result<WorkStatus> {
        loop {
            self.absorb_updates()?;

            let Some(pass) = self.pass.as_mut() else {
                return Ok(WorkStatus::Idle);
            };
            let Some(id) = pass.next else {
                return self.commit().map(WorkStatus::Committed);
            };

            let span = pass.span.clone();
            let _entered = span.enter();
            let started = Instant::now();
            let previous = if pass.unmount_previous {
                None
            } else {
                self.current.as_ref()
            };
            let result = perform_unit(&mut pass.tree, previous, &self.queue, &self.config, id);
            pass.render_time += started.elapsed();
            pass.units += 1;
            self.stats.units += 1;

            match result {
                Ok(next) => pass.next = next,
                Err(err) => {
                    self.abort(&err);
                    return Err(err);
                }
            }

            if pass.next.is_none() {
                return self.commit().map(WorkStatus::Committed);
            }
            if deadline.should_yield() {
                tracing::trace!(units = pass.units, "yielding to host");
                return Ok(WorkStatus::Yielded);
            }
        }
    }

    /// Run passes until nothing is pending, including passes requested by
    /// state updates made while flushing. Returns the number of commits.
    pub fn flush(&mut self) -> Result<usize> {
        let limit = self.config.max_passes_per_flush;
        let mut committed = 0;
        loop {
            match self.work(&mut Unbounded)? {
                WorkStatus::Idle => return Ok(committed),
                WorkStatus::Yielded => {}
                WorkStatus::Committed(_) => {
                    committed += 1;
                    if committed >= limit && self.has_pending_work() {
                        tracing::error!(limit, "render loop detected; flush stopped");
                        return Err(RenderError::PassLimit { limit });
                    }
                }
            }
        }
    }

    /// Detach the committed tree from its container and forget the mount.
    pub fn unmount(&mut self) -> Result<()> {
        if let Some(pass) = self.pass.take() {
            self.stats.passes_discarded += 1;
            tracing::debug!(pass = pass.id, "discarding pass on unmount");
        }
        self.mounted = None;
        if let Some(tree) = self.current.take() {
            let detached = commit::unmount(&mut self.adapter, &tree)?;
            tracing::debug!(detached, "unmounted");
        }
        Ok(())
    }

    /// A wall-clock deadline of one configured slice, starting now.
    pub fn idle_deadline(&self) -> IdleDeadline {
        IdleDeadline::new(self.config.slice_budget())
    }

    /// Whether a pass is in flight or will be seeded by the next `work`.
    pub fn has_pending_work(&self) -> bool {
        self.pass.is_some()
            || (self.current.is_some() && (self.queue.is_pending() || self.queue.is_held()))
    }

    /// Queue that state setters of this renderer report to.
    pub fn update_queue(&self) -> &UpdateQueue {
        &self.queue
    }

    /// The target adapter.
    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// Mutable access to the target adapter, e.g. to dispatch events.
    pub fn adapter_mut(&mut self) -> &mut A {
        &mut self.adapter
    }

    /// Active configuration.
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Lifetime counters.
    pub fn stats(&self) -> RendererStats {
        self.stats
    }

    /// Summary of the most recent commit.
    pub fn last_commit(&self) -> Option<CommitSummary> {
        self.last_commit
    }

    /// The committed fiber tree.
    pub fn committed(&self) -> Option<&FiberTree<A::Handle>> {
        self.current.as_ref()
    }

    /// Container of the current mount.
    pub fn container(&self) -> Option<&A::Handle> {
        self.mounted.as_ref().map(|(_, container)| container)
    }

    /// Serializable view of the committed tree.
    pub fn snapshot(&self) -> Option<TreeSnapshot> {
        self.current.as_ref().and_then(TreeSnapshot::capture)
    }

    /// Start a fresh pass from the mounted root, discarding any pass in
    /// flight.
    fn seed_pass(&mut self) {
        let Some((root, container)) = &self.mounted else {
            return;
        };

        let previous = self
            .current
            .as_ref()
            .filter(|tree| tree[tree.root()].native() == Some(container))
            .map(FiberTree::root);
        let unmount_previous = self.current.is_some() && previous.is_none();
        let tree = FiberTree::with_root(Node::root(root.clone()), container.clone(), previous);

        if let Some(stale) = self.pass.take() {
            self.stats.passes_discarded += 1;
            tracing::debug!(pass = stale.id, units = stale.units, "discarding superseded pass");
        }

        self.pass_counter += 1;
        self.stats.passes_started += 1;
        let id = self.pass_counter;
        tracing::debug!(pass = id, remount = unmount_previous, "render pass seeded");

        self.pass = Some(Pass {
            id,
            next: Some(tree.root()),
            tree,
            units: 0,
            render_time: Duration::ZERO,
            unmount_previous,
            span: tracing::debug_span!("render_pass", pass = id),
        });
    }

    /// Turn a pending update request into a fresh pass.
    fn absorb_updates(&mut self) -> Result<()> {
        if self.pass.is_none() {
            self.queue.release_held();
        }
        if !self.queue.is_pending() {
            return Ok(());
        }
        if self.current.is_none() {
            if self.pass.is_none() {
                self.queue.take();
                tracing::warn!(
                    source = ?self.queue.last_source(),
                    "re-render requested before anything was committed; dropped"
                );
            }
            // Held until the first pass commits.
            return Ok(());
        }

        self.queue.take();
        self.restarts += 1;
        let limit = self.config.max_passes_per_flush;
        if self.restarts > limit {
            let err = RenderError::PassLimit { limit };
            self.restarts = 0;
            if self.pass.is_some() {
                self.abort(&err);
            } else {
                tracing::error!(error = %err, "render loop detected");
            }
            return Err(err);
        }
        self.seed_pass();
        Ok(())
    }

    /// Apply the completed pass to the target.
    fn commit(&mut self) -> Result<CommitSummary> {
        let Some(mut pass) = self.pass.take() else {
            return Err(RenderError::NotMounted);
        };
        let span = pass.span.clone();
        let _entered = span.enter();

        let started = Instant::now();
        let root = pass.tree.root();
        let effects = pass.tree.take_effects(root);
        let mut summary = CommitSummary {
            pass: pass.id,
            units: pass.units,
            render_time: pass.render_time,
            ..CommitSummary::default()
        };

        let result = self.apply_effects(&mut pass, &effects, &mut summary);
        if let Err(err) = result {
            self.stats.passes_aborted += 1;
            self.restarts = 0;
            tracing::error!(pass = pass.id, error = %err, "commit failed; target may be partially updated");
            return Err(err);
        }

        summary.commit_time = started.elapsed();
        tracing::debug!(
            pass = summary.pass,
            units = summary.units,
            placed = summary.placed,
            updated = summary.updated,
            removed = summary.removed,
            render_time = ?summary.render_time,
            commit_time = ?summary.commit_time,
            "pass committed"
        );

        pass.tree.mark_hooks_committed();
        self.current = Some(pass.tree);
        self.restarts = 0;
        self.stats.passes_committed += 1;
        self.last_commit = Some(summary);
        Ok(summary)
    }

    fn apply_effects(
        &mut self,
        pass: &mut Pass<A::Handle>,
        effects: &[EffectEntry],
        summary: &mut CommitSummary,
    ) -> Result<()> {
        if pass.unmount_previous {
            if let Some(old) = &self.current {
                let detached = commit::unmount(&mut self.adapter, old)?;
                tracing::debug!(detached, "detached tree from previous container");
            }
            commit::apply(&mut self.adapter, &mut pass.tree, None, effects, summary)
        } else {
            commit::apply(&mut self.adapter, &mut pass.tree, self.current.as_ref(), effects, summary)
        }
    }

    fn abort(&mut self, err: &RenderError) {
        let pass = self.pass.take().map(|pass| pass.id);
        self.stats.passes_aborted += 1;
        tracing::error!(pass = ?pass, error = %err, "render pass aborted");
    }
}

impl<A: TargetAdapter + std::fmt::Debug> std::fmt::Debug for Renderer<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("adapter", &self.adapter)
            .field("config", &self.config)
            .field("mounted", &self.mounted.is_some())
            .field("pass", &self.pass.as_ref().map(|pass| pass.id))
            .field("stats", &self.stats)
            .finish()
    }
}

/// Perform one unit: enter the fiber if it has not been entered, otherwise
/// complete it. Returns the next fiber to visit.
fn perform_unit<H: Clone>(
    tree: &mut FiberTree<H>,
    previous: Option<&FiberTree<H>>,
    queue: &UpdateQueue,
    config: &RendererConfig,
    id: FiberId,
) -> Result<Option<FiberId>> {
    match tree[id].state() {
        WorkState::NotStarted => {
            begin_work(tree, previous, queue, config, id)?;
            tree[id].state = WorkState::Entered;
            match tree[id].first_child() {
                Some(child) => Ok(Some(child)),
                None => Ok(complete_unit(tree, id)),
            }
        }
        WorkState::Entered | WorkState::Complete => Ok(complete_unit(tree, id)),
    }
}

fn begin_work<H: Clone>(
    tree: &mut FiberTree<H>,
    previous: Option<&FiberTree<H>>,
    queue: &UpdateQueue,
    config: &RendererConfig,
    id: FiberId,
) -> Result<()> {
    let fiber = &mut tree[id];
    match fiber.effect_tag() {
        EffectTag::Place => fiber.effects.push(EffectEntry::Place(id)),
        EffectTag::Update => fiber.effects.push(EffectEntry::Update(id)),
        EffectTag::Unchanged | EffectTag::Remove => {}
    }
    let node = fiber.node().clone();
    tracing::trace!(
        fiber = id.index(),
        kind = node.kind().label(),
        tag = ?fiber.effect_tag(),
        "begin work"
    );

    let stats = match node.kind() {
        NodeKind::Component(component) => {
            let carried = match (fiber.previous(), previous) {
                (Some(old), Some(old_tree)) => old_tree[old].hooks.clone(),
                _ => Vec::new(),
            };
            let before = carried.len();
            let mut hooks = Hooks::new(carried, queue.clone(), component.name());
            let child = component
                .render(node.attributes(), &mut hooks)
                .map_err(|err| err.within(component.name()))?;

            let (mut slots, used) = hooks.finish();
            if used < before {
                if config.strict_hooks {
                    return Err(RenderError::HookOrder {
                        component: component.name().to_owned(),
                        index: used,
                        detail: format!("called {used} hooks, previous evaluation called {before}"),
                    });
                }
                tracing::warn!(
                    component = component.name(),
                    before,
                    after = used,
                    "component called fewer hooks than before; dropping trailing records"
                );
                slots.truncate(used);
            }
            tree[id].hooks = slots;
            reconcile_children(tree, id, std::slice::from_ref(&child), previous)
        }
        NodeKind::Text(_) => {
            if !node.children().is_empty() {
                return Err(RenderError::MalformedTree {
                    node: node.kind().label().to_owned(),
                    detail: String::from("text nodes cannot have children"),
                });
            }
            reconcile_children(tree, id, &[], previous)
        }
        NodeKind::Intrinsic(_) => reconcile_children(tree, id, node.children(), previous),
    };

    tracing::trace!(
        fiber = id.index(),
        unchanged = stats.unchanged,
        updated = stats.updated,
        placed = stats.placed,
        removed = stats.removed,
        "children reconciled"
    );
    Ok(())
}

/// Mark a fiber complete and hand its effects to its parent.
fn complete_unit<H>(tree: &mut FiberTree<H>, id: FiberId) -> Option<FiberId> {
    tree[id].state = WorkState::Complete;
    let parent = tree[id].parent()?;
    let effects = tree.take_effects(id);
    tree[parent].effects.extend(effects);
    tree[id].next_sibling().or(Some(parent))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryTarget;
    use crate::node::{element, text};
    use crate::scheduler::UnitBudget;

    fn mounted(root: Node) -> (Renderer<MemoryTarget>, crate::memory::MemHandle) {
        let mut target = MemoryTarget::new();
        let container = target.create_container("app");
        let mut renderer = Renderer::new(target);
        renderer.render(root, container);
        (renderer, container)
    }

    #[test]
    fn idle_without_mount() {
        let mut renderer = Renderer::new(MemoryTarget::new());
        assert_eq!(renderer.work(&mut Unbounded).unwrap(), WorkStatus::Idle);
        assert!(!renderer.has_pending_work());
        assert!(renderer.snapshot().is_none());
    }

    #[test]
    fn one_unit_per_slice_with_unit_budget() {
        let (mut renderer, container) = mounted(element("p").child("hi").build());

        // root, p, "hi" entered; "hi", p, root completed.
        let mut statuses = Vec::new();
        loop {
            let status = renderer.work(&mut UnitBudget::new(1)).unwrap();
            statuses.push(status);
            if matches!(status, WorkStatus::Committed(_)) {
                break;
            }
        }
        assert_eq!(statuses.len(), 5);
        assert!(statuses[..4].iter().all(|s| *s == WorkStatus::Yielded));
        assert_eq!(renderer.adapter().markup(&container), "<app><p>hi</p></app>");
        assert_eq!(renderer.last_commit().map(|c| c.units), Some(5));
    }

    #[test]
    fn effect_list_is_document_order() {
        let mut tree = FiberTree::with_root(
            Node::root(element("div").child(element("a").child("x")).child("y").build()),
            0_u32,
            None,
        );
        let queue = UpdateQueue::new();
        let config = RendererConfig::default();
        let mut next = Some(tree.root());
        while let Some(id) = next {
            next = perform_unit(&mut tree, None, &queue, &config, id).unwrap();
        }

        let root = tree.root();
        let order: Vec<_> = tree.preorder().skip(1).map(EffectEntry::Place).collect();
        assert_eq!(tree[root].effects(), order.as_slice());
        assert!(tree.preorder().all(|id| tree[id].state() == WorkState::Complete));
    }

    #[test]
    fn text_with_children_is_malformed() {
        let bad = Node::new(NodeKind::Text("t".into()), Default::default(), vec![text("x")]);
        let (mut renderer, container) = mounted(element("div").child(bad).build());

        let err = renderer.flush().unwrap_err();
        assert!(matches!(err, RenderError::MalformedTree { .. }));
        assert!(renderer.adapter().children(&container).is_empty());
        assert_eq!(renderer.stats().passes_aborted, 1);
    }

    #[test]
    fn render_replaces_pass_in_flight() {
        let (mut renderer, container) = mounted(element("p").build());
        renderer.work(&mut UnitBudget::new(1)).unwrap();

        renderer.render(element("h1").build(), container);
        renderer.flush().unwrap();

        assert_eq!(renderer.stats().passes_discarded, 1);
        assert_eq!(renderer.stats().passes_committed, 1);
        assert_eq!(renderer.adapter().markup(&container), "<app><h1></h1></app>");
    }

    #[test]
    fn new_container_moves_the_tree() {
        let (mut renderer, first) = mounted(element("p").child("hi").build());
        renderer.flush().unwrap();

        let second = renderer.adapter_mut().create_container("other");
        renderer.render(element("p").child("hi").build(), second);
        renderer.flush().unwrap();

        assert_eq!(renderer.adapter().markup(&first), "<app></app>");
        assert_eq!(renderer.adapter().markup(&second), "<other><p>hi</p></other>");
        assert_eq!(renderer.container(), Some(&second));
    }

    #[test]
    fn unmount_detaches_everything() {
        let (mut renderer, container) = mounted(element("ul").child(element("li")).build());
        renderer.flush().unwrap();

        renderer.unmount().unwrap();
        assert_eq!(renderer.adapter().markup(&container), "<app></app>");
        assert!(renderer.committed().is_none());
        assert!(!renderer.has_pending_work());
    }
}
