//! Update Queue
//!
//! The queue is how state setters reach the renderer. A setter never touches
//! fibers: it raises a re-render request here, and the work loop picks the
//! request up at its next unit boundary. Each renderer owns its own queue,
//! so independent roots never share scheduling state.
//!
//! The queue is `Send + Sync` so that setters can be handed to host threads
//! (timers, I/O callbacks). The renderer itself stays on one thread.

use std::sync::Arc;

use parking_lot::Mutex;

#[derive(Debug, Default)]
struct QueueState {
    /// A re-render was requested and not yet picked up.
    pending: bool,

    /// A re-render was requested from a record of the pass in flight; it
    /// waits until no pass is in flight.
    held: bool,

    /// Total requests ever raised.
    requests: u64,

    /// Component whose setter raised the most recent request.
    last_source: Option<&'static str>,
}

/// Shared re-render request flag of one renderer.
#[derive(Debug, Clone, Default)]
pub struct UpdateQueue {
    inner: Arc<Mutex<QueueState>>,
}

impl UpdateQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a fresh render pass.
    ///
    /// Requests coalesce: any number of requests before the work loop looks
    /// again result in one new pass.
    pub fn request_render(&self, source: &'static str) {
        let mut state = self.inner.lock();
        state.pending = true;
        state.requests += 1;
        state.last_source = Some(source);
        tracing::trace!(source, requests = state.requests, "re-render requested");
    }

    /// Request a pass once the pass in flight has committed.
    pub(crate) fn request_after_commit(&self, source: &'static str) {
        let mut state = self.inner.lock();
        state.held = true;
        state.requests += 1;
        state.last_source = Some(source);
        tracing::trace!(source, requests = state.requests, "re-render held until commit");
    }

    /// Whether a request is waiting.
    pub fn is_pending(&self) -> bool {
        self.inner.lock().pending
    }

    /// Whether a request is held back until the pass in flight commits.
    pub fn is_held(&self) -> bool {
        self.inner.lock().held
    }

    /// Turn a held request into a pending one.
    pub(crate) fn release_held(&self) {
        let mut state = self.inner.lock();
        if std::mem::take(&mut state.held) {
            state.pending = true;
        }
    }

    /// Consume the pending request, returning whether there was one.
    pub(crate) fn take(&self) -> bool {
        std::mem::take(&mut self.inner.lock().pending)
    }

    /// Total number of requests raised over the queue's lifetime.
    pub fn total_requests(&self) -> u64 {
        self.inner.lock().requests
    }

    /// Component that raised the most recent request.
    pub fn last_source(&self) -> Option<&'static str> {
        self.inner.lock().last_source
    }
}
