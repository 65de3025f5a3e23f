//! Renderer Configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables of one renderer.
///
/// Deserializes from partial documents; missing fields take their defaults.
///
/// ```rust,ignore
/// let config = RendererConfig::from_json(r#"{ "slice_budget_ms": 8 }"#)?;
/// assert_eq!(config.max_passes_per_flush, 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Length of one idle slice in milliseconds, used by
    /// [`Renderer::idle_deadline`](crate::scheduler::Renderer::idle_deadline).
    pub slice_budget_ms: u64,

    /// Passes [`Renderer::flush`](crate::scheduler::Renderer::flush) may run
    /// before it reports a render loop.
    pub max_passes_per_flush: usize,

    /// Treat a component calling fewer hooks than before as an error
    /// instead of a warning.
    pub strict_hooks: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            slice_budget_ms: 5,
            max_passes_per_flush: 64,
            strict_hooks: false,
        }
    }
}

impl RendererConfig {
    /// Set the idle slice length.
    pub fn with_slice_budget(mut self, budget: Duration) -> Self {
        self.slice_budget_ms = u64::try_from(budget.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the pass limit of `flush`.
    pub fn with_max_passes(mut self, limit: usize) -> Self {
        self.max_passes_per_flush = limit;
        self
    }

    /// Enable or disable strict hook checks.
    pub fn with_strict_hooks(mut self, strict: bool) -> Self {
        self.strict_hooks = strict;
        self
    }

    /// Idle slice length.
    pub fn slice_budget(&self) -> Duration {
        Duration::from_millis(self.slice_budget_ms)
    }

    /// Parse a JSON document.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
