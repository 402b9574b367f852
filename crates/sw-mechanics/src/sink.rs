//! Where check results and warnings go.

use crate::check::CheckResult;
use crate::error::Precondition;

/// Receives every resolved check and every precondition warning.
pub trait ResultSink {
    /// A check completed.
    fn record(&mut self, result: &CheckResult);

    /// A check could not go ahead.
    fn warn(&mut self, warning: &Precondition);
}

/// Collects results in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    /// Recorded results, oldest first.
    pub results: Vec<CheckResult>,
    /// Warnings, oldest first.
    pub warnings: Vec<Precondition>,
}

impl MemorySink {
    /// An empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rendered warnings, as a user would see them.
    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(ToString::to_string).collect()
    }
}

impl ResultSink for MemorySink {
    fn record(&mut self, result: &CheckResult) {
        self.results.push(result.clone());
    }

    fn warn(&mut self, warning: &Precondition) {
        self.warnings.push(warning.clone());
    }
}

/// Forwards results to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ResultSink for TracingSink {
    fn record(&mut self, result: &CheckResult) {
        tracing::info!(kind = ?result.kind, total = result.total(), "{result}");
    }

    fn warn(&mut self, warning: &Precondition) {
        tracing::warn!("{warning}");
    }
}
