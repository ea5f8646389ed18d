use std::cell::Cell;
use std::fmt;

use crate::stats::ContextStats;

/// Notice emitted once when a context exhausts its warning budget.
pub const WARNINGS_EXHAUSTED: &str =
    "WebGL: No further warnings will be reported for this context.";

/// Fire-and-forget sink for user-visible console warnings.
pub trait DiagnosticSink {
    fn warn(&self, message: &str);
}

impl<F: Fn(&str)> DiagnosticSink for F {
    fn warn(&self, message: &str) {
        self(message)
    }
}

/// Default sink: forwards console warnings to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl DiagnosticSink for TracingDiagnostics {
    fn warn(&self, message: &str) {
        tracing::warn!(target: "ember_gl::console", "{message}");
    }
}

/// Per-context warning reporter with a fixed budget.
pub(crate) struct Diagnostics {
    sink: Box<dyn DiagnosticSink>,
    max_warnings: u32,
    emitted: Cell<u32>,
}

impl Diagnostics {
    pub(crate) fn new(sink: Box<dyn DiagnosticSink>, max_warnings: u32) -> Self {
        Self {
            sink,
            max_warnings,
            emitted: Cell::new(0),
        }
    }

    /// Reports a warning unless the budget is spent. Returns whether it reached the sink.
    pub(crate) fn warn(&self, stats: &ContextStats, args: fmt::Arguments<'_>) -> bool {
        let emitted = self.emitted.get();
        if emitted >= self.max_warnings {
            stats.inc_warnings_suppressed();
            return false;
        }

        self.sink.warn(&format!("WebGL warning: {args}"));
        stats.inc_warnings_emitted();

        let emitted = emitted + 1;
        self.emitted.set(emitted);
        if emitted == self.max_warnings {
            self.sink.warn(WARNINGS_EXHAUSTED);
        }
        true
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("max_warnings", &self.max_warnings)
            .field("emitted", &self.emitted.get())
            .finish_non_exhaustive()
    }
}
