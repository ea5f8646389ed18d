use std::sync::atomic::{AtomicU64, Ordering};

/// Telemetry counters for a single context (loss, recovery, handle updates).
///
/// Counters are relaxed atomics so a host can read them from another thread
/// while the context itself stays on its owning thread.
#[derive(Debug, Default)]
pub struct ContextStats {
    losses: AtomicU64,
    restores_attempted: AtomicU64,
    restores_succeeded: AtomicU64,
    handle_updates_attempted: AtomicU64,
    handle_updates_succeeded: AtomicU64,
    errors_latched: AtomicU64,
    warnings_emitted: AtomicU64,
    warnings_suppressed: AtomicU64,
}

impl ContextStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_losses(&self) {
        self.losses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_restores_attempted(&self) {
        self.restores_attempted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_restores_succeeded(&self) {
        self.restores_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_handle_updates_attempted(&self) {
        self.handle_updates_attempted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_handle_updates_succeeded(&self) {
        self.handle_updates_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_errors_latched(&self) {
        self.errors_latched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_warnings_emitted(&self) {
        self.warnings_emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_warnings_suppressed(&self) {
        self.warnings_suppressed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ContextStatsSnapshot {
        ContextStatsSnapshot {
            losses: self.losses.load(Ordering::Relaxed),
            restores_attempted: self.restores_attempted.load(Ordering::Relaxed),
            restores_succeeded: self.restores_succeeded.load(Ordering::Relaxed),
            handle_updates_attempted: self.handle_updates_attempted.load(Ordering::Relaxed),
            handle_updates_succeeded: self.handle_updates_succeeded.load(Ordering::Relaxed),
            errors_latched: self.errors_latched.load(Ordering::Relaxed),
            warnings_emitted: self.warnings_emitted.load(Ordering::Relaxed),
            warnings_suppressed: self.warnings_suppressed.load(Ordering::Relaxed),
        }
    }

    /// Returns a JSON object as a string.
    pub fn to_json(&self) -> String {
        self.snapshot().to_json()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContextStatsSnapshot {
    pub losses: u64,
    pub restores_attempted: u64,
    pub restores_succeeded: u64,
    pub handle_updates_attempted: u64,
    pub handle_updates_succeeded: u64,
    pub errors_latched: u64,
    pub warnings_emitted: u64,
    pub warnings_suppressed: u64,
}

impl ContextStatsSnapshot {
    pub fn to_json(self) -> String {
        format!(
            "{{\"losses\":{},\"restores_attempted\":{},\"restores_succeeded\":{},\"handle_updates_attempted\":{},\"handle_updates_succeeded\":{},\"errors_latched\":{},\"warnings\":{{\"emitted\":{},\"suppressed\":{}}}}}",
            self.losses,
            self.restores_attempted,
            self.restores_succeeded,
            self.handle_updates_attempted,
            self.handle_updates_succeeded,
            self.errors_latched,
            self.warnings_emitted,
            self.warnings_suppressed,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_json_contains_counters() {
        let stats = ContextStats::new();
        stats.inc_losses();
        stats.inc_handle_updates_attempted();
        stats.inc_handle_updates_attempted();
        stats.inc_handle_updates_succeeded();
        stats.inc_warnings_suppressed();

        let json = stats.to_json();
        assert!(json.contains("\"losses\":1"));
        assert!(json.contains("\"handle_updates_attempted\":2"));
        assert!(json.contains("\"handle_updates_succeeded\":1"));
        assert!(json.contains("\"suppressed\":1"));
        assert!(json.starts_with('{') && json.ends_with('}'));
    }
}
