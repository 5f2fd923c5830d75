//! Runtime counters for dialog resolution and dispatch.
//!
//! Lock-free `AtomicU64` counters incremented on the hot path and read on
//! export. A [`CounterSnapshot`] renders as Prometheus text for server
//! dashboards.

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters for dispatch events.
#[derive(Debug)]
pub struct DispatchCounters {
    /// Interactions that resolved to a dialog.
    pub dialogs_resolved: AtomicU64,
    /// Interactions where no dialog was eligible.
    pub dialogs_unavailable: AtomicU64,
    /// Actions that reached the host.
    pub actions_dispatched: AtomicU64,
    /// Actions skipped because their conditions failed or ordering rules dropped them.
    pub actions_skipped: AtomicU64,
    /// Actions refused as malformed.
    pub actions_refused: AtomicU64,
    /// Commands refused by the blocklist.
    pub commands_blocked: AtomicU64,
    /// Transitions that fell back to closing the dialog.
    pub dialog_fallbacks: AtomicU64,
    /// Execution records written.
    pub executions_recorded: AtomicU64,
}

impl DispatchCounters {
    /// Zeroed counters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            dialogs_resolved: AtomicU64::new(0),
            dialogs_unavailable: AtomicU64::new(0),
            actions_dispatched: AtomicU64::new(0),
            actions_skipped: AtomicU64::new(0),
            actions_refused: AtomicU64::new(0),
            commands_blocked: AtomicU64::new(0),
            dialog_fallbacks: AtomicU64::new(0),
            executions_recorded: AtomicU64::new(0),
        }
    }

    /// Increment `counter` by one.
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot all counters for export.
    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            dialogs_resolved: self.dialogs_resolved.load(Ordering::Relaxed),
            dialogs_unavailable: self.dialogs_unavailable.load(Ordering::Relaxed),
            actions_dispatched: self.actions_dispatched.load(Ordering::Relaxed),
            actions_skipped: self.actions_skipped.load(Ordering::Relaxed),
            actions_refused: self.actions_refused.load(Ordering::Relaxed),
            commands_blocked: self.commands_blocked.load(Ordering::Relaxed),
            dialog_fallbacks: self.dialog_fallbacks.load(Ordering::Relaxed),
            executions_recorded: self.executions_recorded.load(Ordering::Relaxed),
        }
    }
}

impl Default for DispatchCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Counter values at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// Interactions that resolved to a dialog.
    pub dialogs_resolved: u64,
    /// Interactions without an eligible dialog.
    pub dialogs_unavailable: u64,
    /// Actions that reached the host.
    pub actions_dispatched: u64,
    /// Actions skipped.
    pub actions_skipped: u64,
    /// Malformed actions refused.
    pub actions_refused: u64,
    /// Blocked commands.
    pub commands_blocked: u64,
    /// Transition fallbacks.
    pub dialog_fallbacks: u64,
    /// Execution records written.
    pub executions_recorded: u64,
}

impl CounterSnapshot {
    /// Format as Prometheus-compatible text.
    #[must_use]
    pub fn to_prometheus(&self) -> String {
        let rows = [
            ("dialogs_resolved", "Interactions resolved to a dialog", self.dialogs_resolved),
            (
                "dialogs_unavailable",
                "Interactions without an eligible dialog",
                self.dialogs_unavailable,
            ),
            ("actions_dispatched", "Actions dispatched to the host", self.actions_dispatched),
            ("actions_skipped", "Actions skipped by conditions or ordering", self.actions_skipped),
            ("actions_refused", "Malformed actions refused", self.actions_refused),
            ("commands_blocked", "Commands refused by the blocklist", self.commands_blocked),
            (
                "dialog_fallbacks",
                "Dialog transitions that closed the dialog instead",
                self.dialog_fallbacks,
            ),
            ("executions_recorded", "Execution-limit records written", self.executions_recorded),
        ];
        let mut out = String::new();
        for (name, help, value) in rows {
            out.push_str(&format!("# HELP palaver_{name}_total {help}\n"));
            out.push_str(&format!("# TYPE palaver_{name}_total counter\n"));
            out.push_str(&format!("palaver_{name}_total {value}\n"));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_default_zero() {
        let snap = DispatchCounters::new().snapshot();
        assert_eq!(snap, CounterSnapshot::default());
    }

    #[test]
    fn counters_increment_and_snapshot() {
        let c = DispatchCounters::new();
        DispatchCounters::bump(&c.actions_dispatched);
        DispatchCounters::bump(&c.actions_dispatched);
        DispatchCounters::bump(&c.commands_blocked);
        let snap = c.snapshot();
        assert_eq!(snap.actions_dispatched, 2);
        assert_eq!(snap.commands_blocked, 1);
        assert_eq!(snap.actions_refused, 0);
    }

    #[test]
    fn prometheus_format_valid() {
        let c = DispatchCounters::new();
        c.dialogs_resolved.fetch_add(42, Ordering::Relaxed);
        let prom = c.snapshot().to_prometheus();
        assert!(prom.contains("palaver_dialogs_resolved_total 42"));
        assert!(prom.contains("# TYPE palaver_commands_blocked_total counter"));
        assert!(prom.contains("# HELP"));
    }
}
