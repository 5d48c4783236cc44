//! Per-operation in-flight flags behind the four action buttons.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Generate,
    Optimize,
    Compare,
    RunTests,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Generate,
        Operation::Optimize,
        Operation::Compare,
        Operation::RunTests,
    ];

    fn index(self) -> usize {
        match self {
            Operation::Generate => 0,
            Operation::Optimize => 1,
            Operation::Compare => 2,
            Operation::RunTests => 3,
        }
    }

    pub fn idle_label(self) -> &'static str {
        match self {
            Operation::Generate => "Generate network",
            Operation::Optimize => "Find path",
            Operation::Compare => "Compare algorithms",
            Operation::RunTests => "Run tests",
        }
    }

    pub fn busy_label(self) -> &'static str {
        match self {
            Operation::Generate => "⏳ Generating...",
            Operation::Optimize => "⏳ Optimizing...",
            Operation::Compare => "⏳ Comparing...",
            Operation::RunTests => "⏳ Running tests...",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Operation::Generate => "generate",
            Operation::Optimize => "optimize",
            Operation::Compare => "compare",
            Operation::RunTests => "run-tests",
        };
        write!(f, "{name}")
    }
}

/// Shared pending flags. Cloning yields a handle to the same flags.
#[derive(Debug, Clone, Default)]
pub struct Controls {
    pending: Arc<[AtomicBool; 4]>,
}

impl Controls {
    /// Marks `op` as pending. Returns `None` if it already is.
    pub fn try_begin(&self, op: Operation) -> Option<ControlGuard> {
        self.pending[op.index()]
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ControlGuard {
                controls: self.clone(),
                op,
            })
    }

    fn finish(&self, op: Operation) {
        self.pending[op.index()].store(false, Ordering::Release);
    }

    pub fn is_pending(&self, op: Operation) -> bool {
        self.pending[op.index()].load(Ordering::Acquire)
    }

    pub fn is_enabled(&self, op: Operation) -> bool {
        !self.is_pending(op)
    }

    pub fn any_pending(&self) -> bool {
        Operation::ALL.iter().any(|op| self.is_pending(*op))
    }

    pub fn label(&self, op: Operation) -> &'static str {
        if self.is_pending(op) {
            op.busy_label()
        } else {
            op.idle_label()
        }
    }
}

/// Holds an operation in the pending state; dropping it re-enables the control.
#[derive(Debug)]
pub struct ControlGuard {
    controls: Controls,
    op: Operation,
}

impl ControlGuard {
    pub fn operation(&self) -> Operation {
        self.op
    }
}

impl Drop for ControlGuard {
    fn drop(&mut self) {
        self.controls.finish(self.op);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_resets_control() {
        let controls = Controls::default();
        let guard = controls.try_begin(Operation::Optimize).unwrap();
        assert!(controls.is_pending(Operation::Optimize));
        assert_eq!(controls.label(Operation::Optimize), "⏳ Optimizing...");
        assert!(controls.try_begin(Operation::Optimize).is_none());
        assert!(controls.is_enabled(Operation::Compare));
        drop(guard);
        assert!(controls.is_enabled(Operation::Optimize));
        assert_eq!(controls.label(Operation::Optimize), "Find path");
    }

    #[test]
    fn test_guard_resets_on_panic() {
        let controls = Controls::default();
        let shared = controls.clone();
        let result = std::panic::catch_unwind(move || {
            let _guard = shared.try_begin(Operation::RunTests).unwrap();
            panic!("handler failed");
        });
        assert!(result.is_err());
        assert!(!controls.any_pending());
    }
}
