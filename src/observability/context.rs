//! Thread-local context tracking for crash reports.
//!
//! Each thread (including rayon workers in batch mode) records which
//! pipeline phase it is in and which input it is working on. Guards restore
//! the previous context on drop, so phases nest.

use std::cell::RefCell;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

static INPUTS_PROCESSED: AtomicUsize = AtomicUsize::new(0);
static INPUTS_TOTAL: AtomicUsize = AtomicUsize::new(0);

thread_local! {
    static CURRENT_CONTEXT: RefCell<PipelineContext> = const { RefCell::new(PipelineContext::new()) };
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineContext {
    pub phase: Option<PipelinePhase>,
    pub current_input: Option<PathBuf>,
}

impl PipelineContext {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            phase: None,
            current_input: None,
        }
    }
}

/// Stages of one report generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelinePhase {
    Reading,
    Normalizing,
    ComputingMetrics,
    EvaluatingGate,
    Narrative,
    Rendering,
}

impl PipelinePhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reading => "reading",
            Self::Normalizing => "normalizing",
            Self::ComputingMetrics => "computing_metrics",
            Self::EvaluatingGate => "evaluating_gate",
            Self::Narrative => "narrative",
            Self::Rendering => "rendering",
        }
    }
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Restores the previous context when dropped.
pub struct ContextGuard {
    previous: PipelineContext,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        CURRENT_CONTEXT.with(|ctx| {
            *ctx.borrow_mut() = self.previous.clone();
        });
    }
}

#[must_use]
pub fn set_phase(phase: PipelinePhase) -> ContextGuard {
    CURRENT_CONTEXT.with(|ctx| {
        let previous = ctx.borrow().clone();
        ctx.borrow_mut().phase = Some(phase);
        ContextGuard { previous }
    })
}

#[must_use]
pub fn set_current_input(path: impl Into<PathBuf>) -> ContextGuard {
    CURRENT_CONTEXT.with(|ctx| {
        let previous = ctx.borrow().clone();
        ctx.borrow_mut().current_input = Some(path.into());
        ContextGuard { previous }
    })
}

pub fn set_progress(processed: usize, total: usize) {
    INPUTS_PROCESSED.store(processed, Ordering::Relaxed);
    INPUTS_TOTAL.store(total, Ordering::Relaxed);
}

pub fn increment_processed() {
    INPUTS_PROCESSED.fetch_add(1, Ordering::Relaxed);
}

/// Snapshot of this thread's context, read by the panic hook.
#[must_use]
pub fn get_current_context() -> PipelineContext {
    CURRENT_CONTEXT.with(|ctx| ctx.borrow().clone())
}

/// (processed, total) inputs across all threads.
#[must_use]
pub fn get_progress() -> (usize, usize) {
    (
        INPUTS_PROCESSED.load(Ordering::Relaxed),
        INPUTS_TOTAL.load(Ordering::Relaxed),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guards_nest_and_restore() {
        assert_eq!(get_current_context().phase, None);
        {
            let _input = set_current_input("runs.csv");
            let _phase = set_phase(PipelinePhase::Reading);
            {
                let _inner = set_phase(PipelinePhase::Normalizing);
                let ctx = get_current_context();
                assert_eq!(ctx.phase, Some(PipelinePhase::Normalizing));
                assert_eq!(ctx.current_input, Some(PathBuf::from("runs.csv")));
            }
            assert_eq!(get_current_context().phase, Some(PipelinePhase::Reading));
        }
        assert_eq!(get_current_context(), PipelineContext::new());
    }

    #[test]
    fn test_context_is_per_thread() {
        let _phase = set_phase(PipelinePhase::Rendering);
        let other = std::thread::spawn(|| get_current_context().phase)
            .join()
            .unwrap();
        assert_eq!(other, None);
    }

    #[test]
    fn test_phase_names() {
        assert_eq!(PipelinePhase::ComputingMetrics.to_string(), "computing_metrics");
        assert_eq!(PipelinePhase::EvaluatingGate.as_str(), "evaluating_gate");
    }
}
