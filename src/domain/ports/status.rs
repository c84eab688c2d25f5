//! Status sink port - plain-text status line output.

/// Trait for the status line sink.
///
/// Status lines are operator-facing progress messages, distinct from
/// structured tracing. Implementations mirror them to stdout and may
/// persist them best-effort; a sink must never fail the caller.
pub trait StatusSink: Send + Sync {
    /// Emit one status line.
    fn status(&self, message: &str);
}

/// Sink that drops everything. Useful in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStatusSink;

impl StatusSink for NullStatusSink {
    fn status(&self, _message: &str) {}
}
