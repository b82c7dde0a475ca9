/// A trait for reporting progress of long-running operations.
pub trait Progress: Send + Sync {
    /// Set the phase label for the current operation (e.g., "memberships", "followers").
    fn set_phase(&self, phase: &str);

    /// Report determinate progress: `current` units out of `total` are done.
    fn set_determinate(&self, total: u64, current: u64, message: &str);

    /// Report indeterminate progress, for work whose total is unknown.
    fn set_indeterminate(&self, message: &str);

    /// Print a line above the progress indicator without disturbing it.
    fn println(&self, msg: &str);

    /// Finish and clear the progress indicator.
    fn done(&self);
}

/// A progress sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn set_phase(&self, _phase: &str) {}
    fn set_determinate(&self, _total: u64, _current: u64, _message: &str) {}
    fn set_indeterminate(&self, _message: &str) {}
    fn println(&self, _msg: &str) {}
    fn done(&self) {}
}
