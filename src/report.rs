use std::sync::atomic::{AtomicU32, Ordering};

/// Sink for user-facing status lines and progress-bar increments.
///
/// Passed explicitly into submission and polling so that callers decide
/// where messages go (a host UI, logs, or nowhere).
pub trait Reporter: Send + Sync {
    /// Free-form status text.
    fn status(&self, message: &str);

    /// A failure about to be returned to the caller. Defaults to [`status`](Reporter::status).
    fn error(&self, message: &str) {
        self.status(message);
    }

    /// Advance the progress bar by `delta` percentage points.
    fn advance(&self, delta: u32);

    /// A new job starts polling; its progress counts up from zero again.
    fn start_job(&self) {}
}

/// Forwards everything to `tracing` events.
#[derive(Debug, Default)]
pub struct TracingReporter {
    total: AtomicU32,
}

impl TracingReporter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Reporter for TracingReporter {
    fn status(&self, message: &str) {
        tracing::info!(target: "letzai::status", "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "letzai::status", "{}", message);
    }

    fn advance(&self, delta: u32) {
        let total = self.total.fetch_add(delta, Ordering::Relaxed) + delta;
        tracing::debug!(target: "letzai::progress", delta, total, "progress");
    }

    fn start_job(&self) {
        self.total.store(0, Ordering::Relaxed);
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl Reporter for NoopReporter {
    fn status(&self, _message: &str) {}
    fn advance(&self, _delta: u32) {}
}

/// Turns absolute progress readings into forward-only increments.
///
/// The API may report a lower percentage on a later poll; those readings
/// produce no increment, so the cumulative total never decreases.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    last: u8,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Highest percentage seen so far.
    pub fn current(&self) -> u8 {
        self.last
    }

    /// Record a reading and return the positive delta since the previous high.
    pub fn update(&mut self, progress: u8) -> u32 {
        let progress = progress.min(100);
        if progress > self.last {
            let delta = u32::from(progress - self.last);
            self.last = progress;
            delta
        } else {
            0
        }
    }

    /// Forward the delta for `progress` to `reporter`, if any.
    pub fn report(&mut self, progress: u8, reporter: &dyn Reporter) {
        let delta = self.update(progress);
        if delta > 0 {
            reporter.advance(delta);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        deltas: Mutex<Vec<u32>>,
    }

    impl Reporter for Recorder {
        fn status(&self, _message: &str) {}
        fn advance(&self, delta: u32) {
            self.deltas.lock().unwrap().push(delta);
        }
    }

    #[test]
    fn test_tracker_forwards_increments() {
        let mut tracker = ProgressTracker::new();
        assert_eq!(tracker.update(0), 0);
        assert_eq!(tracker.update(40), 40);
        assert_eq!(tracker.update(75), 35);
        assert_eq!(tracker.update(100), 25);
        assert_eq!(tracker.current(), 100);
    }

    #[test]
    fn test_tracker_ignores_regression() {
        let mut tracker = ProgressTracker::new();
        assert_eq!(tracker.update(80), 80);
        assert_eq!(tracker.update(60), 0);
        assert_eq!(tracker.current(), 80);
        assert_eq!(tracker.update(90), 10);
    }

    #[test]
    fn test_report_skips_zero_deltas() {
        let recorder = Recorder::default();
        let mut tracker = ProgressTracker::new();
        for p in [10, 10, 5, 50] {
            tracker.report(p, &recorder);
        }
        assert_eq!(*recorder.deltas.lock().unwrap(), vec![10, 40]);
    }

    #[test]
    fn test_tracing_reporter_accumulates() {
        let reporter = TracingReporter::new();
        reporter.advance(30);
        reporter.advance(20);
        assert_eq!(reporter.total.load(Ordering::Relaxed), 50);
    }

    #[test]
    fn test_tracing_reporter_resets_between_jobs() {
        let reporter = TracingReporter::new();
        reporter.advance(100);
        reporter.start_job();
        reporter.advance(40);
        assert_eq!(reporter.total.load(Ordering::Relaxed), 40);
    }
}
