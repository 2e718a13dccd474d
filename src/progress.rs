//! Progress reporting and cooperative cancellation.
//!
//! Operations report coarse milestones as integers 0-100 through an optional
//! callback. Values are monotone within one run. Cancellation is checked
//! between segment iterations only; a running ffmpeg invocation is never
//! interrupted mid-flight.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

pub type ProgressFn = dyn Fn(u8) + Send + Sync;

/// Wraps an optional progress callback so call sites stay terse.
///
/// Reports are clamped to be non-decreasing within one reporter's lifetime,
/// which keeps the monotonicity guarantee even when the audio splitter
/// switches strategies mid-run.
pub struct ProgressReporter {
    callback: Option<Box<ProgressFn>>,
    last: AtomicU8,
}

impl ProgressReporter {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(u8) + Send + Sync + 'static,
    {
        Self {
            callback: Some(Box::new(callback)),
            last: AtomicU8::new(0),
        }
    }

    pub fn none() -> Self {
        Self {
            callback: None,
            last: AtomicU8::new(0),
        }
    }

    pub fn report(&self, percent: u8) {
        let percent = percent.min(100);
        let last = self.last.load(Ordering::SeqCst);
        if percent < last {
            return;
        }
        self.last.store(percent, Ordering::SeqCst);
        if let Some(cb) = &self.callback {
            cb(percent);
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::none()
    }
}

/// Shared cancellation flag for long-running operations.
#[derive(Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_reporter_clamps_and_records() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let reporter = ProgressReporter::new(move |p| sink.lock().unwrap().push(p));
        reporter.report(10);
        reporter.report(200);
        assert_eq!(*seen.lock().unwrap(), vec![10, 100]);
    }

    #[test]
    fn test_reporter_is_monotone() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let reporter = ProgressReporter::new(move |p| sink.lock().unwrap().push(p));
        reporter.report(30);
        reporter.report(60);
        reporter.report(40);
        reporter.report(100);
        assert_eq!(*seen.lock().unwrap(), vec![30, 60, 100]);
    }

    #[test]
    fn test_cancel_token_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!token.is_cancelled());
        clone.cancel();
        assert!(token.is_cancelled());
    }
}
