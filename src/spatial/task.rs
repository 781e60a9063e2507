//! Full-field task handle: progress reporting and cooperative cancellation

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Shared, lock-free view of a full-field pass's progress.
#[derive(Debug, Clone, Default)]
pub struct ProgressHandle {
    inner: Arc<ProgressCounters>,
}

#[derive(Debug, Default)]
struct ProgressCounters {
    completed: AtomicUsize,
    total: AtomicUsize,
}

impl ProgressHandle {
    pub fn completed(&self) -> usize {
        self.inner.completed.load(Ordering::Acquire)
    }

    pub fn total(&self) -> usize {
        self.inner.total.load(Ordering::Acquire)
    }

    /// Fraction of pixels evaluated, in `[0, 1]`.
    pub fn fraction(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (self.completed() as f64 / total as f64).min(1.0)
    }

    pub fn is_finished(&self) -> bool {
        let total = self.total();
        total > 0 && self.completed() >= total
    }

    fn reset(&self, total: usize) {
        self.inner.completed.store(0, Ordering::Release);
        self.inner.total.store(total, Ordering::Release);
    }

    /// Record one finished pixel, returning the new count.
    fn advance(&self) -> usize {
        self.inner.completed.fetch_add(1, Ordering::AcqRel) + 1
    }
}

/// Callback invoked after every evaluated pixel.
pub type ProgressObserver = Arc<dyn Fn(&ProgressHandle) + Send + Sync>;

/// Handle for one full-field pass.
///
/// Clone the cancellation token (or the task itself) into another thread to
/// stop the pass; workers check it before every pixel evaluation.
#[derive(Clone)]
pub struct FieldTask {
    cancel: CancellationToken,
    progress: ProgressHandle,
    observer: Option<ProgressObserver>,
}

impl fmt::Debug for FieldTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldTask")
            .field("cancelled", &self.is_cancelled())
            .field("progress", &self.progress)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl Default for FieldTask {
    fn default() -> Self {
        Self::with_token(CancellationToken::new())
    }
}

impl FieldTask {
    pub fn new() -> Self {
        Self::default()
    }

    /// Task driven by an externally owned token.
    pub fn with_token(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            progress: ProgressHandle::default(),
            observer: None,
        }
    }

    #[must_use]
    pub fn with_observer<F>(mut self, observer: F) -> Self
    where
        F: Fn(&ProgressHandle) + Send + Sync + 'static,
    {
        self.observer = Some(Arc::new(observer));
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn progress(&self) -> ProgressHandle {
        self.progress.clone()
    }

    pub(crate) fn begin(&self, total: usize) {
        self.progress.reset(total);
    }

    /// Mark one pixel done, notify the observer and log every 10 %.
    pub(crate) fn advance(&self) {
        let done = self.progress.advance();
        let total = self.progress.total();

        if total > 0 {
            let before = (done - 1) * 10 / total;
            let after = done * 10 / total;
            if after > before {
                debug!(percent = after * 10, done, total, "Full-field progress");
            }
        }

        if let Some(observer) = &self.observer {
            observer(&self.progress);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    #[test]
    fn test_progress_fraction() {
        let task = FieldTask::new();
        assert_eq!(task.progress().fraction(), 0.0);

        task.begin(4);
        task.advance();
        assert!((task.progress().fraction() - 0.25).abs() < 1e-12);
        for _ in 0..3 {
            task.advance();
        }
        assert!(task.progress().is_finished());
        assert!((task.progress().fraction() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_observer_sees_progress() {
        let seen = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&seen);
        let task = FieldTask::new().with_observer(move |p| {
            if p.completed() == 2 {
                flag.store(true, Ordering::SeqCst);
            }
        });
        task.begin(3);
        task.advance();
        task.advance();
        assert!(seen.load(Ordering::SeqCst));
    }

    #[test]
    fn test_external_token_cancels() {
        let token = CancellationToken::new();
        let task = FieldTask::with_token(token.clone());
        assert!(!task.is_cancelled());
        token.cancel();
        assert!(task.is_cancelled());
        assert!(task.cancellation_token().is_cancelled());
    }
}
