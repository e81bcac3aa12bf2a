//! Trailing-edge debouncer
//!
//! Each call restarts the quiet window; only the last argument reaches the
//! target once the window elapses without another call.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

type Target<T> = Arc<dyn Fn(T) + Send + Sync>;

/// Last-call-wins timer around a target function
///
/// Must be used from within a tokio runtime.
pub struct Debouncer<T> {
    window: Duration,
    target: Target<T>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Send + 'static> Debouncer<T> {
    #[must_use]
    pub fn new(window: Duration, target: impl Fn(T) + Send + Sync + 'static) -> Self {
        Self {
            window,
            target: Arc::new(target),
            pending: Mutex::new(None),
        }
    }

    /// Restart the window with `arg` as the value to deliver
    pub fn call(&self, arg: T) {
        let target = Arc::clone(&self.target);
        let window = self.window;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            target(arg);
        });
        if let Some(previous) = self.pending.lock().replace(handle) {
            previous.abort();
        }
    }

    /// Drop the pending call, if any
    pub fn cancel(&self) {
        if let Some(previous) = self.pending.lock().take() {
            previous.abort();
        }
    }

    /// Whether a call is waiting for its window to elapse
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    #[inline]
    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.get_mut().take() {
            pending.abort();
        }
    }
}

impl<T> fmt::Debug for Debouncer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Debouncer")
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}
