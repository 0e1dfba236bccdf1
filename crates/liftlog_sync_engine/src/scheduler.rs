//! Debounced sync scheduling.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

type SyncFn = Arc<dyn Fn() -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

#[derive(Default)]
struct TimerState {
    generation: u64,
    pending: Option<JoinHandle<()>>,
}

impl TimerState {
    /// Invalidates and aborts the pending timer, returning the new
    /// generation. Callers hold the lock, so the bump and the abort are one
    /// atomic step.
    fn bump(&mut self) -> u64 {
        self.generation += 1;
        if let Some(previous) = self.pending.take() {
            previous.abort();
        }
        self.generation
    }
}

/// Coalesces bursts of local writes into one sync cycle.
///
/// [`notify_write`](SyncScheduler::notify_write) restarts the debounce
/// timer; the cycle runs only after the configured quiet period with no
/// further writes. [`trigger_now`](SyncScheduler::trigger_now) bypasses the
/// window, cancelling any pending timer. Cancellation only ever reaches a
/// timer that has not fired: once a cycle starts it always runs to
/// completion, and overlapping cycles are not guarded here — push/pull
/// idempotence is the safety argument.
pub struct SyncScheduler {
    sync_fn: SyncFn,
    debounce: Duration,
    timer: Arc<Mutex<TimerState>>,
}

impl SyncScheduler {
    /// Creates a scheduler running `sync_fn` after each quiet period.
    pub fn new<F, Fut>(debounce: Duration, sync_fn: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            sync_fn: Arc::new(move || Box::pin(sync_fn())),
            debounce,
            timer: Arc::new(Mutex::new(TimerState::default())),
        }
    }

    /// Signals that a local write committed; (re)starts the debounce timer.
    pub fn notify_write(&self) {
        let sync_fn = Arc::clone(&self.sync_fn);
        let timer = Arc::clone(&self.timer);
        let delay = self.debounce;

        let mut state = self.timer.lock();
        let generation = state.bump();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut state = timer.lock();
                // A newer write or an explicit trigger superseded this timer.
                if state.generation != generation {
                    return;
                }
                // Past this point the cycle is in flight and unabortable.
                state.pending = None;
            }
            sync_fn().await;
        });
        state.pending = Some(handle);
    }

    /// Starts a cycle immediately, cancelling any pending timer.
    pub fn trigger_now(&self) {
        let sync_fn = Arc::clone(&self.sync_fn);
        self.timer.lock().bump();
        tokio::spawn(async move {
            sync_fn().await;
        });
    }

    /// Cancels a pending timer, if any. A cycle already running completes.
    pub fn cancel(&self) {
        self.timer.lock().bump();
    }
}

impl Drop for SyncScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}
