//! Debounced background flushing.
//!
//! A [`FlushScheduler`] owns one worker thread and one cancellable deadline.
//! Every [`schedule`](FlushScheduler::schedule) replaces the deadline with
//! `now + delay`, so a burst of writes produces a single flush once the
//! burst has been quiet for `delay`. The worker calls [`Flush::flush`] with
//! the timer lock released.

use crate::error::CoreResult;
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Result of a flush attempt that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// A document was written.
    Written,
    /// Nothing was dirty; no write happened.
    Clean,
}

/// Something the scheduler can flush.
pub trait Flush: Send + Sync {
    /// Persists pending state.
    ///
    /// # Errors
    ///
    /// Returns the persistence error. The implementation must leave itself
    /// in a state where a later call retries.
    fn flush(&self) -> CoreResult<FlushOutcome>;
}

#[derive(Debug, Default)]
struct TimerState {
    deadline: Option<Instant>,
    stopped: bool,
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<TimerState>,
    wake: Condvar,
}

/// Debounce timer plus the worker thread that fires it.
pub struct FlushScheduler {
    shared: Arc<Shared>,
    delay: Duration,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for FlushScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlushScheduler")
            .field("delay", &self.delay)
            .field("pending", &self.is_pending())
            .finish_non_exhaustive()
    }
}

impl FlushScheduler {
    /// Starts the worker thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn start(target: Arc<dyn Flush>, delay: Duration) -> CoreResult<Self> {
        let shared = Arc::new(Shared::default());
        let handle = thread::Builder::new()
            .name("lorestore-flush".to_owned())
            .spawn({
                let shared = Arc::clone(&shared);
                move || run_worker(&shared, target.as_ref())
            })?;

        Ok(Self {
            shared,
            delay,
            worker: Mutex::new(Some(handle)),
        })
    }

    /// The debounce delay.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// (Re)starts the timer. Any pending deadline is replaced, not extended.
    ///
    /// Does nothing once the scheduler is stopped.
    pub fn schedule(&self) {
        let mut state = self.shared.state.lock();
        if state.stopped {
            return;
        }
        state.deadline = Some(Instant::now() + self.delay);
        self.shared.wake.notify_one();
    }

    /// Cancels the pending deadline, if any.
    pub fn cancel(&self) {
        let mut state = self.shared.state.lock();
        state.deadline = None;
        self.shared.wake.notify_one();
    }

    /// Returns true if a deadline is pending.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.shared.state.lock().deadline.is_some()
    }

    /// Returns true once [`stop`](Self::stop) has run.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.shared.state.lock().stopped
    }

    /// Cancels any deadline and joins the worker. Does not flush.
    ///
    /// Waits for a flush already in progress to finish.
    pub fn stop(&self) {
        {
            let mut state = self.shared.state.lock();
            state.stopped = true;
            state.deadline = None;
        }
        self.shared.wake.notify_all();

        if let Some(handle) = self.worker.lock().take() {
            if handle.join().is_err() {
                warn!("flush worker panicked");
            }
        }
    }
}

impl Drop for FlushScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_worker(shared: &Shared, target: &dyn Flush) {
    let mut state = shared.state.lock();
    loop {
        if state.stopped {
            return;
        }
        match state.deadline {
            None => shared.wake.wait(&mut state),
            Some(deadline) if Instant::now() < deadline => {
                // The deadline may have moved by the time we wake.
                let _ = shared.wake.wait_until(&mut state, deadline);
            }
            Some(_) => {
                state.deadline = None;
                MutexGuard::unlocked(&mut state, || fire(target));
            }
        }
    }
}

fn fire(target: &dyn Flush) {
    match target.flush() {
        Ok(outcome) => debug!(?outcome, "debounced flush"),
        Err(err) => warn!(error = %err, "debounced flush failed, will retry after next write"),
    }
}
