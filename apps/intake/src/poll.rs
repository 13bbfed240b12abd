//! Repeating re-fetch with a hard no-callback-after-close guarantee.
//!
//! Every tick issues a fetch on its own task, so slow fetches from consecutive ticks may
//! overlap and resolve in any order (last resolved wins). Each settled fetch passes
//! through a shared gate before reaching a callback; `close()` shuts the gate under the
//! same lock, so once it returns nothing else is delivered. In-flight requests are not
//! aborted, only their results are dropped.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::errors::ClientError;

// `tokio::time::interval` panics on a zero period.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

pub type ResultFn<T> = Arc<dyn Fn(T) + Send + Sync>;
pub type ErrorFn = Arc<dyn Fn(ClientError) + Send + Sync>;

/// Delivery gate shared by the timer loop and every in-flight fetch.
struct Gate {
    active: Mutex<bool>,
}

impl Gate {
    /// Runs `deliver` only while the session is open. The lock is held for the duration
    /// of the callback, so callbacks must not close their own session.
    fn deliver(&self, deliver: impl FnOnce()) -> bool {
        let active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if !*active {
            return false;
        }
        deliver();
        true
    }

    fn shut(&self) -> bool {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *active, false)
    }

    fn is_open(&self) -> bool {
        *self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct PollSession;

impl PollSession {
    /// Fetches immediately, then every `interval`, until the returned handle is closed
    /// or dropped. Errors go to `on_error` and do not stop the loop.
    pub fn open<T, F, Fut>(
        fetch: F,
        interval: Duration,
        on_result: ResultFn<T>,
        on_error: ErrorFn,
    ) -> PollHandle
    where
        T: Send + 'static,
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, ClientError>> + Send + 'static,
    {
        let gate = Arc::new(Gate {
            active: Mutex::new(true),
        });
        let cancel = CancellationToken::new();
        let interval = interval.max(MIN_INTERVAL);
        debug!("poll session opened (interval {}ms)", interval.as_millis());

        let loop_gate = gate.clone();
        let loop_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = loop_cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let pending = fetch();
                        let gate = loop_gate.clone();
                        let on_result = on_result.clone();
                        let on_error = on_error.clone();
                        tokio::spawn(async move {
                            let outcome = pending.await;
                            let delivered = gate.deliver(|| match outcome {
                                Ok(value) => on_result(value),
                                Err(e) => on_error(e),
                            });
                            if !delivered {
                                debug!("poll result discarded after close");
                            }
                        });
                    }
                }
            }
        });

        PollHandle {
            gate,
            cancel,
            task: Some(task),
        }
    }
}

/// Owner of a running poll loop. Dropping it closes the session.
pub struct PollHandle {
    gate: Arc<Gate>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    /// Idempotent. Stops the timer and guarantees no callback fires after this returns.
    pub fn close(&mut self) {
        let was_open = self.gate.shut();
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
        if was_open {
            debug!("poll session closed");
        }
    }

    pub fn is_active(&self) -> bool {
        self.gate.is_open()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.close();
    }
}
