use crate::foundation::error::{CardError, CardResult};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};

const POLL_SLICE: Duration = Duration::from_millis(20);

/// Cooperative cancellation flag shared between a caller and an in-flight render.
///
/// Cloning is cheap; all clones observe the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Renders observing this token stop at their next check.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Return `true` once [`CancelToken::cancel`] has been called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Fail with [`CardError::Cancelled`] when cancellation was requested.
    pub fn check(&self) -> CardResult<()> {
        if self.is_cancelled() {
            return Err(CardError::Cancelled);
        }
        Ok(())
    }
}

/// Outcome of a job run under [`run_bounded`].
#[derive(Debug)]
pub(crate) enum Bounded<T> {
    Done(T),
    TimedOut,
    Cancelled,
}

/// Run `job` on a helper thread and wait at most `timeout` for its result.
///
/// When the wait gives up (timeout or cancellation) the helper thread is detached and its result
/// is dropped on arrival.
pub(crate) fn run_bounded<T, F>(
    timeout: Duration,
    cancel: &CancelToken,
    job: F,
) -> CardResult<Bounded<T>>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = mpsc::sync_channel::<T>(1);
    std::thread::Builder::new()
        .name("cardpress-io".to_owned())
        .spawn(move || {
            let _ = tx.send(job());
        })
        .map_err(|e| CardError::render(format!("failed to spawn io thread: {e}")))?;

    let deadline = Instant::now() + timeout;
    loop {
        if cancel.is_cancelled() {
            return Ok(Bounded::Cancelled);
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(Bounded::TimedOut);
        }
        match rx.recv_timeout((deadline - now).min(POLL_SLICE)) {
            Ok(v) => return Ok(Bounded::Done(v)),
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                return Err(CardError::render("io thread exited without a result"));
            }
        }
    }
}
