use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

/// Level triggered stop flag, cloned handles share the same state.
///
/// Once stopped it stays stopped. Waiters are woken up immediately.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        let (lock, cvar) = &*self.inner;
        let mut stopped = lock.lock().unwrap_or_else(PoisonError::into_inner);
        *stopped = true;
        cvar.notify_all();
    }

    pub fn is_stopped(&self) -> bool {
        let (lock, _) = &*self.inner;
        *lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block for at most `dur`, returns whether the signal fired.
    pub fn wait_timeout(&self, dur: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let stopped = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let (stopped, _) = cvar
            .wait_timeout_while(stopped, dur, |stopped| !*stopped)
            .unwrap_or_else(PoisonError::into_inner);
        *stopped
    }
}
