//! Background sweep thread owned by an expiring cache.
//!
//! The thread wakes on a fixed schedule and runs the supplied tick. Ticks
//! that would have fired while a previous tick was still running are dropped,
//! not queued. Dropping the [`Sweeper`] signals the thread and joins it.

use core::fmt;
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const THREAD_NAME: &str = "expiring-cache-sweep";

#[derive(Default)]
struct StopSignal {
    stopped: Mutex<bool>,
    wake: Condvar,
}

/// Handle to a running sweep thread.
pub(crate) struct Sweeper {
    signal: Arc<StopSignal>,
    interval: Duration,
    handle: Option<JoinHandle<()>>,
}

impl Sweeper {
    /// Spawns the sweep thread, running `tick` every `interval`.
    pub(crate) fn spawn<F>(interval: Duration, mut tick: F) -> io::Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let signal = Arc::new(StopSignal::default());
        let thread_signal = Arc::clone(&signal);

        let handle = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || {
                tracing::debug!(?interval, "sweeper started");
                let mut stopped = thread_signal.stopped.lock();
                let mut next = advance(Instant::now(), interval);

                loop {
                    if !wait_for_tick(&thread_signal.wake, &mut stopped, next) {
                        break;
                    }
                    MutexGuard::unlocked(&mut stopped, &mut tick);

                    next = advance(next, interval);
                    let now = Instant::now();
                    if next <= now {
                        tracing::trace!("sweep overran its interval, dropping missed ticks");
                        next = advance(now, interval);
                    }
                }
                tracing::debug!("sweeper stopped");
            })?;

        Ok(Self {
            signal,
            interval,
            handle: Some(handle),
        })
    }

    /// Returns the configured tick interval.
    pub(crate) fn interval(&self) -> Duration {
        self.interval
    }
}

/// Sleeps until `deadline` or until stopped. Returns `false` when stopped.
fn wait_for_tick(wake: &Condvar, stopped: &mut MutexGuard<'_, bool>, deadline: Instant) -> bool {
    while !**stopped {
        if wake.wait_until(stopped, deadline).timed_out() {
            return !**stopped;
        }
    }
    false
}

fn advance(from: Instant, interval: Duration) -> Instant {
    from.checked_add(interval)
        .or_else(|| from.checked_add(Duration::from_secs(60 * 60 * 24 * 365 * 30)))
        .unwrap_or(from)
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        *self.signal.stopped.lock() = true;
        self.signal.wake.notify_all();

        if let Some(handle) = self.handle.take() {
            if let Err(payload) = handle.join() {
                let panic = payload
                    .downcast_ref::<&str>()
                    .copied()
                    .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
                    .unwrap_or("<non-string payload>");
                tracing::warn!(panic, "sweep thread had panicked, expired entries were no longer swept");
            }
        }
    }
}

impl fmt::Debug for Sweeper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sweeper")
            .field("interval", &self.interval)
            .field("running", &self.handle.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_ticks_until_dropped() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let sweeper = Sweeper::spawn(Duration::from_millis(10), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
        assert_eq!(sweeper.interval(), Duration::from_millis(10));

        thread::sleep(Duration::from_millis(100));
        drop(sweeper);

        let after_drop = ticks.load(Ordering::SeqCst);
        assert!(after_drop >= 2, "expected several ticks, got {after_drop}");

        thread::sleep(Duration::from_millis(50));
        assert_eq!(ticks.load(Ordering::SeqCst), after_drop);
    }

    #[test]
    fn test_drop_after_panicking_tick() {
        let sweeper = Sweeper::spawn(Duration::from_millis(5), || panic!("tick failed")).unwrap();
        let handle = sweeper.handle.as_ref().unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        while !handle.is_finished() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(handle.is_finished());

        // The join error is logged, not propagated.
        drop(sweeper);
    }

    #[test]
    fn test_drop_does_not_wait_for_interval() {
        let sweeper = Sweeper::spawn(Duration::from_secs(3600), || {}).unwrap();
        let start = Instant::now();
        drop(sweeper);
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
