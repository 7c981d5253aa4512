//! Per-key bookkeeping for single-flight fills.
//!
//! The first caller to miss a key registers a [`Flight`] for it and becomes
//! the leader. Later callers for the same key wait on that flight instead of
//! running their own producer. No container lock is held while the leader's
//! producer runs.

use core::hash::Hash;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;

#[cfg(feature = "hashbrown")]
use hashbrown::HashMap;

#[cfg(not(feature = "hashbrown"))]
use std::collections::HashMap;

/// Fills currently running, by key.
pub(crate) type FlightMap<K, V> = HashMap<K, Arc<Flight<V>>>;

enum FlightState<V> {
    Running,
    Landed(V),
    Abandoned,
}

/// One producer call that other callers can wait on.
pub(crate) struct Flight<V> {
    state: Mutex<FlightState<V>>,
    done: Condvar,
}

impl<V: Clone> Flight<V> {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(FlightState::Running),
            done: Condvar::new(),
        }
    }

    /// Blocks until the leader finishes.
    ///
    /// Returns the produced value, or `None` if the producer failed or
    /// panicked. In that case nothing was stored and the caller should retry.
    pub(crate) fn wait(&self) -> Option<V> {
        let mut state = self.state.lock();
        while matches!(*state, FlightState::Running) {
            self.done.wait(&mut state);
        }
        match &*state {
            FlightState::Landed(value) => Some(value.clone()),
            _ => None,
        }
    }

    fn finish(&self, outcome: FlightState<V>) {
        *self.state.lock() = outcome;
        self.done.notify_all();
    }
}

/// Held by the leader while its producer runs.
///
/// Dropping it unregisters the flight and wakes every waiter, with the value
/// set through [`land`](Self::land) or, if there is none (an error or a
/// panic), with a failure. The value must already be in the cache before the
/// landing is dropped, so a caller that finds no flight finds the value.
pub(crate) struct Landing<'a, K: Hash + Eq, V: Clone> {
    in_flight: &'a Mutex<FlightMap<K, V>>,
    key: &'a K,
    flight: Arc<Flight<V>>,
    value: Option<V>,
}

impl<'a, K: Hash + Eq, V: Clone> Landing<'a, K, V> {
    pub(crate) fn new(in_flight: &'a Mutex<FlightMap<K, V>>, key: &'a K, flight: Arc<Flight<V>>) -> Self {
        Self {
            in_flight,
            key,
            flight,
            value: None,
        }
    }

    pub(crate) fn land(&mut self, value: V) {
        self.value = Some(value);
    }
}

impl<K: Hash + Eq, V: Clone> Drop for Landing<'_, K, V> {
    fn drop(&mut self) {
        self.in_flight.lock().remove(self.key);
        let outcome = match self.value.take() {
            Some(value) => FlightState::Landed(value),
            None => FlightState::Abandoned,
        };
        self.flight.finish(outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_waiters_receive_landed_value() {
        let in_flight: Mutex<FlightMap<u32, u32>> = Mutex::new(HashMap::new());
        let flight = Arc::new(Flight::new());
        in_flight.lock().insert(1, Arc::clone(&flight));

        let waiter = {
            let flight = Arc::clone(&flight);
            thread::spawn(move || flight.wait())
        };
        thread::sleep(Duration::from_millis(20));

        let key = 1;
        let mut landing = Landing::new(&in_flight, &key, flight);
        landing.land(7);
        drop(landing);

        assert_eq!(waiter.join().unwrap(), Some(7));
        assert!(in_flight.lock().is_empty());
    }

    #[test]
    fn test_dropped_landing_abandons_flight() {
        let in_flight: Mutex<FlightMap<u32, u32>> = Mutex::new(HashMap::new());
        let flight = Arc::new(Flight::new());
        in_flight.lock().insert(1, Arc::clone(&flight));

        let key = 1;
        drop(Landing::new(&in_flight, &key, Arc::clone(&flight)));

        assert_eq!(flight.wait(), None);
        assert!(in_flight.lock().is_empty());
    }
}
