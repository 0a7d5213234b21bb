//! Blocking until shared state reaches a condition.
//!
//! [Monitor] pairs state with a condition variable. Writers go through [Monitor::update],
//! which wakes every waiter; waiters re-check their predicate on each wake up and at least
//! once per poll interval, and give up with [Error::Timeout] once the timeout has elapsed.

use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::Error;

#[derive(Debug, Default)]
pub struct Monitor<T> {
    state: Mutex<T>,
    changed: Condvar,
}

impl<T> Monitor<T> {
    pub fn new(state: T) -> Self {
        Self {
            state: Mutex::new(state),
            changed: Condvar::new(),
        }
    }

    /// Mutates the state and wakes all waiters.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R, Error> {
        let mut state = self.state.lock()?;
        let result = f(&mut state);
        drop(state);
        self.changed.notify_all();
        Ok(result)
    }

    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> Result<R, Error> {
        let state = self.state.lock()?;
        Ok(f(&state))
    }

    /// Blocks until `predicate` holds.
    ///
    /// `waiting_for` names the condition in the timeout error.
    pub fn wait_until(&self, waiting_for: &str, poll_interval: Duration, timeout: Duration, mut predicate: impl FnMut(&T) -> bool) -> Result<(), Error> {
        self.wait_for(waiting_for, poll_interval, timeout, |state| predicate(state).then_some(()))
    }

    /// Blocks until `check` returns a value, and returns it.
    pub fn wait_for<R>(&self, waiting_for: &str, poll_interval: Duration, timeout: Duration, mut check: impl FnMut(&T) -> Option<R>) -> Result<R, Error> {
        let deadline = Instant::now() + timeout;
        let mut state: MutexGuard<T> = self.state.lock()?;

        loop {
            if let Some(result) = check(&state) {
                return Ok(result);
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(Error::Timeout(waiting_for.to_string()));
            }

            let wait = poll_interval.min(deadline - now);
            let (guard, _) = self.changed.wait_timeout(state, wait)?;
            state = guard;
        }
    }
}
