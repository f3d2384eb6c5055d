//! One-shot child termination signal.
//!
//! Each session registers a background wait on its child process handle.
//! When the handle becomes signaled the session fires its `ExitSignal`
//! exactly once; the signal never resets. Callers can block on `wait`,
//! poll `has_fired`, or register observers that run on the waiter thread.

use std::sync::{Arc, Condvar, Mutex};

type Observer = Box<dyn FnOnce() + Send + 'static>;

struct SignalState {
    fired: bool,
    observers: Vec<Observer>,
}

/// A cloneable handle to a single-fire termination signal.
///
/// Clones share the same underlying state: firing through any clone is
/// observed by all of them.
#[derive(Clone)]
pub struct ExitSignal {
    inner: Arc<(Mutex<SignalState>, Condvar)>,
}

impl ExitSignal {
    pub fn new() -> Self {
        ExitSignal {
            inner: Arc::new((
                Mutex::new(SignalState {
                    fired: false,
                    observers: Vec::new(),
                }),
                Condvar::new(),
            )),
        }
    }

    /// Whether the signal has fired.
    pub fn has_fired(&self) -> bool {
        self.inner.0.lock().unwrap().fired
    }

    /// Block until the signal fires. Returns immediately if it already has.
    /// There is no timeout; the wait matches the child's lifetime.
    pub fn wait(&self) {
        let (lock, cvar) = &*self.inner;
        let mut state = lock.lock().unwrap();
        while !state.fired {
            state = cvar.wait(state).unwrap();
        }
    }

    /// Register an observer to run when the signal fires.
    ///
    /// If the signal already fired, the observer runs immediately on the
    /// calling thread; otherwise it runs on the thread that fires.
    pub fn on_fire<F>(&self, observer: F)
    where
        F: FnOnce() + Send + 'static,
    {
        {
            let mut state = self.inner.0.lock().unwrap();
            if !state.fired {
                state.observers.push(Box::new(observer));
                return;
            }
        }
        observer();
    }

    /// Fire the signal. Only the first call has any effect; observers
    /// registered at that point run once, in registration order.
    #[cfg_attr(not(windows), allow(dead_code))]
    pub(crate) fn fire(&self) {
        let observers = {
            let (lock, cvar) = &*self.inner;
            let mut state = lock.lock().unwrap();
            if state.fired {
                return;
            }
            state.fired = true;
            cvar.notify_all();
            std::mem::take(&mut state.observers)
        };
        for observer in observers {
            observer();
        }
    }
}

impl Default for ExitSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ExitSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExitSignal")
            .field("fired", &self.has_fired())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_starts_unfired() {
        let signal = ExitSignal::new();
        assert!(!signal.has_fired());
    }

    #[test]
    fn test_fires_at_most_once() {
        let signal = ExitSignal::new();
        let count = Arc::new(AtomicUsize::new(0));

        let observed = count.clone();
        signal.on_fire(move || {
            observed.fetch_add(1, Ordering::SeqCst);
        });

        signal.fire();
        signal.fire();
        signal.fire();

        assert!(signal.has_fired());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_observer_after_fire_runs_immediately() {
        let signal = ExitSignal::new();
        signal.fire();

        let count = Arc::new(AtomicUsize::new(0));
        let observed = count.clone();
        signal.on_fire(move || {
            observed.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_wait_unblocks_on_fire() {
        let signal = ExitSignal::new();
        let waiter = signal.clone();

        let handle = thread::spawn(move || {
            waiter.wait();
            waiter.has_fired()
        });

        // Give the waiter a moment to block
        thread::sleep(Duration::from_millis(50));
        assert!(!signal.has_fired());

        signal.fire();
        assert!(handle.join().unwrap());
    }

    #[test]
    fn test_wait_after_fire_returns() {
        let signal = ExitSignal::new();
        signal.fire();
        signal.wait();
    }

    #[test]
    fn test_clones_share_state() {
        let signal = ExitSignal::new();
        let clone = signal.clone();
        clone.fire();
        assert!(signal.has_fired());
    }

    #[test]
    fn test_observers_run_in_registration_order() {
        let signal = ExitSignal::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in 0..3 {
            let order = order.clone();
            signal.on_fire(move || {
                order.lock().unwrap().push(tag);
            });
        }

        signal.fire();
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }
}
