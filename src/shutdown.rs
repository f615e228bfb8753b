//! One-shot process shutdown broadcast.

use parking_lot::Mutex;
use std::sync::Arc;

type Observer = Box<dyn FnOnce() + Send + 'static>;

#[derive(Default)]
struct SignalState {
    fired: bool,
    observers: Vec<Observer>,
}

/// Fires at most once; every observer subscribed before that runs exactly once.
#[derive(Clone, Default)]
pub struct ShutdownSignal {
    state: Arc<Mutex<SignalState>>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer. Returns false if the signal already fired, in
    /// which case the observer is dropped without running.
    pub fn subscribe<F>(&self, observer: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        let mut state = self.state.lock();
        if state.fired {
            return false;
        }
        state.observers.push(Box::new(observer));
        true
    }

    /// Fire the signal, returning how many observers ran
    pub fn fire(&self) -> usize {
        let observers = {
            let mut state = self.state.lock();
            if state.fired {
                return 0;
            }
            state.fired = true;
            std::mem::take(&mut state.observers)
        };

        tracing::info!("Shutdown signal fired ({} observers)", observers.len());

        let count = observers.len();
        for observer in observers {
            observer();
        }
        count
    }

    pub fn is_fired(&self) -> bool {
        self.state.lock().fired
    }

    /// Fire when the process receives Ctrl-C
    pub async fn fire_on_ctrl_c(&self) -> std::io::Result<()> {
        tokio::signal::ctrl_c().await?;
        tracing::info!("Ctrl-C received");
        self.fire();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_fires_once() {
        let signal = ShutdownSignal::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = calls.clone();
        assert!(signal.subscribe(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        assert_eq!(signal.fire(), 1);
        assert_eq!(signal.fire(), 0);
        assert!(signal.is_fired());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_subscribe_after_fire_is_rejected() {
        let signal = ShutdownSignal::new();
        signal.fire();

        let ran = Arc::new(AtomicUsize::new(0));
        let counter = ran.clone();
        assert!(!signal.subscribe(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        signal.fire();
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_observer_may_resubscribe_without_deadlock() {
        let signal = ShutdownSignal::new();
        let inner = signal.clone();
        signal.subscribe(move || {
            assert!(!inner.subscribe(|| {}));
        });
        assert_eq!(signal.fire(), 1);
    }
}
