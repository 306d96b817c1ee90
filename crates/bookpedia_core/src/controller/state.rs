//! Replay-latest view state with observer-driven activation.
//!
//! # Responsibility
//! - Hold the current view state and broadcast every change.
//! - Count UI observers and decide when a controller must (re)start its
//!   background subscriptions.
//!
//! # Invariants
//! - A new observer always sees the latest state immediately.
//! - The first observer after construction, or after every observer has
//!   been gone for longer than the grace window, yields `Activation::Start`.
//!   Any other observer yields `Activation::Resume`.
//! - Internal pipelines use `subscribe_raw`, which never affects activation.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;

/// Outcome of registering a new observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// State was inactive; the controller must start its subscriptions.
    Start,
    /// Subscriptions are still live from an earlier activation.
    Resume,
}

#[derive(Debug, Default)]
struct Lifecycle {
    observers: usize,
    active: bool,
    /// Bumped on every new observer; stale grace timers compare against it.
    epoch: u64,
}

/// Owner side of a controller's view state.
pub struct StateHolder<S> {
    sender: watch::Sender<S>,
    lifecycle: Arc<Mutex<Lifecycle>>,
    grace: Duration,
    runtime: Handle,
}

impl<S> StateHolder<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new(initial: S, grace: Duration, runtime: Handle) -> Self {
        let (sender, _) = watch::channel(initial);
        Self {
            sender,
            lifecycle: Arc::new(Mutex::new(Lifecycle::default())),
            grace,
            runtime,
        }
    }

    /// Applies `modify` to the state and notifies every subscriber.
    pub fn update(&self, modify: impl FnOnce(&mut S)) {
        self.sender.send_modify(modify);
    }

    pub fn snapshot(&self) -> S {
        self.sender.borrow().clone()
    }

    /// Subscribes without counting as an observer.
    pub fn subscribe_raw(&self) -> watch::Receiver<S> {
        self.sender.subscribe()
    }

    /// Registers a UI observer.
    pub fn observe(&self) -> (StateObserver<S>, Activation) {
        let activation = {
            let mut lifecycle = self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner);
            lifecycle.observers += 1;
            lifecycle.epoch = lifecycle.epoch.wrapping_add(1);
            if lifecycle.active {
                Activation::Resume
            } else {
                lifecycle.active = true;
                Activation::Start
            }
        };

        let observer = StateObserver {
            receiver: self.sender.subscribe(),
            lifecycle: Arc::clone(&self.lifecycle),
            grace: self.grace,
            runtime: self.runtime.clone(),
        };
        (observer, activation)
    }

    /// Returns true between a `Start` and the grace-window expiry.
    pub fn is_active(&self) -> bool {
        self.lifecycle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .active
    }
}

/// UI-side handle to a controller's state.
///
/// Dropping the last observer starts the grace window.
pub struct StateObserver<S> {
    receiver: watch::Receiver<S>,
    lifecycle: Arc<Mutex<Lifecycle>>,
    grace: Duration,
    runtime: Handle,
}

impl<S: Clone> StateObserver<S> {
    /// Returns the latest state and marks it seen.
    pub fn current(&mut self) -> S {
        self.receiver.borrow_and_update().clone()
    }

    /// Waits for the next state change.
    ///
    /// Returns `None` once the controller is gone.
    pub async fn changed(&mut self) -> Option<S> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Waits until the state satisfies `predicate`, checking the current
    /// value first.
    pub async fn wait_for(&mut self, predicate: impl FnMut(&S) -> bool) -> Option<S> {
        self.receiver
            .wait_for(predicate)
            .await
            .ok()
            .map(|state| state.clone())
    }
}

impl<S> Clone for StateObserver<S> {
    fn clone(&self) -> Self {
        self.lifecycle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .observers += 1;
        Self {
            receiver: self.receiver.clone(),
            lifecycle: Arc::clone(&self.lifecycle),
            grace: self.grace,
            runtime: self.runtime.clone(),
        }
    }
}

impl<S> Drop for StateObserver<S> {
    fn drop(&mut self) {
        let epoch = {
            let mut lifecycle = self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner);
            lifecycle.observers = lifecycle.observers.saturating_sub(1);
            if lifecycle.observers > 0 {
                return;
            }
            lifecycle.epoch
        };

        let lifecycle = Arc::clone(&self.lifecycle);
        let grace = self.grace;
        self.runtime.spawn(async move {
            tokio::time::sleep(grace).await;
            let mut lifecycle = lifecycle.lock().unwrap_or_else(PoisonError::into_inner);
            if lifecycle.observers == 0 && lifecycle.epoch == epoch {
                lifecycle.active = false;
            }
        });
    }
}
