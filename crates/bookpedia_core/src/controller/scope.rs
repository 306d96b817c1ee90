//! Structured task ownership for controllers.
//!
//! # Responsibility
//! - Tie every background task a controller starts to the controller's
//!   lifetime (`TaskScope`).
//! - Keep at most one live task per pipeline (`TaskSlot`).
//!
//! # Invariants
//! - Once a scope is cancelled it spawns nothing further.
//! - Replacing a slot aborts the previous occupant.
//! - Abort is the only cancellation signal; it is never turned into an error.

use std::future::Future;
use std::sync::{Mutex, PoisonError};
use tokio::runtime::Handle;
use tokio::task::{AbortHandle, JoinHandle};

/// Owner of all tasks spawned on behalf of one controller.
pub struct TaskScope {
    runtime: Handle,
    tasks: Mutex<ScopeTasks>,
}

#[derive(Default)]
struct ScopeTasks {
    cancelled: bool,
    handles: Vec<AbortHandle>,
}

impl TaskScope {
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            tasks: Mutex::new(ScopeTasks::default()),
        }
    }

    /// Spawns `future` inside the scope.
    ///
    /// Returns `None` when the scope is already cancelled.
    pub fn spawn<F>(&self, future: F) -> Option<JoinHandle<F::Output>>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        if tasks.cancelled {
            return None;
        }
        tasks.handles.retain(|handle| !handle.is_finished());
        let handle = self.runtime.spawn(future);
        tasks.handles.push(handle.abort_handle());
        Some(handle)
    }

    /// Aborts every task and refuses new ones.
    pub fn cancel(&self) {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        tasks.cancelled = true;
        for handle in tasks.handles.drain(..) {
            handle.abort();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cancelled
    }

    pub fn runtime(&self) -> &Handle {
        &self.runtime
    }
}

impl Drop for TaskScope {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Single-occupant task holder ("current subscription" for one pipeline).
#[derive(Default)]
pub struct TaskSlot {
    current: Mutex<Option<JoinHandle<()>>>,
}

impl TaskSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `handle`, aborting whatever ran in the slot before.
    pub fn replace(&self, handle: JoinHandle<()>) {
        let previous = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    /// Aborts the occupant and waits until it has fully stopped.
    ///
    /// After this returns the previous task can no longer touch shared state.
    pub async fn cancel_and_wait(&self) {
        if let Some(previous) = self.take() {
            previous.abort();
            let _ = previous.await;
        }
    }

    /// Returns true while the occupant is still running.
    pub fn is_running(&self) -> bool {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    fn take(&self) -> Option<JoinHandle<()>> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}
