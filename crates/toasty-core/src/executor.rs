//! Detached task execution
//!
//! Bed actuation runs outside the request that triggered it. The engine
//! only ever hands work to a [`TaskExecutor`]; it never joins the task or
//! sees its result.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::runtime::Handle;

/// A unit of detached work
pub type Task = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Something that runs detached tasks
pub trait TaskExecutor: Send + Sync {
    /// Hand off a task. Must return without waiting for it.
    fn submit(&self, task: Task);
}

/// Spawns each task onto a tokio runtime
pub struct TokioExecutor {
    handle: Handle,
}

impl TokioExecutor {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Executor for the runtime the caller is running on.
    ///
    /// Panics outside a tokio runtime, like [`Handle::current`].
    pub fn current() -> Self {
        Self::new(Handle::current())
    }
}

impl TaskExecutor for TokioExecutor {
    fn submit(&self, task: Task) {
        // JoinHandle dropped: the task is detached
        self.handle.spawn(task);
    }
}

/// Holds submitted tasks until [`run_all`](Self::run_all) is awaited
///
/// Lets tests observe the state between "request answered" and
/// "actuation finished".
#[derive(Clone, Default)]
pub struct QueuedExecutor {
    queue: Arc<Mutex<VecDeque<Task>>>,
}

impl QueuedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    fn queue(&self) -> MutexGuard<'_, VecDeque<Task>> {
        self.queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Number of tasks submitted but not yet run
    pub fn pending(&self) -> usize {
        self.queue().len()
    }

    /// Run queued tasks in submission order, including any they submit.
    /// Returns how many ran.
    pub async fn run_all(&self) -> usize {
        let mut ran = 0;
        loop {
            let next = self.queue().pop_front();
            match next {
                Some(task) => {
                    task.await;
                    ran += 1;
                }
                None => return ran,
            }
        }
    }
}

impl TaskExecutor for QueuedExecutor {
    fn submit(&self, task: Task) {
        self.queue().push_back(task);
    }
}
