//! Single-threaded executor that drains ready tasks from a [`TaskQueue`].
//!
//! Everything here runs on the thread that called
//! [`crate::runtime::core::Runtime::block_on`]; there is no worker pool —
//! that's what [`crate::engine`] is for. Polling a task may re-enqueue it
//! (via its [`crate::runtime::waker::TaskWaker`]) if it's still pending, so
//! `run` keeps popping until the queue reports empty rather than draining a
//! fixed snapshot.

use crate::runtime::queue::TaskQueue;

use std::sync::Arc;

pub(crate) struct Executor {
    queue: Arc<TaskQueue>,
}

impl Executor {
    pub(crate) fn new(queue: Arc<TaskQueue>) -> Self {
        Self { queue }
    }

    /// Polls every task currently in the queue, including ones re-queued by
    /// their own poll within this call.
    pub(crate) fn run(&self) {
        while let Some(task) = self.queue.pop() {
            task.poll();
        }
    }
}
