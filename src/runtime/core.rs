//! Async runtime that executes futures, spawned tasks, and the file engine.
//!
//! The runtime coordinates a main future via [`Runtime::block_on`] and
//! background tasks spawned with [`Task::spawn`]. Where a socket/timer
//! reactor would poll for readiness when idle, this one drains the
//! [`crate::engine::Engine`]'s completion channel — see [`crate::engine::driver`].
//!
//! # Main Event Loop
//!
//! [`block_on`](Runtime::block_on) implements the loop:
//! 1. Polls the main future.
//! 2. Runs every ready task in the queue.
//! 3. Delivers any engine completions that have already arrived.
//! 4. If nothing is ready, blocks on the engine's completion channel.
//!
//! # Context Management
//!
//! The runtime establishes a thread-local context so tasks spawned within
//! the future can use [`Task::spawn`] without an explicit runtime handle,
//! and so [`crate::handle::FileHandle`] can reach the engine without one
//! being threaded through every call.
//!
//! [`Task::spawn`]: crate::task::Task::spawn

use crate::engine::{Completion, Engine, EngineConfig, new_engine};
use crate::engine::driver::{drain_ready, wait_one};
use crate::runtime::context::{Features, enter_context};
use crate::runtime::{Executor, TaskQueue};
use crate::task::Task;

use std::future::Future;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

/// Main async runtime for executing futures and, when enabled, file I/O.
pub struct Runtime {
    queue: Arc<TaskQueue>,
    executor: Executor,
    engine: Arc<Engine>,
    completions: Receiver<Completion>,
    fs_enabled: bool,
}

impl Runtime {
    /// Creates a runtime with filesystem support disabled: use
    /// [`crate::runtime::builder::RuntimeBuilder`] and call `.enable_fs()`
    /// to perform any file I/O.
    pub fn new() -> Self {
        Self::with_features(false, EngineConfig::default())
    }

    pub(crate) fn with_features(fs_enabled: bool, engine_config: EngineConfig) -> Self {
        let queue = Arc::new(TaskQueue::new());
        let executor = Executor::new(queue.clone());
        let (engine, completions) = new_engine(engine_config.threads);

        Self {
            queue,
            executor,
            engine,
            completions,
            fs_enabled,
        }
    }

    /// Spawns a background task to run concurrently with the main future.
    pub fn spawn<F: Future<Output = ()> + Send + 'static>(&self, future: F) {
        let task = Task::new(future, self.queue.clone());
        self.queue.push(task);
    }

    /// Runs `future` to completion, processing spawned tasks and engine
    /// completions along the way, and returns its output.
    pub fn block_on<F: Future>(&mut self, future: F) -> F::Output {
        let features = Features {
            fs_enabled: self.fs_enabled,
        };

        let Self {
            queue,
            executor,
            engine,
            completions,
            ..
        } = self;

        enter_context(queue.clone(), engine.clone(), features, || {
            let mut future = Box::pin(future);

            let mut is_notified = false;

            fn clone_waker(data_ptr: *const ()) -> std::task::RawWaker {
                std::task::RawWaker::new(data_ptr, &VTABLE)
            }
            fn wake(data_ptr: *const ()) {
                unsafe {
                    *(data_ptr as *mut bool) = true;
                }
            }
            fn wake_by_ref(data_ptr: *const ()) {
                unsafe {
                    *(data_ptr as *mut bool) = true;
                }
            }
            fn drop_waker(_: *const ()) {}

            static VTABLE: std::task::RawWakerVTable =
                std::task::RawWakerVTable::new(clone_waker, wake, wake_by_ref, drop_waker);

            let raw_waker =
                std::task::RawWaker::new(&mut is_notified as *mut bool as *const (), &VTABLE);
            let waker = unsafe { std::task::Waker::from_raw(raw_waker) };
            let mut context = Context::from_waker(&waker);

            loop {
                if let Poll::Ready(value) = future.as_mut().poll(&mut context) {
                    // Drain any tasks still in flight so their side effects
                    // (e.g. a scope-exit close) land before returning.
                    for _ in 0..10 {
                        executor.run();
                        if queue.is_empty() {
                            break;
                        }
                        drain_ready(engine, completions);
                    }
                    return value;
                }

                executor.run();
                drain_ready(engine, completions);

                if is_notified {
                    is_notified = false;
                    continue;
                }

                if !queue.is_empty() {
                    continue;
                }

                wait_one(engine, completions, Duration::from_millis(100));
            }
        })
    }

    /// Returns whether filesystem operations are enabled for this runtime.
    pub fn fs_enabled(&self) -> bool {
        self.fs_enabled
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}
