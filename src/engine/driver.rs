//! Drains the engine's completion channel into woken futures.
//!
//! Plays the same role a `Reactor::poll_events`/`wait_for_event` pair would
//! in [`crate::runtime::core::Runtime::block_on`], except there's no file
//! descriptor to poll: completions arrive over an `mpsc::Receiver` fed by
//! the engine's worker threads instead of a `kqueue`/`epoll` backend.

use crate::engine::pool::Engine;
use crate::engine::request::Completion;

use std::sync::mpsc::{Receiver, RecvTimeoutError, TryRecvError};
use std::time::Duration;

/// Non-blocking: delivers every completion currently sitting in the
/// channel. Returns whether anything was delivered.
pub(crate) fn drain_ready(engine: &Engine, rx: &Receiver<Completion>) -> bool {
    let mut any = false;
    loop {
        match rx.try_recv() {
            Ok(completion) => {
                engine.complete(completion);
                any = true;
            }
            Err(TryRecvError::Empty) => break,
            Err(TryRecvError::Disconnected) => break,
        }
    }
    any
}

/// Blocks until at least one completion arrives (or `timeout` elapses),
/// then drains whatever else has also become ready. Called by
/// [`crate::runtime::core::Runtime::block_on`] only when the task queue is
/// empty and the main future is not immediately re-pollable, i.e. the loop
/// has nothing left to do but wait on the engine.
pub(crate) fn wait_one(engine: &Engine, rx: &Receiver<Completion>, timeout: Duration) {
    match rx.recv_timeout(timeout) {
        Ok(completion) => {
            engine.complete(completion);
            drain_ready(engine, rx);
        }
        Err(RecvTimeoutError::Timeout) => {}
        Err(RecvTimeoutError::Disconnected) => {}
    }
}
