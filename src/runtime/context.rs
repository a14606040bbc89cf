//! Thread-local runtime context for global task spawning and engine access.
//!
//! The thing being gated and thread-localized is the
//! [`crate::engine::Engine`] handle rather than a socket/timer reactor —
//! this crate has one feature switch (filesystem support) since every
//! operation it exposes goes through the same engine.

use crate::engine::Engine;

use std::cell::RefCell;
use std::sync::Arc;

#[derive(Clone, Copy, Debug)]
pub(crate) struct Features {
    pub(crate) fs_enabled: bool,
}

thread_local! {
    pub(crate) static CURRENT_QUEUE: RefCell<Option<Arc<crate::runtime::queue::TaskQueue>>> =
        const { RefCell::new(None) };

    static CURRENT_ENGINE: RefCell<Option<Arc<Engine>>> = const { RefCell::new(None) };

    static CURRENT_FEATURES: RefCell<Option<Features>> = const { RefCell::new(None) };
}

/// Enters a new runtime context for the current thread, restoring the
/// previous one on exit. Called once per [`crate::runtime::core::Runtime::block_on`].
pub(crate) fn enter_context<F, R>(
    queue: Arc<crate::runtime::queue::TaskQueue>,
    engine: Arc<Engine>,
    features: Features,
    function: F,
) -> R
where
    F: FnOnce() -> R,
{
    CURRENT_QUEUE.with(|current_queue| {
        CURRENT_ENGINE.with(|current_engine| {
            CURRENT_FEATURES.with(|current_features| {
                let previous_queue = current_queue.borrow_mut().replace(queue);
                let previous_engine = current_engine.borrow_mut().replace(engine);
                let previous_features = current_features.borrow_mut().replace(features);

                let result = function();

                *current_queue.borrow_mut() = previous_queue;
                *current_engine.borrow_mut() = previous_engine;
                *current_features.borrow_mut() = previous_features;

                result
            })
        })
    })
}

/// Returns the current engine handle.
///
/// # Panics
/// Panics if the runtime was not built with `.enable_fs()`, or if called
/// outside a [`Runtime::block_on`](crate::runtime::core::Runtime::block_on) context.
pub(crate) fn current_engine() -> Arc<Engine> {
    CURRENT_FEATURES.with(|features| {
        let enabled = features
            .borrow()
            .as_ref()
            .map(|f| f.fs_enabled)
            .unwrap_or(false);

        if !enabled {
            panic!("filesystem support not enabled. Use RuntimeBuilder::enable_fs().");
        }
    });

    CURRENT_ENGINE.with(|current| {
        current
            .borrow()
            .clone()
            .expect("no engine in current context; file I/O must be called within Runtime::block_on")
    })
}
