//! Fluent builder for constructing a [`Runtime`] with opt-in features.
//!
//! Filesystem support is off by default, an explicit-opt-in shape
//! (`enable_fs()`); a runtime built with plain `Runtime::new()` panics the
//! first time it reaches the engine (see
//! [`crate::runtime::context::current_engine`]).

use crate::engine::EngineConfig;
use crate::runtime::Runtime;

/// Builds a [`Runtime`] with the requested features enabled.
///
/// # Example
/// ```ignore
/// let mut runtime = RuntimeBuilder::new().enable_fs().build();
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeBuilder {
    fs_enabled: bool,
    engine_config: EngineConfig,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables filesystem operations ([`crate::open`], [`crate::with_open`],
    /// directory helpers). Required before any of those can be called.
    pub fn enable_fs(mut self) -> Self {
        self.fs_enabled = true;
        self
    }

    /// Overrides the engine's worker-thread count (default 4, mirroring
    /// `UV_THREADPOOL_SIZE`).
    pub fn engine_threads(mut self, threads: usize) -> Self {
        self.engine_config.threads = threads;
        self
    }

    pub fn build(self) -> Runtime {
        Runtime::with_features(self.fs_enabled, self.engine_config)
    }
}
