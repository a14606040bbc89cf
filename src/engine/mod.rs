//! The native async I/O bridge: a thread pool that performs blocking POSIX
//! file syscalls off the loop thread and reports their results back through
//! single-shot futures, the way libuv backs `uv_fs_*` with its own thread
//! pool rather than readiness notification (spec §4.2).

pub(crate) mod driver;
pub(crate) mod future;
pub(crate) mod pool;
mod request;

pub use request::Stat;

pub(crate) use pool::{Engine, new_engine};
pub(crate) use request::{Completion, CompletionValue, RequestKind};

/// Construction knobs for the engine's worker pool.
///
/// Mirrors `UV_THREADPOOL_SIZE`: a fixed number of OS threads service every
/// blocking request regardless of how many files are open concurrently.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub threads: usize,
}

impl EngineConfig {
    pub(crate) const DEFAULT_THREADS: usize = 4;
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            threads: Self::DEFAULT_THREADS,
        }
    }
}
