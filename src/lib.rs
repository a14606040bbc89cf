//! Asynchronous POSIX file I/O for a cooperative single-threaded event loop.
//!
//! Files are opened, read, written, sought, truncated, and line-iterated
//! through non-blocking operations that delegate to a native thread-pool
//! engine ([`engine`]), while the caller stays on the event loop. The
//! runtime itself ([`runtime`]) is the same hand-rolled single-threaded
//! executor/task/waker machinery that underpins it, generalized from
//! socket/timer I/O to file I/O.
//!
//! # Architecture
//!
//! - **Runtime**: drives a main future to completion via `block_on`,
//!   draining spawned tasks and engine completions as it goes.
//! - **Engine**: a fixed-size thread pool performing blocking POSIX file
//!   syscalls and posting results back as single-shot futures.
//! - **FileHandle**: owns one OS descriptor; exposes open/read-at/write-at/
//!   truncate/fstat/close as async primitives.
//! - **BinaryFile**: read-ahead buffering and write coalescing atop a
//!   handle; tracks a logical position distinct from the engine's
//!   offset-addressed requests.
//! - **TextFile**: incremental UTF-8 encode/decode atop a `BinaryFile`.
//! - **File**: the public handle returned by [`open`]/[`with_open`],
//!   dispatching to whichever of the two the mode string requested.
//!
//! # Example
//!
//! ```no_run
//! use asyncfiles::RuntimeBuilder;
//!
//! let mut runtime = RuntimeBuilder::new().enable_fs().build();
//! runtime.block_on(async {
//!     asyncfiles::with_open("/tmp/greeting.txt", "w", |f| async move {
//!         f.write_str("hello").await
//!     }).await.unwrap();
//! });
//! ```

mod buffered;
pub mod dir;
pub mod engine;
mod error;
mod handle;
mod lines;
pub mod mode;
mod open;
pub mod runtime;
mod task;
mod text;
mod utils;

pub use dir::Directory;
pub use error::{Error, Result};
pub use mode::FileMode;
pub use open::{DEFAULT_BUFFER_SIZE, File, Line, LineIterator, ReadData, open, open_with_capacity, with_open};
pub use runtime::{Runtime, RuntimeBuilder};
pub use task::{JoinHandle, JoinSet, Task};
