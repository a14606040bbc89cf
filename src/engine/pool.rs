//! The native async I/O engine: a fixed-size thread pool that performs
//! blocking POSIX filesystem syscalls and posts their results back to the
//! loop thread, the way libuv dispatches `uv_fs_*` work to its own
//! thread pool instead of the platform's readiness-notification backend.
//!
//! Regular files don't support `EAGAIN`/readiness polling the way sockets
//! do, which is why this bridge can't reuse a `ReadFuture`-style shape that
//! retries a non-blocking syscall until it stops returning `EAGAIN` — there's
//! no readiness event to wait for here, only a blocking call to hand off.

use crate::engine::future::RawIoFuture;
use crate::engine::request::{Completion, CompletionValue, Request, RequestKind, Stat};
use crate::error::Error;
use crate::utils::Slab;

use std::collections::VecDeque;
use std::ffi::CStr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Condvar, Mutex};
use std::task::{Context, Waker};
use std::thread::{self, JoinHandle};

pub(crate) struct PendingSlot {
    result: Option<Result<CompletionValue, i32>>,
    waker: Option<Waker>,
    /// Set by [`Engine::forget`] when the future awaiting this slot was
    /// dropped before a result arrived. The slot stays occupied (its id is
    /// *not* returned to the slab's free list) until the worker thread's
    /// completion actually lands in [`Engine::complete`] — otherwise a
    /// request submitted afterwards could be handed this same id and the
    /// original request's late completion would overwrite the new one's
    /// slot with stale data.
    forgotten: bool,
}

struct WorkQueue {
    requests: Mutex<VecDeque<Request>>,
    condvar: Condvar,
    shutdown: AtomicBool,
}

/// Handle to the engine's thread pool and its table of in-flight requests.
///
/// Shared (via `Arc`) by every [`crate::handle::FileHandle`] on a runtime;
/// the completion channel it feeds is drained only by that runtime's
/// [`crate::runtime::Runtime::block_on`] loop (see [`crate::engine::driver`]).
pub(crate) struct Engine {
    work: Arc<WorkQueue>,
    pending: Mutex<Slab<PendingSlot>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

/// Spawns `threads` worker threads and returns the engine handle plus the
/// receiving end of its completion channel.
pub(crate) fn new_engine(threads: usize) -> (Arc<Engine>, Receiver<Completion>) {
    let (tx, rx) = mpsc::channel();
    let work = Arc::new(WorkQueue {
        requests: Mutex::new(VecDeque::new()),
        condvar: Condvar::new(),
        shutdown: AtomicBool::new(false),
    });

    let workers = (0..threads.max(1))
        .map(|_| {
            let work = work.clone();
            let tx = tx.clone();
            thread::spawn(move || worker_loop(work, tx))
        })
        .collect();

    let engine = Arc::new(Engine {
        work,
        pending: Mutex::new(Slab::new(0)),
        workers: Mutex::new(workers),
    });

    (engine, rx)
}

fn worker_loop(work: Arc<WorkQueue>, tx: Sender<Completion>) {
    loop {
        let request = {
            let mut queue = work.requests.lock().unwrap();
            loop {
                if let Some(request) = queue.pop_front() {
                    break Some(request);
                }
                if work.shutdown.load(Ordering::SeqCst) {
                    break None;
                }
                queue = work.condvar.wait(queue).unwrap();
            }
        };

        let Some(request) = request else { break };
        let completion = execute(request);

        if tx.send(completion).is_err() {
            break;
        }
    }
}

fn execute(request: Request) -> Completion {
    let id = request.id;
    let label = request.kind.label();
    let span = tracing::debug_span!("engine.complete", request_id = id, kind = label);
    let _enter = span.enter();

    let result = match request.kind {
        RequestKind::Open { path, flags, mode } => do_open(&path, flags, mode),
        RequestKind::Read { fd, len, offset } => do_read(fd, len, offset),
        RequestKind::Write {
            fd,
            data,
            offset,
            append,
        } => do_write(fd, &data, offset, append),
        RequestKind::Truncate { fd, len } => do_truncate(fd, len),
        RequestKind::Fstat { fd } => do_fstat(fd),
        RequestKind::Fsync { fd } => do_fsync(fd),
        RequestKind::Close { fd } => do_close(fd),
        RequestKind::Mkdir { path, mode } => do_mkdir(&path, mode),
    };

    if let Err(errno) = &result {
        tracing::debug!(request_id = id, kind = label, errno, "request failed");
    }

    Completion { id, result }
}

fn errno() -> i32 {
    std::io::Error::last_os_error().raw_os_error().unwrap_or(0)
}

fn do_open(path: &CStr, flags: i32, mode: u32) -> Result<CompletionValue, i32> {
    let fd = unsafe {
        if flags & libc::O_CREAT != 0 {
            libc::open(path.as_ptr(), flags, mode)
        } else {
            libc::open(path.as_ptr(), flags)
        }
    };

    if fd < 0 {
        Err(errno())
    } else {
        Ok(CompletionValue::Fd(fd))
    }
}

fn do_read(fd: i32, len: usize, offset: i64) -> Result<CompletionValue, i32> {
    let mut buf = vec![0u8; len];
    let n = unsafe { libc::pread(fd, buf.as_mut_ptr() as *mut _, len, offset as libc::off_t) };

    if n < 0 {
        return Err(errno());
    }

    buf.truncate(n as usize);
    Ok(CompletionValue::Bytes(buf))
}

/// Loops until every byte is written or the kernel reports an error, so
/// the future this backs always resolves with `written == data.len()` on
/// success (spec §4.3: "guaranteed to equal len(bytes) on success").
fn do_write(fd: i32, data: &[u8], offset: i64, append: bool) -> Result<CompletionValue, i32> {
    let mut written = 0usize;

    while written < data.len() {
        let remaining = &data[written..];
        let n = unsafe {
            if append {
                libc::write(fd, remaining.as_ptr() as *const _, remaining.len())
            } else {
                libc::pwrite(
                    fd,
                    remaining.as_ptr() as *const _,
                    remaining.len(),
                    (offset + written as i64) as libc::off_t,
                )
            }
        };

        if n < 0 {
            return Err(errno());
        }
        if n == 0 {
            break;
        }
        written += n as usize;
    }

    Ok(CompletionValue::Written(written))
}

fn do_truncate(fd: i32, len: u64) -> Result<CompletionValue, i32> {
    let r = unsafe { libc::ftruncate(fd, len as libc::off_t) };
    if r < 0 {
        Err(errno())
    } else {
        Ok(CompletionValue::Unit)
    }
}

fn do_fstat(fd: i32) -> Result<CompletionValue, i32> {
    let mut st: libc::stat = unsafe { std::mem::zeroed() };
    let r = unsafe { libc::fstat(fd, &mut st) };

    if r < 0 {
        Err(errno())
    } else {
        Ok(CompletionValue::Stat(Stat {
            size: st.st_size as u64,
            mode: st.st_mode as u32,
        }))
    }
}

fn do_fsync(fd: i32) -> Result<CompletionValue, i32> {
    let r = unsafe { libc::fsync(fd) };
    if r < 0 {
        Err(errno())
    } else {
        Ok(CompletionValue::Unit)
    }
}

fn do_close(fd: i32) -> Result<CompletionValue, i32> {
    let r = unsafe { libc::close(fd) };
    if r < 0 {
        Err(errno())
    } else {
        Ok(CompletionValue::Unit)
    }
}

fn do_mkdir(path: &CStr, mode: u32) -> Result<CompletionValue, i32> {
    let r = unsafe { libc::mkdir(path.as_ptr(), mode as libc::mode_t) };
    if r < 0 {
        Err(errno())
    } else {
        Ok(CompletionValue::Unit)
    }
}

impl Engine {
    /// Allocates a request id, enqueues the request for a worker, and
    /// returns a single-shot future over its eventual completion. Matches
    /// spec §4.2's three submit steps: allocate + register here, resolve
    /// in [`Engine::poll_request`]/[`Engine::complete`].
    pub(crate) fn submit(self: &Arc<Self>, kind: RequestKind, path: Option<PathBuf>) -> RawIoFuture {
        let label = kind.label();
        let id = {
            let mut pending = self.pending.lock().unwrap();
            pending.insert(PendingSlot {
                result: None,
                waker: None,
                forgotten: false,
            })
        };

        tracing::debug!(request_id = id, kind = label, "engine.submit");

        {
            let mut queue = self.work.requests.lock().unwrap();
            queue.push_back(Request { id, kind });
        }
        self.work.condvar.notify_one();

        RawIoFuture::new(id, self.clone(), path)
    }

    /// Called from [`RawIoFuture::poll`]. Returns `Some` once a result has
    /// arrived, consuming the pending slot; otherwise parks the waker.
    pub(crate) fn poll_request(
        &self,
        id: usize,
        cx: &mut Context<'_>,
        path: Option<&std::path::Path>,
    ) -> Option<Result<CompletionValue, Error>> {
        let mut pending = self.pending.lock().unwrap();
        let slot = pending
            .get_mut(id)
            .expect("pending slot missing while its future is still alive");

        if slot.result.is_some() {
            let slot = pending.remove(id);
            let result = slot.result.unwrap();
            return Some(result.map_err(|errno| match path {
                Some(p) => Error::from_os_error(errno, p.to_path_buf()),
                None => Error::from_raw_errno(errno),
            }));
        }

        slot.waker = Some(cx.waker().clone());
        None
    }

    /// Called when an [`RawIoFuture`] is dropped before it resolved. Per
    /// spec §4.2/§5, the underlying request is *not* cancelled — it's left
    /// to run to completion on its worker thread. If its result already
    /// landed in the slot (the completion arrived but the future was never
    /// re-polled to observe it), the slot can be freed right away. Otherwise
    /// the slot is left occupied as a tombstone — its id must not be handed
    /// out to a new request until the real completion arrives and is
    /// discarded in [`Engine::complete`]; freeing it here would let `submit`
    /// reuse the id and let the stale completion land in the wrong request's
    /// slot.
    pub(crate) fn forget(&self, id: usize) {
        let mut pending = self.pending.lock().unwrap();
        let Some(slot) = pending.get_mut(id) else {
            return;
        };

        if slot.result.is_some() {
            pending.remove(id);
        } else {
            slot.forgotten = true;
            slot.waker = None;
        }
    }

    /// Called by [`crate::engine::driver`] for each completion drained off
    /// the channel. Wakes the future if it's still being polled for. If the
    /// slot was tombstoned by [`Engine::forget`], the id is freed now and the
    /// result is discarded; if no slot exists at all (shouldn't happen, but
    /// defensive), the completion is logged and dropped.
    pub(crate) fn complete(&self, completion: Completion) {
        let mut pending = self.pending.lock().unwrap();
        match pending.get_mut(completion.id) {
            Some(slot) if slot.forgotten => {
                pending.remove(completion.id);
                tracing::warn!(
                    request_id = completion.id,
                    "completion arrived for a cancelled request; discarding"
                );
            }
            Some(slot) => {
                slot.result = Some(completion.result);
                if let Some(waker) = slot.waker.take() {
                    drop(pending);
                    waker.wake();
                }
            }
            None => {
                tracing::warn!(
                    request_id = completion.id,
                    "completion arrived for an unknown request id; discarding"
                );
            }
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.work.shutdown.store(true, Ordering::SeqCst);
        self.work.condvar.notify_all();

        let workers = std::mem::take(&mut *self.workers.lock().unwrap());
        for worker in workers {
            let _ = worker.join();
        }
    }
}
