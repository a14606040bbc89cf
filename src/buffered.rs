//! Read-ahead buffering and write coalescing over a [`FileHandle`].
//!
//! Tracks a logical `position` distinct from the offset each `pread`/`pwrite`
//! request carries: the read buffer may hold bytes read ahead of `position`,
//! so the offset of the *next* kernel read is `position` plus whatever's
//! still buffered, not `position` itself. `write_at`/`read_at` never move an
//! OS-level file cursor (they're offset-addressed), so there is no separate
//! OS cursor to reconcile here beyond append mode's kernel-chosen EOF, which
//! is picked up via `fstat` after each append flush.

use crate::error::Error;
use crate::handle::FileHandle;
use crate::mode::FileMode;

use std::io::SeekFrom;
use std::sync::atomic::{AtomicBool, Ordering};

struct ReadBuffer {
    bytes: Vec<u8>,
    filled: usize,
    cursor: usize,
    eof_reached: bool,
}

impl ReadBuffer {
    fn new() -> Self {
        Self {
            bytes: Vec::new(),
            filled: 0,
            cursor: 0,
            eof_reached: false,
        }
    }

    fn discard(&mut self) {
        self.bytes.clear();
        self.filled = 0;
        self.cursor = 0;
        self.eof_reached = false;
    }
}

struct WriteBuffer {
    bytes: Vec<u8>,
}

impl WriteBuffer {
    fn new() -> Self {
        Self { bytes: Vec::new() }
    }
}

#[derive(PartialEq, Eq)]
enum LastOp {
    None,
    Read,
    Write,
}

/// Disarms on a normal return; if dropped while still armed (i.e. the
/// future polling it was dropped mid-await — a cancelled caller, spec §5),
/// marks the file poisoned. `AtomicBool::store` only needs `&self`, so the
/// guard can hold a plain reference into the file it protects instead of
/// reaching for a raw pointer to dodge the borrow checker.
struct PoisonGuard<'a> {
    poisoned: &'a AtomicBool,
    armed: bool,
}

impl<'a> PoisonGuard<'a> {
    fn new(poisoned: &'a AtomicBool) -> Self {
        Self {
            poisoned,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PoisonGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.poisoned.store(true, Ordering::SeqCst);
        }
    }
}

/// Binary file with read-ahead and write-coalescing buffers over a
/// [`FileHandle`]. See spec §4.4 for the read/write-path algorithms this
/// implements.
pub(crate) struct BinaryFile {
    handle: FileHandle,
    position: u64,
    capacity: usize,
    read_buf: ReadBuffer,
    write_buf: WriteBuffer,
    last_op: LastOp,
    poisoned: AtomicBool,
}

impl BinaryFile {
    /// `capacity` is the read-ahead/write-coalescing buffer size, fixed for
    /// the file's lifetime (spec §9: "resizing mid-stream is out of scope").
    /// Append-mode files start positioned at the current end of file,
    /// matching the kernel's own `O_APPEND` behavior on open.
    pub(crate) async fn new(handle: FileHandle, capacity: usize) -> Result<Self, Error> {
        let position = if handle.mode().append {
            handle.fstat().await?.size
        } else {
            0
        };

        Ok(Self {
            handle,
            position,
            capacity: capacity.max(1),
            read_buf: ReadBuffer::new(),
            write_buf: WriteBuffer::new(),
            last_op: LastOp::None,
            poisoned: AtomicBool::new(false),
        })
    }

    pub(crate) fn mode(&self) -> FileMode {
        self.handle.mode()
    }

    /// The fixed read-ahead/write-coalescing buffer size, used by
    /// [`crate::text::TextFile`] to size its own underlying reads.
    pub(crate) fn buffer_capacity(&self) -> usize {
        self.capacity
    }

    /// Synchronous: reads the cached logical position only, never the
    /// kernel (spec §4.4: "tell() → current logical position (synchronous)").
    /// Works even on a poisoned file — it touches no kernel state, so there's
    /// nothing for cancellation to have left in an inconsistent state.
    pub(crate) fn tell(&self) -> u64 {
        self.position
    }

    /// Up to `n` bytes, or everything remaining when `n < 0`. Zero-length
    /// only at EOF.
    pub(crate) async fn read(&mut self, n: i64) -> Result<Vec<u8>, Error> {
        self.ensure_not_poisoned()?;
        let guard = PoisonGuard::new(&self.poisoned);

        self.enter_read_mode().await?;

        let target = if n < 0 { None } else { Some(n as usize) };
        let mut out = Vec::new();

        loop {
            if let Some(target) = target {
                if out.len() >= target {
                    break;
                }
            }

            if self.read_buf.cursor >= self.read_buf.filled {
                if self.read_buf.eof_reached {
                    break;
                }
                self.refill_read_buffer().await?;
                continue;
            }

            let available = self.read_buf.filled - self.read_buf.cursor;
            let take = match target {
                Some(target) => (target - out.len()).min(available),
                None => available,
            };

            let start = self.read_buf.cursor;
            out.extend_from_slice(&self.read_buf.bytes[start..start + take]);
            self.read_buf.cursor += take;
            self.position += take as u64;
        }

        guard.disarm();
        Ok(out)
    }

    /// Always `data.len()` on success (spec §4.4).
    pub(crate) async fn write(&mut self, data: &[u8]) -> Result<usize, Error> {
        self.ensure_not_poisoned()?;
        let guard = PoisonGuard::new(&self.poisoned);

        self.enter_write_mode();

        self.write_buf.bytes.extend_from_slice(data);
        self.position += data.len() as u64;

        if self.write_buf.bytes.len() >= self.capacity {
            self.flush_write_buffer().await?;
        }

        guard.disarm();
        Ok(data.len())
    }

    /// Flushes if needed, discards the read-ahead buffer, then reports the
    /// new absolute position.
    pub(crate) async fn seek(&mut self, pos: SeekFrom) -> Result<u64, Error> {
        self.ensure_not_poisoned()?;
        let guard = PoisonGuard::new(&self.poisoned);

        self.flush_write_buffer().await?;
        self.read_buf.discard();
        self.last_op = LastOp::None;

        let new_position = match pos {
            SeekFrom::Start(offset) => offset,
            SeekFrom::Current(delta) => apply_delta(self.position, delta)?,
            SeekFrom::End(delta) => {
                let size = self.handle.fstat().await?.size;
                apply_delta(size, delta)?
            }
        };

        self.position = new_position;
        guard.disarm();
        Ok(new_position)
    }

    /// Flushes first, then truncates to `length` (defaulting to the current
    /// position).
    pub(crate) async fn truncate(&mut self, length: Option<u64>) -> Result<(), Error> {
        self.ensure_not_poisoned()?;
        let guard = PoisonGuard::new(&self.poisoned);

        self.flush_write_buffer().await?;
        let length = length.unwrap_or(self.position);
        self.handle.truncate(length).await?;

        guard.disarm();
        Ok(())
    }

    pub(crate) async fn flush(&mut self) -> Result<(), Error> {
        self.ensure_not_poisoned()?;
        let guard = PoisonGuard::new(&self.poisoned);
        self.flush_write_buffer().await?;
        guard.disarm();
        Ok(())
    }

    /// Flushes this crate's own write buffer, then asks the kernel to force
    /// the descriptor's dirty pages to storage (spec §2/§5: `fsync` is a
    /// File Handle primitive and a suspension point, distinct from `flush`
    /// which only empties the write-coalescing buffer into the kernel).
    pub(crate) async fn fsync(&mut self) -> Result<(), Error> {
        self.ensure_not_poisoned()?;
        let guard = PoisonGuard::new(&self.poisoned);
        self.flush_write_buffer().await?;
        self.handle.fsync().await?;
        guard.disarm();
        Ok(())
    }

    /// Flushes (if still open) and closes. Idempotent. Unlike every other
    /// method here, this one runs even on an already-poisoned file — the
    /// scoped-open close path must still attempt to release the descriptor
    /// (spec §5, §9).
    pub(crate) async fn close(&mut self) -> Result<(), Error> {
        if self.handle.is_closed() {
            return Ok(());
        }

        let guard = PoisonGuard::new(&self.poisoned);
        let flush_result = self.flush_write_buffer().await;
        let close_result = self.handle.close().await;
        guard.disarm();

        flush_result.and(close_result)
    }

    async fn enter_read_mode(&mut self) -> Result<(), Error> {
        if self.last_op == LastOp::Write {
            self.flush_write_buffer().await?;
        }
        self.last_op = LastOp::Read;
        Ok(())
    }

    fn enter_write_mode(&mut self) {
        if self.last_op == LastOp::Read {
            self.read_buf.discard();
        }
        self.last_op = LastOp::Write;
    }

    async fn refill_read_buffer(&mut self) -> Result<(), Error> {
        debug_assert_eq!(self.read_buf.cursor, self.read_buf.filled);

        let chunk = self.handle.read_at(self.capacity, self.position).await?;
        if chunk.is_empty() {
            self.read_buf.eof_reached = true;
            self.read_buf.bytes.clear();
        } else {
            self.read_buf.filled = chunk.len();
            self.read_buf.bytes = chunk;
        }
        self.read_buf.cursor = 0;
        if self.read_buf.eof_reached {
            self.read_buf.filled = 0;
        }
        Ok(())
    }

    async fn flush_write_buffer(&mut self) -> Result<(), Error> {
        if self.write_buf.bytes.is_empty() {
            return Ok(());
        }

        let write_offset = self.position - self.write_buf.bytes.len() as u64;
        let written = self
            .handle
            .write_at(&self.write_buf.bytes, write_offset)
            .await?;
        debug_assert_eq!(written, self.write_buf.bytes.len());
        self.write_buf.bytes.clear();

        if self.handle.mode().append {
            // write(2) under O_APPEND picks the real offset; learn it so
            // tell() keeps reporting the true end of file (spec §4.4).
            self.position = self.handle.fstat().await?.size;
        }

        Ok(())
    }

    /// Checked at the top of every method but [`BinaryFile::close`], which
    /// must stay idempotent after the descriptor is already gone.
    fn ensure_not_poisoned(&self) -> Result<(), Error> {
        if self.poisoned.load(Ordering::SeqCst) {
            return Err(Error::Cancelled);
        }
        if self.handle.is_closed() {
            return Err(Error::AlreadyClosed);
        }
        Ok(())
    }
}

pub(crate) fn apply_delta(base: u64, delta: i64) -> Result<u64, Error> {
    let result = if delta >= 0 {
        base.checked_add(delta as u64)
    } else {
        base.checked_sub(delta.unsigned_abs())
    };

    result.ok_or(Error::Io {
        errno: libc::EINVAL,
        source: std::io::Error::from_raw_os_error(libc::EINVAL),
    })
}
