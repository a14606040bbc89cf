//! Owns an OS file descriptor and exposes the primitive async operations
//! every higher layer is built from.
//!
//! Every method submits one request to the current [`crate::engine::Engine`]
//! (via [`crate::runtime::context::current_engine`]) and awaits its
//! completion; none of them touch the kernel synchronously.

use crate::engine::{CompletionValue, RequestKind, Stat};
use crate::error::Error;
use crate::mode::FileMode;
use crate::runtime::context::current_engine;

use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

/// A single open file descriptor with a fixed mode, owned exclusively by
/// the [`crate::buffered::BinaryFile`] built on top of it.
pub(crate) struct FileHandle {
    fd: i32,
    path: PathBuf,
    mode: FileMode,
    closed: bool,
}

impl FileHandle {
    /// Opens `path` under `mode`, submitting an `Open` request to the
    /// engine. `0o666` is the fixed creation mode per spec §4.7; the
    /// process umask still applies as usual.
    pub(crate) async fn open(path: &Path, mode: FileMode) -> Result<Self, Error> {
        let cpath = to_cstring(path)?;
        let engine = current_engine();

        let request = RequestKind::Open {
            path: cpath,
            flags: mode.posix_flags(),
            mode: mode.creation_mode(),
        };

        let value = engine.submit(request, Some(path.to_path_buf())).await?;
        let CompletionValue::Fd(fd) = value else {
            unreachable!("Open request resolved with a non-Fd completion value")
        };

        Ok(Self {
            fd,
            path: path.to_path_buf(),
            mode,
            closed: false,
        })
    }

    pub(crate) fn mode(&self) -> FileMode {
        self.mode
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed
    }

    /// Reads up to `len` bytes starting at `offset`. A zero-length result
    /// means EOF.
    pub(crate) async fn read_at(&self, len: usize, offset: u64) -> Result<Vec<u8>, Error> {
        self.ensure_open()?;

        let engine = current_engine();
        let request = RequestKind::Read {
            fd: self.fd,
            len,
            offset: offset as i64,
        };

        let value = engine.submit(request, None).await?;
        let CompletionValue::Bytes(bytes) = value else {
            unreachable!("Read request resolved with a non-Bytes completion value")
        };

        Ok(bytes)
    }

    /// Writes `data` at `offset`, or atomically at the current end of file
    /// when this handle's mode is append (`offset` is then ignored — see
    /// spec §4.3). Always returns `data.len()` on success; the engine loops
    /// internally to avoid short writes.
    pub(crate) async fn write_at(&self, data: &[u8], offset: u64) -> Result<usize, Error> {
        self.ensure_open()?;

        let engine = current_engine();
        let request = RequestKind::Write {
            fd: self.fd,
            data: data.to_vec(),
            offset: offset as i64,
            append: self.mode.append,
        };

        let value = engine.submit(request, None).await?;
        let CompletionValue::Written(n) = value else {
            unreachable!("Write request resolved with a non-Written completion value")
        };

        Ok(n)
    }

    pub(crate) async fn truncate(&self, len: u64) -> Result<(), Error> {
        self.ensure_open()?;

        let engine = current_engine();
        let request = RequestKind::Truncate { fd: self.fd, len };
        engine.submit(request, None).await?;
        Ok(())
    }

    /// Forces any kernel-buffered writes for this descriptor out to the
    /// storage device (spec §2's File Handle responsibility row, §5's
    /// suspension-point list). Distinct from [`crate::buffered::BinaryFile::flush`],
    /// which only moves bytes out of this crate's own write buffer and into
    /// the kernel's page cache.
    pub(crate) async fn fsync(&self) -> Result<(), Error> {
        self.ensure_open()?;

        let engine = current_engine();
        let request = RequestKind::Fsync { fd: self.fd };
        engine.submit(request, None).await?;
        Ok(())
    }

    pub(crate) async fn fstat(&self) -> Result<Stat, Error> {
        self.ensure_open()?;

        let engine = current_engine();
        let request = RequestKind::Fstat { fd: self.fd };
        let value = engine.submit(request, None).await?;
        let CompletionValue::Stat(stat) = value else {
            unreachable!("Fstat request resolved with a non-Stat completion value")
        };

        Ok(stat)
    }

    /// Idempotent after the first successful call, per spec §4.3.
    pub(crate) async fn close(&mut self) -> Result<(), Error> {
        if self.closed {
            return Ok(());
        }

        let engine = current_engine();
        let request = RequestKind::Close { fd: self.fd };
        let result = engine.submit(request, Some(self.path.clone())).await;
        self.closed = true;
        result.map(|_| ())
    }

    fn ensure_open(&self) -> Result<(), Error> {
        if self.closed {
            Err(Error::AlreadyClosed)
        } else {
            Ok(())
        }
    }
}

impl Drop for FileHandle {
    /// Best-effort fallback for the true-cancellation case (spec §5, §9):
    /// synchronous `Drop` can't await the engine, so a handle dropped
    /// without an explicit `close()` just releases the descriptor directly
    /// rather than leaking it. The normal exit path always goes through
    /// [`FileHandle::close`], which this short-circuits via `closed`.
    fn drop(&mut self) {
        if !self.closed {
            unsafe {
                libc::close(self.fd);
            }
        }
    }
}

pub(crate) fn to_cstring(path: &Path) -> Result<CString, Error> {
    CString::new(path.as_os_str().as_bytes()).map_err(|_| Error::Io {
        errno: libc::EINVAL,
        source: std::io::Error::from_raw_os_error(libc::EINVAL),
    })
}
