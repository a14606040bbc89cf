//! Crate-wide error type.
//!
//! Every fallible operation in `asyncfiles` surfaces one of these variants.
//! Kernel errors that the standard library's [`std::io::ErrorKind`] already
//! distinguishes (not-found, already-exists, permission-denied) are mapped to
//! their own variant; everything else carries the raw errno in [`Error::Io`].

use std::path::PathBuf;

/// Errors produced by `asyncfiles` operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `open` was given a path that does not exist and the mode did not
    /// request creation.
    #[error("no such file or directory: {path}")]
    FileNotFound { path: PathBuf },

    /// `open` with an exclusive-create mode (`x`) targeted an existing path.
    #[error("file already exists: {path}")]
    FileExists { path: PathBuf },

    /// The kernel refused the requested access mode.
    #[error("permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// The path named a directory where a regular file was expected.
    #[error("is a directory: {path}")]
    IsADirectory { path: PathBuf },

    /// The mode string passed to [`crate::open`] or [`crate::mode::parse`]
    /// did not parse. See [`crate::mode`] for the grammar.
    #[error("invalid mode {mode:?}: {reason}")]
    InvalidMode { mode: String, reason: &'static str },

    /// The byte stream being decoded as UTF-8 was malformed.
    #[error("invalid utf-8 at byte offset {valid_up_to}")]
    Decode { valid_up_to: usize },

    /// A string could not be encoded (currently unreachable for `&str`
    /// inputs, which are already valid UTF-8 by construction; reserved for
    /// future encodings).
    #[error("encode error: {reason}")]
    Encode { reason: String },

    /// Any other OS-level failure, carrying the raw errno.
    #[error("I/O error (errno {errno}): {source}")]
    Io { errno: i32, source: std::io::Error },

    /// The file object outlived a cancelled operation and is now poisoned;
    /// see spec §5 for the rationale. Only [`crate::open`]'s scope-exit close
    /// still runs on a poisoned file.
    #[error("operation cancelled, file object is poisoned")]
    Cancelled,

    /// An operation was attempted on a file object that has already been
    /// closed.
    #[error("file is already closed")]
    AlreadyClosed,
}

impl Error {
    /// Builds the appropriate variant from a raw OS error observed while
    /// operating on `path`.
    pub(crate) fn from_os_error(errno: i32, path: PathBuf) -> Self {
        match errno {
            libc::ENOENT => Error::FileNotFound { path },
            libc::EEXIST => Error::FileExists { path },
            libc::EACCES | libc::EPERM => Error::PermissionDenied { path },
            libc::EISDIR => Error::IsADirectory { path },
            _ => Error::Io {
                errno,
                source: std::io::Error::from_raw_os_error(errno),
            },
        }
    }

    /// Builds an [`Error::Io`] from the calling thread's `errno`, for
    /// operations (read/write/truncate/fstat/close) that don't carry a path.
    pub(crate) fn from_last_os_error() -> Self {
        let err = std::io::Error::last_os_error();
        Error::Io {
            errno: err.raw_os_error().unwrap_or(0),
            source: err,
        }
    }

    /// Builds the appropriate variant from an errno observed on a worker
    /// thread and carried across the completion channel, for requests with
    /// no associated path (read/write/truncate/fstat/close). `errno()` on
    /// the loop thread wouldn't reflect the worker thread's failure, which
    /// is why this takes the value explicitly rather than reading it here.
    pub(crate) fn from_raw_errno(errno: i32) -> Self {
        match errno {
            libc::EACCES | libc::EPERM => Error::PermissionDenied {
                path: PathBuf::new(),
            },
            _ => Error::Io {
                errno,
                source: std::io::Error::from_raw_os_error(errno),
            },
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
