//! Request and completion payloads exchanged between the loop thread and
//! the engine's worker pool.

use std::ffi::CString;

/// The blocking operation a worker thread performs for one request.
pub(crate) enum RequestKind {
    Open {
        path: CString,
        flags: i32,
        mode: u32,
    },
    Read {
        fd: i32,
        len: usize,
        offset: i64,
    },
    /// `append` routes the write through `write(2)` instead of `pwrite(2)`:
    /// `pwrite` ignores `O_APPEND` and writes at the literal offset given,
    /// which would break append-mode's atomic-append-at-EOF guarantee.
    Write {
        fd: i32,
        data: Vec<u8>,
        offset: i64,
        append: bool,
    },
    Truncate {
        fd: i32,
        len: u64,
    },
    Fstat {
        fd: i32,
    },
    Fsync {
        fd: i32,
    },
    Close {
        fd: i32,
    },
    Mkdir {
        path: CString,
        mode: u32,
    },
}

impl RequestKind {
    pub(crate) fn label(&self) -> &'static str {
        match self {
            RequestKind::Open { .. } => "open",
            RequestKind::Read { .. } => "read",
            RequestKind::Write { .. } => "write",
            RequestKind::Truncate { .. } => "truncate",
            RequestKind::Fstat { .. } => "fstat",
            RequestKind::Fsync { .. } => "fsync",
            RequestKind::Close { .. } => "close",
            RequestKind::Mkdir { .. } => "mkdir",
        }
    }
}

/// File metadata returned by [`crate::handle::FileHandle::fstat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stat {
    pub size: u64,
    pub mode: u32,
}

/// The successful outcome of one request, still tagged by kind so the
/// caller can assert it got back what it asked for.
#[derive(Debug)]
pub(crate) enum CompletionValue {
    Fd(i32),
    Bytes(Vec<u8>),
    Written(usize),
    Stat(Stat),
    Unit,
}

pub(crate) struct Request {
    pub(crate) id: usize,
    pub(crate) kind: RequestKind,
}

/// Posted back from a worker thread to the loop thread over an mpsc channel.
pub(crate) struct Completion {
    pub(crate) id: usize,
    pub(crate) result: Result<CompletionValue, i32>,
}
