//! The Scoped-Open Facade: the crate's single public entry point.
//!
//! [`open`] parses the mode, opens the handle, and wraps it in whichever of
//! [`BinaryFile`]/[`TextFile`] the mode calls for. [`with_open`] is the
//! closure-combinator answer to spec §9's "guarantee close on every exit
//! path including cancellation" — Rust has no async `Drop`, so a scope
//! guaranteeing an *awaited* close has to be a function that owns the body
//! closure, not a destructor. True mid-cancellation release still falls
//! back to [`crate::handle::FileHandle`]'s synchronous `Drop`.

use crate::buffered::BinaryFile;
use crate::error::Error;
use crate::lines::{BinaryLines, TextLines};
use crate::mode::{self, FileMode};
use crate::text::TextFile;

use std::future::Future;
use std::io::SeekFrom;
use std::path::Path;

/// Default buffer size (spec §6): 64 KiB.
pub const DEFAULT_BUFFER_SIZE: usize = 65536;

/// The value produced by [`File::read`]: bytes for a binary-mode file,
/// a `String` for a text-mode file.
#[derive(Debug)]
pub enum ReadData {
    Bytes(Vec<u8>),
    Text(String),
}

impl ReadData {
    pub fn is_empty(&self) -> bool {
        match self {
            ReadData::Bytes(b) => b.is_empty(),
            ReadData::Text(s) => s.is_empty(),
        }
    }
}

/// One line yielded by [`File::lines`]: includes its trailing `\n` except
/// possibly the file's last line.
#[derive(Debug)]
pub enum Line {
    Bytes(Vec<u8>),
    Text(String),
}

enum FileInner {
    Binary(BinaryFile),
    Text(TextFile),
}

/// An open file: either binary or text, depending on the mode it was
/// opened with. Obtained from [`open`] or [`with_open`].
pub struct File {
    inner: FileInner,
}

impl File {
    async fn from_path(path: &Path, mode: FileMode, buffer_size: usize) -> Result<Self, Error> {
        let handle = crate::handle::FileHandle::open(path, mode).await?;
        let binary = BinaryFile::new(handle, buffer_size).await?;

        let inner = if mode.is_text() {
            FileInner::Text(TextFile::new(binary))
        } else {
            FileInner::Binary(binary)
        };

        Ok(Self { inner })
    }

    pub fn mode(&self) -> FileMode {
        match &self.inner {
            FileInner::Binary(b) => b.mode(),
            FileInner::Text(t) => t.mode(),
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self.inner, FileInner::Text(_))
    }

    /// Up to `n` bytes/characters, or everything remaining when `n < 0`.
    pub async fn read(&mut self, n: i64) -> Result<ReadData, Error> {
        match &mut self.inner {
            FileInner::Binary(b) => Ok(ReadData::Bytes(b.read(n).await?)),
            FileInner::Text(t) => Ok(ReadData::Text(t.read(n).await?)),
        }
    }

    /// Writes raw bytes. Valid only on a binary-mode file.
    pub async fn write_bytes(&mut self, data: &[u8]) -> Result<usize, Error> {
        match &mut self.inner {
            FileInner::Binary(b) => b.write(data).await,
            FileInner::Text(_) => Err(wrong_kind("write_bytes on a text-mode file")),
        }
    }

    /// Encodes and writes a string. Valid only on a text-mode file.
    pub async fn write_str(&mut self, s: &str) -> Result<usize, Error> {
        match &mut self.inner {
            FileInner::Text(t) => t.write(s).await,
            FileInner::Binary(_) => Err(wrong_kind("write_str on a binary-mode file")),
        }
    }

    pub async fn seek(&mut self, pos: SeekFrom) -> Result<u64, Error> {
        match &mut self.inner {
            FileInner::Binary(b) => b.seek(pos).await,
            FileInner::Text(t) => t.seek(pos).await,
        }
    }

    pub fn tell(&self) -> u64 {
        match &self.inner {
            FileInner::Binary(b) => b.tell(),
            FileInner::Text(t) => t.tell(),
        }
    }

    pub async fn truncate(&mut self, length: Option<u64>) -> Result<(), Error> {
        match &mut self.inner {
            FileInner::Binary(b) => b.truncate(length).await,
            FileInner::Text(t) => t.truncate(length).await,
        }
    }

    pub async fn flush(&mut self) -> Result<(), Error> {
        match &mut self.inner {
            FileInner::Binary(b) => b.flush().await,
            FileInner::Text(t) => t.flush().await,
        }
    }

    /// Flushes buffered writes and forces them to the storage device
    /// (spec §2/§5: `fsync` is a File Handle primitive and suspension
    /// point distinct from `flush`, which only empties this crate's own
    /// write buffer into the kernel's page cache).
    pub async fn fsync(&mut self) -> Result<(), Error> {
        match &mut self.inner {
            FileInner::Binary(b) => b.fsync().await,
            FileInner::Text(t) => t.fsync().await,
        }
    }

    pub async fn close(&mut self) -> Result<(), Error> {
        match &mut self.inner {
            FileInner::Binary(b) => b.close().await,
            FileInner::Text(t) => t.close().await,
        }
    }

    /// A lazy sequence of newline-terminated records, in this file's own
    /// mode (bytes for binary, `String` for text).
    pub fn lines(&mut self) -> LineIterator<'_> {
        match &mut self.inner {
            FileInner::Binary(b) => LineIterator::Binary(BinaryLines::new(b)),
            FileInner::Text(t) => LineIterator::Text(TextLines::new(t)),
        }
    }
}

fn wrong_kind(what: &str) -> Error {
    tracing::warn!(what, "file kind mismatch");
    Error::Io {
        errno: libc::EINVAL,
        source: std::io::Error::from_raw_os_error(libc::EINVAL),
    }
}

/// Either a [`BinaryLines`] or [`TextLines`] iterator, matching the file it
/// was created from.
pub enum LineIterator<'a> {
    Binary(BinaryLines<'a>),
    Text(TextLines<'a>),
}

impl<'a> LineIterator<'a> {
    pub async fn next(&mut self) -> Result<Option<Line>, Error> {
        match self {
            LineIterator::Binary(it) => Ok(it.next().await?.map(Line::Bytes)),
            LineIterator::Text(it) => Ok(it.next().await?.map(Line::Text)),
        }
    }
}

/// Opens `path` under `mode` with the default 64 KiB buffer. See
/// [`crate::mode::parse`] for the mode grammar.
pub async fn open(path: impl AsRef<Path>, mode: &str) -> Result<File, Error> {
    open_with_capacity(path, mode, DEFAULT_BUFFER_SIZE).await
}

/// As [`open`], with an explicit read-ahead/write-coalescing buffer size.
pub async fn open_with_capacity(
    path: impl AsRef<Path>,
    mode: &str,
    buffer_size: usize,
) -> Result<File, Error> {
    let parsed = mode::parse(mode)?;
    File::from_path(path.as_ref(), parsed, buffer_size.max(1)).await
}

/// Opens `path`, runs `body` with the file, and guarantees a close on every
/// exit path (spec §4.7): close errors are surfaced when `body` succeeded
/// and suppressed when `body` failed, so the original error isn't masked.
pub async fn with_open<T, F, Fut>(path: impl AsRef<Path>, mode: &str, body: F) -> Result<T, Error>
where
    F: FnOnce(&mut File) -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    let mut file = open(path, mode).await?;
    let outcome = body(&mut file).await;

    match outcome {
        Ok(value) => {
            file.close().await?;
            Ok(value)
        }
        Err(err) => {
            let _ = file.close().await;
            Err(err)
        }
    }
}
